//! # surat-pengajuan
//!
//! Turn a student's uploaded request PDF into a signed faculty letter.
//!
//! A student uploads a PDF asking either for a lecturer to be assigned to a
//! competition ("Surat Tugas Dosen") or for an exemption from classes
//! ("Pengajuan Dispensasi"). The crate reads the text out of the PDF, asks a
//! language model to pull the named fields out of it, fills one of two fixed
//! letter templates, writes the letter as DOCX, converts it to PDF and shows
//! both the extracted fields and a preview.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Save     validate, keep a timestamped copy under STD/ or Dispen/
//!  ├─ 2. Text     page texts via pdfium (spawn_blocking); empty text stops here
//!  ├─ 3. Fields   model prompt → `Label: value` lines (failures → empty set)
//!  ├─ 4. Letter   map fields onto the template, dated today
//!  ├─ 5. DOCX     written under surat_tugas/ or surat_dispen/
//!  └─ 6. PDF      converted next to the DOCX; failure stops here
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use surat_pengajuan::{
//!     LetterKind, LibreOfficeConverter, LlmGenerator, Pipeline, PipelineConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = PipelineConfig::builder().output_root("arsip").build()?;
//!     let generator = LlmGenerator::from_config(&config)?;
//!     let converter = LibreOfficeConverter::new(config.soffice_bin.clone());
//!     let pipeline = Pipeline::new(config, generator, converter);
//!
//!     let submission = pipeline
//!         .process_path(LetterKind::Exemption, "permohonan.pdf".as_ref())
//!         .await?;
//!     println!("{}", submission.document.pdf_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `surat` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## External tools
//!
//! * **pdfium**: set `PDFIUM_LIB_PATH` to the directory holding the shared
//!   library, or install it system-wide.
//! * **LibreOffice**: `soffice` must be on `PATH` (or pass its path).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fields;
pub mod pipeline;
pub mod present;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Decoding, LetterKind, PipelineConfig, PipelineConfigBuilder, Signatory};
pub use error::{GenerationError, SuratError};
pub use fields::{parse_fields, ExtractedFields};
pub use pipeline::convert::{FormatConverter, LibreOfficeConverter};
pub use pipeline::letter::{AssignmentLetter, ExemptionLetter, LetterRequest};
pub use pipeline::llm::{extract_fields, GenerationOptions, LlmGenerator, TextGenerator};
pub use pipeline::render::{output_path, render_letter, GeneratedDocument};
pub use pipeline::text::extract_text;
pub use process::{Pipeline, Submission};
pub use progress::{NoopProgress, PipelineProgress, ProgressCallback, Stage};
pub use server::{build_router, serve};
