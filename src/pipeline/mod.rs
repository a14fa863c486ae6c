//! Pipeline stages for turning a request PDF into a letter.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the orchestration in [`crate::process`] stays a straight line.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ text ──▶ llm ──▶ letter ──▶ render ──▶ convert
//! (save)   (pdfium)  (model)  (mapping)  (DOCX)     (PDF)
//! ```
//!
//! 1. [`upload`]  — validate the upload and keep a timestamped copy
//! 2. [`text`]    — page texts via pdfium; runs in `spawn_blocking`
//! 3. [`llm`]     — prompt the model and parse `Label: value` lines; the only
//!    stage with network I/O, and the only one that degrades instead of failing
//! 4. [`letter`]  — map extracted fields onto a template's parameters
//! 5. [`render`]  — lay the letter out and write it with [`docx`]
//! 6. [`convert`] — DOCX → PDF through an external office suite

pub mod convert;
pub mod docx;
pub mod letter;
pub mod llm;
pub mod render;
pub mod text;
pub mod upload;
