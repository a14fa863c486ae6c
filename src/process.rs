//! The submission pipeline: one uploaded PDF in, one generated letter out.
//!
//! ```text
//! save ──▶ extract text ──▶ extract fields ──▶ render ──▶ convert
//!            │ (empty / unreadable: stop)                    │ (fail: stop)
//! ```
//!
//! Stages run strictly in order. The first fatal error ends the submission;
//! field extraction is the only stage that degrades instead of failing.

use crate::config::{LetterKind, PipelineConfig};
use crate::error::SuratError;
use crate::fields::ExtractedFields;
use crate::pipeline::convert::FormatConverter;
use crate::pipeline::letter::LetterRequest;
use crate::pipeline::llm::{extract_fields, TextGenerator};
use crate::pipeline::render::{render_letter, GeneratedDocument};
use crate::pipeline::{text, upload};
use crate::progress::{ProgressCallback, Stage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Everything one successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub kind: LetterKind,
    /// Saved copy of the uploaded PDF.
    pub upload_path: PathBuf,
    /// Character count of the extracted document text.
    pub text_chars: usize,
    pub fields: ExtractedFields,
    pub letter: LetterRequest,
    pub document: GeneratedDocument,
    /// The converted PDF, read while the submission still held the pipeline.
    /// A later submission for the same name replaces the file on disk.
    #[serde(skip)]
    pub pdf_bytes: Vec<u8>,
}

/// Owns the model handle, the converter and the configuration.
///
/// Construct once at startup and share behind an `Arc`. Submissions are
/// processed one at a time.
pub struct Pipeline<G, C> {
    config: PipelineConfig,
    generator: G,
    converter: C,
    progress: Option<ProgressCallback>,
    busy: Mutex<()>,
}

impl<G: TextGenerator, C: FormatConverter> Pipeline<G, C> {
    pub fn new(config: PipelineConfig, generator: G, converter: C) -> Self {
        Self {
            config,
            generator,
            converter,
            progress: None,
            busy: Mutex::new(()),
        }
    }

    /// Report stage events to `progress`.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run an uploaded file through every stage.
    pub async fn process(
        &self,
        kind: LetterKind,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<Submission, SuratError> {
        let _guard = self.busy.lock().await;
        let start = Instant::now();
        info!("Processing '{}' as {}", file_name, kind);

        self.begin(Stage::SaveUpload);
        let saved = match upload::validate_upload(file_name, content_type, bytes) {
            Ok(()) => upload::save_upload(&self.config.output_root, kind, file_name, bytes).await,
            Err(e) => Err(e),
        };
        let upload_path = self.end(Stage::SaveUpload, saved)?;

        let submission = self.run_stages(kind, upload_path).await?;
        info!(
            "Submission complete in {}ms: {}",
            start.elapsed().as_millis(),
            submission.document.pdf_path.display()
        );
        Ok(submission)
    }

    /// Run a PDF already on disk, as if it had been uploaded.
    pub async fn process_path(
        &self,
        kind: LetterKind,
        path: &Path,
    ) -> Result<Submission, SuratError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SuratError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SuratError::PdfUnreadable {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                }
            }
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        self.process(kind, &file_name, None, &bytes).await
    }

    /// Run a document whose text is already known, starting at field
    /// extraction. `source` is recorded as the submission's upload path.
    pub async fn process_text(
        &self,
        kind: LetterKind,
        source: &Path,
        text: &str,
    ) -> Result<Submission, SuratError> {
        let _guard = self.busy.lock().await;
        self.begin(Stage::ExtractText);
        self.run_from_text(kind, source.to_path_buf(), Ok(text.trim().to_string()))
            .await
    }

    async fn run_stages(
        &self,
        kind: LetterKind,
        upload_path: PathBuf,
    ) -> Result<Submission, SuratError> {
        self.begin(Stage::ExtractText);
        let pdfium_dir = self.config.pdfium_lib_path.as_deref();
        let extracted = text::extract_text(&upload_path, pdfium_dir).await;
        self.run_from_text(kind, upload_path, extracted).await
    }

    async fn run_from_text(
        &self,
        kind: LetterKind,
        upload_path: PathBuf,
        extracted: Result<String, SuratError>,
    ) -> Result<Submission, SuratError> {
        // ── Text ────────────────────────────────────────────────────────
        let extracted = match extracted {
            Ok(t) if t.is_empty() => Err(SuratError::NoTextFound {
                path: upload_path.clone(),
            }),
            other => other,
        };
        let document_text = self.end(Stage::ExtractText, extracted)?;
        let text_chars = document_text.chars().count();
        debug!("Extracted {} characters", text_chars);

        // ── Fields (never fatal) ────────────────────────────────────────
        self.begin(Stage::ExtractFields);
        let fields = extract_fields(&self.generator, &document_text, kind, &self.config).await;
        self.end(Stage::ExtractFields, Ok(()))?;

        // ── Letter ──────────────────────────────────────────────────────
        self.begin(Stage::RenderLetter);
        let letter = LetterRequest::from_fields(kind, &fields, &self.config);
        let rendered = render_letter(&letter, &self.config).await;
        let mut document = self.end(Stage::RenderLetter, rendered)?;

        // ── PDF ─────────────────────────────────────────────────────────
        self.begin(Stage::ConvertPdf);
        let converted = match self.converter.convert(&document.docx_path).await {
            Ok(pdf_path) => read_pdf(&document.docx_path, pdf_path).await,
            Err(e) => Err(e),
        };
        let (pdf_path, pdf_bytes) = self.end(Stage::ConvertPdf, converted)?;
        document.pdf_path = pdf_path;

        Ok(Submission {
            kind,
            upload_path,
            text_chars,
            fields,
            letter,
            document,
            pdf_bytes,
        })
    }

    fn begin(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        if let Some(ref cb) = self.progress {
            cb.on_stage_start(stage);
        }
    }

    fn end<T>(&self, stage: Stage, result: Result<T, SuratError>) -> Result<T, SuratError> {
        if let Some(ref cb) = self.progress {
            match &result {
                Ok(_) => cb.on_stage_complete(stage),
                Err(e) => cb.on_stage_error(stage, &e.to_string()),
            }
        }
        result
    }
}

async fn read_pdf(docx: &Path, pdf_path: PathBuf) -> Result<(PathBuf, Vec<u8>), SuratError> {
    match tokio::fs::read(&pdf_path).await {
        Ok(bytes) => Ok((pdf_path, bytes)),
        Err(e) => Err(SuratError::ConversionFailed {
            path: docx.to_path_buf(),
            detail: format!("cannot read {}: {e}", pdf_path.display()),
        }),
    }
}
