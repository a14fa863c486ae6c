//! Error types for the surat-pengajuan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SuratError`] — **Fatal**: the submission cannot proceed (unsupported
//!   upload, unreadable PDF, conversion tool failure). Returned as
//!   `Err(SuratError)` from [`crate::Pipeline::process`] and shown to the user.
//!
//! * [`GenerationError`] — **Non-fatal**: the language model failed or
//!   produced nothing usable. The field extractor swallows it and returns an
//!   empty field set so the letter is still rendered, with blank values.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the surat-pengajuan library.
#[derive(Debug, Error)]
pub enum SuratError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload is not a PDF (wrong extension/content type or bad magic bytes).
    #[error("Format file tidak didukung: '{file_name}' ({reason})")]
    UnsupportedUpload { file_name: String, reason: String },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open or parse the document.
    #[error("Error reading PDF '{path}': {detail}")]
    PdfUnreadable { path: PathBuf, detail: String },

    /// The PDF opened fine but contains no extractable text.
    #[error("Tidak dapat membaca teks dari PDF '{path}'")]
    NoTextFound { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or install it system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create a folder or write an upload / letter file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The document conversion tool is not installed or not on PATH.
    #[error("Document converter '{program}' is not available.\nInstall LibreOffice or pass --soffice <path>.")]
    ConverterUnavailable { program: String },

    /// The converter ran but did not produce a PDF.
    #[error("Failed to convert '{path}' to PDF: {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SuratError {
    /// Whether the error was caused by the submitted input rather than by
    /// the server environment. The web layer maps this to a 4xx status.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SuratError::UnsupportedUpload { .. }
                | SuratError::FileNotFound { .. }
                | SuratError::PdfUnreadable { .. }
                | SuratError::NoTextFound { .. }
        )
    }
}

/// A non-fatal failure of the text-generation step.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The provider call itself failed.
    #[error("model call failed: {0}")]
    Provider(String),

    /// The model answered, but with nothing.
    #[error("model returned an empty completion")]
    EmptyOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_upload_display() {
        let e = SuratError::UnsupportedUpload {
            file_name: "foto.png".into(),
            reason: "not a PDF".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("foto.png"), "got: {msg}");
        assert!(msg.contains("tidak didukung"));
    }

    #[test]
    fn conversion_failed_display() {
        let e = SuratError::ConversionFailed {
            path: PathBuf::from("surat_tugas/surat_tugas_budi.docx"),
            detail: "exit status 1".into(),
        };
        assert!(e.to_string().contains("surat_tugas_budi.docx"));
        assert!(e.to_string().contains("exit status 1"));
    }

    #[test]
    fn user_errors_are_classified() {
        assert!(SuratError::NoTextFound {
            path: PathBuf::from("a.pdf")
        }
        .is_user_error());
        assert!(!SuratError::ConverterUnavailable {
            program: "soffice".into()
        }
        .is_user_error());
        assert!(!SuratError::Internal("boom".into()).is_user_error());
    }

    #[test]
    fn generation_error_display() {
        let e = GenerationError::Provider("HTTP 500".into());
        assert!(e.to_string().contains("HTTP 500"));
        assert_eq!(
            GenerationError::EmptyOutput.to_string(),
            "model returned an empty completion"
        );
    }
}
