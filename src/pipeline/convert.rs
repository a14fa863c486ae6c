//! Format conversion: DOCX letter → PDF.
//!
//! The converter is a trait so the pipeline can be driven in tests without an
//! office suite installed. The production implementation shells out to
//! LibreOffice in headless mode.

use crate::error::SuratError;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Converts a DOCX file into a PDF next to it.
pub trait FormatConverter: Send + Sync {
    /// Convert `docx` and return the path of the produced PDF, which is
    /// [`pdf_sibling`]`(docx)`. An existing PDF at that path is replaced.
    fn convert(&self, docx: &Path) -> impl Future<Output = Result<PathBuf, SuratError>> + Send;
}

/// `letter.docx` → `letter.pdf` in the same folder.
pub fn pdf_sibling(docx: &Path) -> PathBuf {
    docx.with_extension("pdf")
}

/// Runs `soffice --headless --convert-to pdf --outdir <dir> <docx>`.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    program: String,
}

impl LibreOfficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that the converter binary can be found.
    pub async fn ensure_available(&self) -> Result<(), SuratError> {
        let unavailable = || SuratError::ConverterUnavailable {
            program: self.program.clone(),
        };

        // An explicit path only needs to exist; a bare name goes through PATH.
        if Path::new(&self.program).components().count() > 1 {
            return if Path::new(&self.program).is_file() {
                Ok(())
            } else {
                Err(unavailable())
            };
        }

        let which = Command::new("which")
            .arg(&self.program)
            .output()
            .await
            .map_err(|_| unavailable())?;
        if which.status.success() {
            Ok(())
        } else {
            Err(unavailable())
        }
    }
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl FormatConverter for LibreOfficeConverter {
    async fn convert(&self, docx: &Path) -> Result<PathBuf, SuratError> {
        self.ensure_available().await?;

        let outdir = match docx.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let target = pdf_sibling(docx);

        info!("Converting {} to PDF", docx.display());
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&outdir)
            .arg(docx)
            .output()
            .await
            .map_err(|e| SuratError::ConversionFailed {
                path: docx.to_path_buf(),
                detail: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SuratError::ConversionFailed {
                path: docx.to_path_buf(),
                detail: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }
        debug!("{} stdout: {}", self.program, String::from_utf8_lossy(&output.stdout).trim());

        // soffice exits 0 on some failures (e.g. a locked profile), so check the file.
        if !target.is_file() {
            return Err(SuratError::ConversionFailed {
                path: docx.to_path_buf(),
                detail: format!("no PDF produced at {}", target.display()),
            });
        }
        Ok(target)
    }
}
