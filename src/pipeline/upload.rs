//! Upload intake: accept a submitted PDF and keep a timestamped copy.
//!
//! Text extraction needs a file-system path, and the saved copy doubles as
//! the record of what was submitted. Uploads are checked for the `%PDF` magic
//! bytes up front so a stray image gets a clear message instead of a pdfium
//! error.

use crate::config::LetterKind;
use crate::error::SuratError;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Accept only PDFs: a `.pdf` name or `application/pdf` content type, and
/// the `%PDF` magic at the start of the bytes.
pub fn validate_upload(
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<(), SuratError> {
    let reject = |reason: &str| SuratError::UnsupportedUpload {
        file_name: file_name.to_string(),
        reason: reason.to_string(),
    };

    let named_pdf = file_name.to_ascii_lowercase().ends_with(".pdf");
    let typed_pdf = content_type
        .map(|ct| ct.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    if !named_pdf && !typed_pdf {
        return Err(reject("hanya file PDF yang diterima"));
    }
    if bytes.is_empty() {
        return Err(reject("file kosong"));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(reject("isi file bukan PDF"));
    }
    Ok(())
}

/// `root/<upload folder>/<stem>_<YYYYmmdd_HHMMSS><ext>`.
///
/// Only the final component of `original_name` is used, so a browser that
/// sends a full client path cannot steer the write elsewhere.
pub fn upload_path(
    root: &Path,
    kind: LetterKind,
    original_name: &str,
    timestamp: NaiveDateTime,
) -> PathBuf {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("upload.pdf");

    let as_path = Path::new(base);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.to_string());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    root.join(kind.upload_folder())
        .join(format!("{stem}_{stamp}{ext}"))
}

/// Write an upload under its kind's folder, creating the folder if needed.
pub async fn save_upload(
    root: &Path,
    kind: LetterKind,
    original_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, SuratError> {
    let path = upload_path(root, kind, original_name, Local::now().naive_local());
    let write_err = |source: std::io::Error| SuratError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(&path, bytes).await.map_err(write_err)?;

    info!("Upload saved: {}", path.display());
    debug!("{} bytes", bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 2)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn accepts_pdf_by_name_or_type() {
        assert!(validate_upload("a.PDF", None, b"%PDF-1.7").is_ok());
        assert!(validate_upload("scan", Some("application/pdf"), b"%PDF-1.4").is_ok());
    }

    #[test]
    fn rejects_non_pdf_name_and_type() {
        let err = validate_upload("foto.png", Some("image/png"), b"%PDF").unwrap_err();
        assert!(matches!(err, SuratError::UnsupportedUpload { .. }));
    }

    #[test]
    fn rejects_wrong_magic_and_empty() {
        assert!(validate_upload("a.pdf", None, b"\x89PNG").is_err());
        assert!(validate_upload("a.pdf", None, b"").is_err());
    }

    #[test]
    fn upload_path_is_timestamped_per_kind() {
        let root = Path::new("/data");
        assert_eq!(
            upload_path(root, LetterKind::Assignment, "permohonan.pdf", stamp()),
            PathBuf::from("/data/STD/permohonan_20241102_090507.pdf")
        );
        assert_eq!(
            upload_path(root, LetterKind::Exemption, "izin lomba.pdf", stamp()),
            PathBuf::from("/data/Dispen/izin lomba_20241102_090507.pdf")
        );
    }

    #[test]
    fn upload_path_strips_client_directories() {
        let root = Path::new("/data");
        assert_eq!(
            upload_path(root, LetterKind::Exemption, "../../etc/x.pdf", stamp()),
            PathBuf::from("/data/Dispen/x_20241102_090507.pdf")
        );
        assert_eq!(
            upload_path(root, LetterKind::Exemption, r"C:\Users\budi\surat.pdf", stamp()),
            PathBuf::from("/data/Dispen/surat_20241102_090507.pdf")
        );
        assert_eq!(
            upload_path(root, LetterKind::Exemption, "..", stamp()),
            PathBuf::from("/data/Dispen/upload_20241102_090507.pdf")
        );
    }

    #[tokio::test]
    async fn save_creates_folder_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(dir.path(), LetterKind::Exemption, "a.pdf", b"%PDF-1.4")
            .await
            .unwrap();
        assert!(path.starts_with(dir.path().join("Dispen")));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
