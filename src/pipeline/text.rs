//! Text extraction: pull the text layer out of every page via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! server keeps answering while a large PDF is read.

use crate::error::SuratError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extract the text of a PDF: page texts joined by `\n`, trimmed.
///
/// `pdfium_dir` is the directory holding the pdfium shared library; when
/// `None`, `PDFIUM_LIB_PATH` and then the system library are tried.
pub async fn extract_text(
    pdf_path: &Path,
    pdfium_dir: Option<&Path>,
) -> Result<String, SuratError> {
    let path = pdf_path.to_path_buf();
    let dir = pdfium_dir.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || extract_text_blocking(&path, dir.as_deref()))
        .await
        .map_err(|e| SuratError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Join per-page texts in page order with newlines, then trim the result.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        text.push_str(page.as_ref());
        text.push('\n');
    }
    text.trim().to_string()
}

/// Bind to pdfium, preferring an explicit directory over the environment.
pub fn bind_pdfium(pdfium_dir: Option<&Path>) -> Result<Pdfium, SuratError> {
    let dir: Option<PathBuf> = pdfium_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match dir {
        Some(dir) => {
            let lib = if dir.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&dir)
            } else {
                dir
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| SuratError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(pdf_path: &Path, pdfium_dir: Option<&Path>) -> Result<String, SuratError> {
    if !pdf_path.exists() {
        return Err(SuratError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }

    let pdfium = bind_pdfium(pdfium_dir)?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| SuratError::PdfUnreadable {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| SuratError::PdfUnreadable {
            path: pdf_path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        let content = text.all();
        debug!("Page {} → {} chars", idx + 1, content.len());
        texts.push(content);
    }

    Ok(join_pages(texts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_pages_keeps_page_order() {
        let text = join_pages(["Halaman satu", "Halaman dua", "Halaman tiga"]);
        assert_eq!(text, "Halaman satu\nHalaman dua\nHalaman tiga");
    }

    #[test]
    fn join_pages_trims_outer_whitespace_only() {
        let text = join_pages(["\n  Nama: Budi  ", "", "NIM: 12345\n\n"]);
        assert_eq!(text, "Nama: Budi  \n\nNIM: 12345");
    }

    #[test]
    fn join_pages_of_nothing_is_empty() {
        assert_eq!(join_pages(Vec::<String>::new()), "");
    }

    #[tokio::test]
    async fn missing_file_is_reported_before_binding() {
        let err = extract_text(Path::new("/definitely/not/here.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SuratError::FileNotFound { .. }), "got: {err}");
    }
}
