//! Template rendering: lay a [`LetterRequest`] out as a DOCX letter on disk.
//!
//! Path resolution ([`output_path`]) is pure and separate from the write
//! ([`render_letter`]), so callers and tests can know where a letter will land
//! without touching the filesystem.

use super::docx::{Alignment, Document, Paragraph, Run};
use super::letter::{AssignmentLetter, ExemptionLetter, LetterRequest};
use crate::config::{LetterKind, PipelineConfig, Signatory};
use crate::error::SuratError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files produced for one letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    pub docx_path: PathBuf,
    /// Sibling of `docx_path` with a `pdf` extension. Only exists once the
    /// converter has run.
    pub pdf_path: PathBuf,
}

impl GeneratedDocument {
    pub fn for_docx(docx_path: PathBuf) -> Self {
        let pdf_path = docx_path.with_extension("pdf");
        Self {
            docx_path,
            pdf_path,
        }
    }
}

/// File-name form of a person's name: lower-cased, spaces to underscores.
///
/// The name comes from model output, so path separators, characters Windows
/// reserves and control characters also become `_`. The result is always a
/// single path component and never starts with a dot.
pub fn slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    slug.trim_start_matches('.').to_string()
}

/// Where the letter of `kind` for `subject_name` is written.
///
/// `root/surat_tugas/surat_tugas_<slug>.docx` or
/// `root/surat_dispen/surat_dispensasi_<slug>.docx`.
pub fn output_path(root: &Path, kind: LetterKind, subject_name: &str) -> PathBuf {
    root.join(kind.letter_folder()).join(format!(
        "{}_{}.docx",
        kind.letter_prefix(),
        slug(subject_name)
    ))
}

/// Lay out the letter body.
pub fn build_letter(request: &LetterRequest, signatory: &Signatory) -> Document {
    match request {
        LetterRequest::Assignment(l) => assignment_letter(l, signatory),
        LetterRequest::Exemption(l) => exemption_letter(l, signatory),
    }
}

fn assignment_letter(l: &AssignmentLetter, signatory: &Signatory) -> Document {
    let mut doc = Document::new();
    letter_head(&mut doc, "SURAT TUGAS", &l.reference_number);
    doc.push(Paragraph::with_run(Run::bold(format!(
        "Bersama ini {} {} menugaskan kepada personalia:",
        signatory.title, signatory.faculty
    ))))
    .push(Paragraph::text(format!("Nama: {}", l.supervisor_name)))
    .push(Paragraph::text(format!("NIP/NIK/NIDN: {}", l.supervisor_nip)))
    .push(Paragraph::text(format!(
        "Untuk menjadi dosen pembimbing {} yang diselenggarakan tanggal {}.",
        l.competition, l.competition_date
    )))
    .push(Paragraph::text("Mahasiswa yang dibimbing adalah sebagai berikut:"))
    .push(Paragraph::text(format!(
        "1. {} ({}) - {}",
        l.student_name, l.student_nim, l.department
    )))
    .push(Paragraph::with_run(Run::italic(
        "Demikian Surat Tugas ini dibuat untuk dilaksanakan dengan sebaik-baiknya \
         dan penuh rasa tanggung jawab.",
    )));
    signature_block(&mut doc, &l.letter_date, &signatory.title, &l.dean_name, &l.dean_nip);
    doc
}

fn exemption_letter(l: &ExemptionLetter, signatory: &Signatory) -> Document {
    let mut doc = Document::new();
    letter_head(&mut doc, "SURAT DISPENSASI", &l.reference_number);
    doc.push(Paragraph::with_run(Run::bold(format!(
        "Yang bertanda tangan di bawah ini, {} {}, memberikan dispensasi kepada mahasiswa:",
        signatory.title, signatory.faculty
    ))))
    .push(Paragraph::text(format!("Nama: {}", l.student_name)))
    .push(Paragraph::text(format!("NIM: {}", l.student_nim)))
    .push(Paragraph::text(format!("Jurusan: {}", l.department)))
    .push(Paragraph::text(format!(
        "Untuk mendapatkan dispensasi {} yang berlaku mulai tanggal {} sampai dengan {}.",
        l.reason, l.start_date, l.end_date
    )))
    .push(Paragraph::text(
        "Demikian surat dispensasi ini dibuat untuk dipergunakan sebagaimana mestinya.",
    ));
    signature_block(&mut doc, &l.letter_date, &signatory.title, &l.dean_name, &l.dean_nip);
    doc
}

fn letter_head(doc: &mut Document, title: &str, reference: &str) {
    doc.push(Paragraph::heading(title, 1).aligned(Alignment::Center))
        .push(Paragraph::text(format!("Nomor: {reference}")).aligned(Alignment::Center))
        .push(Paragraph::default());
}

fn signature_block(doc: &mut Document, date: &str, title: &str, name: &str, nip: &str) {
    doc.push(Paragraph::default()).push(
        Paragraph::text(format!("{date}\n{title},\n\n\n{name}\nNIP {nip}"))
            .aligned(Alignment::Right),
    );
}

/// Write `document` to `path`, creating parent folders and replacing any
/// existing file.
pub async fn write_docx(document: &Document, path: &Path) -> Result<(), SuratError> {
    let write_err = |source: std::io::Error| SuratError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let bytes = document.to_bytes().map_err(write_err)?;

    // Write to a temp file and rename so a viewer never sees half a letter.
    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_err)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Render `request` under `config.output_root` and return where it went.
///
/// Blank values render as blanks. Regenerating for the same subject
/// overwrites the previous letter.
pub async fn render_letter(
    request: &LetterRequest,
    config: &PipelineConfig,
) -> Result<GeneratedDocument, SuratError> {
    let path = output_path(&config.output_root, request.kind(), request.subject_name());
    let document = build_letter(request, &config.signatory);
    write_docx(&document, &path).await?;
    info!("Letter written: {}", path.display());
    Ok(GeneratedDocument::for_docx(path))
}
