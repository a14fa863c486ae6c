//! Extraction prompts and the field schema they ask for.
//!
//! The same [`FieldSpec`] table drives both directions: the prompt lists one
//! `Label: [placeholder]` line per field, and the letter mapping looks the
//! model's answers up by that label (or one of its aliases). Editing a label
//! here changes both sides at once.

use crate::config::LetterKind;

/// A value a letter template needs from the request document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StudentName,
    StudentNim,
    Department,
    Competition,
    CompetitionDate,
    Location,
    SupervisorName,
    SupervisorNip,
    Reason,
    StartDate,
    EndDate,
}

/// How one field is requested from the model and recognised in its answer.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Label the model is asked to emit.
    pub label: &'static str,
    /// Extra instruction printed in parentheses after the label.
    pub hint: Option<&'static str>,
    pub placeholder: &'static str,
    /// Other labels accepted for this field when reading the answer.
    pub aliases: &'static [&'static str],
}

impl FieldSpec {
    const fn new(field: Field, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            field,
            label,
            hint: None,
            placeholder,
            aliases: &[],
        }
    }

    const fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// The `Label (hint): [placeholder]` line used in the output template.
    pub fn template_line(&self) -> String {
        match self.hint {
            Some(hint) => format!("{} ({}): [{}]", self.label, hint, self.placeholder),
            None => format!("{}: [{}]", self.label, self.placeholder),
        }
    }
}

const STUDENT_NAME: FieldSpec = FieldSpec::new(Field::StudentName, "Nama Lengkap", "nama")
    .aliases(&["Nama", "Nama Mahasiswa"]);
const DEPARTMENT: FieldSpec = FieldSpec::new(Field::Department, "Jurusan", "jurusan")
    .aliases(&["Fakultas", "Program Studi"]);

/// Fields of the "Surat Tugas Dosen" request, in prompt order.
pub const ASSIGNMENT_FIELDS: &[FieldSpec] = &[
    STUDENT_NAME,
    FieldSpec::new(Field::StudentNim, "NIM", "nim"),
    FieldSpec::new(Field::Competition, "Perlombaan", "perlombaan")
        .aliases(&["Nama Perlombaan", "Lomba"]),
    FieldSpec::new(Field::CompetitionDate, "Tanggal", "tanggal")
        .aliases(&["Tanggal Pelaksanaan", "Tanggal Lomba"]),
    FieldSpec::new(Field::Location, "Lokasi", "lokasi").aliases(&["Tempat"]),
    FieldSpec::new(Field::SupervisorName, "Dosen Pembimbing", "dosen pembimbing")
        .hint("nama lengkap dengan gelarnya")
        .aliases(&["Nama Dosen Pembimbing", "Dospem"]),
    FieldSpec::new(Field::SupervisorNip, "NIP Dospem", "nip")
        .aliases(&["NIP Dosen Pembimbing"]),
    DEPARTMENT,
];

/// Fields of the "Pengajuan Dispensasi" request, in prompt order.
pub const EXEMPTION_FIELDS: &[FieldSpec] = &[
    STUDENT_NAME,
    FieldSpec::new(Field::StudentNim, "NIM", "nim").hint("yang bernilai angka"),
    DEPARTMENT,
    FieldSpec::new(Field::Reason, "Alasan Dispensasi", "alasan")
        .aliases(&["Nama Kegiatan", "Alasan"]),
    FieldSpec::new(Field::StartDate, "Tanggal Mulai", "tanggal mulai"),
    FieldSpec::new(Field::EndDate, "Tanggal Selesai", "tanggal selesai"),
];

/// The field schema for a letter kind.
pub fn fields_for(kind: LetterKind) -> &'static [FieldSpec] {
    match kind {
        LetterKind::Assignment => ASSIGNMENT_FIELDS,
        LetterKind::Exemption => EXEMPTION_FIELDS,
    }
}

/// Look up the definition of `field` within a kind's schema.
pub fn spec_for(kind: LetterKind, field: Field) -> Option<&'static FieldSpec> {
    fields_for(kind).iter().find(|s| s.field == field)
}

fn document_noun(kind: LetterKind) -> &'static str {
    match kind {
        LetterKind::Assignment => "dokumen pengajuan",
        LetterKind::Exemption => "dokumen dispensasi",
    }
}

/// Build the instruction sent to the model for one request document.
///
/// `document_text` is embedded verbatim; truncation to the token budget is
/// the caller's job.
pub fn extraction_prompt(kind: LetterKind, document_text: &str) -> String {
    let template = fields_for(kind)
        .iter()
        .map(FieldSpec::template_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Anda adalah asisten AI yang bertugas untuk mengekstrak informasi penting dari {noun}.\n\
         Berikut adalah teks dokumen: {document_text}\n\
         Format hasil ekstraksi:\n\
         {template}\n",
        noun = document_noun(kind),
    )
}
