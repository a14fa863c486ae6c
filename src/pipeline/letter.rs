//! Letter requests: the named values each template needs.
//!
//! Values are free-form strings and are never validated. A field the model
//! did not extract is an empty string and renders as a blank.

use crate::config::{LetterKind, PipelineConfig};
use crate::fields::ExtractedFields;
use crate::prompts::{spec_for, Field};
use chrono::{Datelike, Local, NaiveDate};
use rand::Rng;
use serde::Serialize;

/// Parameters of the "Surat Tugas" template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentLetter {
    pub reference_number: String,
    pub supervisor_name: String,
    pub supervisor_nip: String,
    pub student_name: String,
    pub student_nim: String,
    pub department: String,
    pub competition: String,
    pub competition_date: String,
    pub letter_date: String,
    pub dean_name: String,
    pub dean_nip: String,
}

/// Parameters of the "Surat Dispensasi" template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExemptionLetter {
    pub reference_number: String,
    pub student_name: String,
    pub student_nim: String,
    pub department: String,
    pub reason: String,
    pub start_date: String,
    pub end_date: String,
    pub letter_date: String,
    pub dean_name: String,
    pub dean_nip: String,
}

/// A filled-in request for one of the two templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LetterRequest {
    Assignment(AssignmentLetter),
    Exemption(ExemptionLetter),
}

impl LetterRequest {
    pub fn kind(&self) -> LetterKind {
        match self {
            LetterRequest::Assignment(_) => LetterKind::Assignment,
            LetterRequest::Exemption(_) => LetterKind::Exemption,
        }
    }

    /// The person the letter is about; drives the output file name.
    pub fn subject_name(&self) -> &str {
        match self {
            LetterRequest::Assignment(l) => &l.student_name,
            LetterRequest::Exemption(l) => &l.student_name,
        }
    }

    pub fn reference_number(&self) -> &str {
        match self {
            LetterRequest::Assignment(l) => &l.reference_number,
            LetterRequest::Exemption(l) => &l.reference_number,
        }
    }

    /// Build a request from extracted fields, dated today, with a freshly
    /// drawn reference number for exemption letters.
    pub fn from_fields(kind: LetterKind, fields: &ExtractedFields, config: &PipelineConfig) -> Self {
        let today = Local::now().date_naive();
        Self::from_fields_on(kind, fields, config, today, &mut rand::rng())
    }

    /// Deterministic core of [`LetterRequest::from_fields`].
    pub fn from_fields_on<R: Rng + ?Sized>(
        kind: LetterKind,
        fields: &ExtractedFields,
        config: &PipelineConfig,
        today: NaiveDate,
        rng: &mut R,
    ) -> Self {
        let get = |field: Field| -> String {
            spec_for(kind, field)
                .and_then(|spec| fields.find(spec))
                .unwrap_or_default()
                .to_string()
        };
        let letter_date = format_letter_date(today);
        let signatory = &config.signatory;

        match kind {
            LetterKind::Assignment => {
                let supervisor_nip = match get(Field::SupervisorNip) {
                    nip if nip.is_empty() => config.default_supervisor_nip.clone(),
                    nip => nip,
                };
                LetterRequest::Assignment(AssignmentLetter {
                    reference_number: config.assignment_reference.clone(),
                    supervisor_name: get(Field::SupervisorName),
                    supervisor_nip,
                    student_name: get(Field::StudentName),
                    student_nim: get(Field::StudentNim),
                    department: get(Field::Department),
                    competition: get(Field::Competition),
                    competition_date: get(Field::CompetitionDate),
                    letter_date,
                    dean_name: signatory.name.clone(),
                    dean_nip: signatory.nip.clone(),
                })
            }
            LetterKind::Exemption => LetterRequest::Exemption(ExemptionLetter {
                reference_number: generate_reference_number(today.year(), rng),
                student_name: get(Field::StudentName),
                student_nim: get(Field::StudentNim),
                department: get(Field::Department),
                reason: get(Field::Reason),
                start_date: get(Field::StartDate),
                end_date: get(Field::EndDate),
                letter_date,
                dean_name: signatory.name.clone(),
                dean_nip: signatory.nip.clone(),
            }),
        }
    }
}

/// `NNNN/UN10.F1501/AK/KM/<year>` with `NNNN` drawn from `1000..=9999`.
///
/// Numbers are not tracked, so two letters can share one.
pub fn generate_reference_number<R: Rng + ?Sized>(year: i32, rng: &mut R) -> String {
    let serial: u16 = rng.random_range(1000..=9999);
    format!("{serial}/UN10.F1501/AK/KM/{year}")
}

/// Date line of the signature block, e.g. `05 March 2025`.
pub fn format_letter_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::parse_fields;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
    }

    #[test]
    fn reference_number_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let n = generate_reference_number(2025, &mut rng);
            let (serial, rest) = n.split_once('/').unwrap();
            let serial: u32 = serial.parse().unwrap();
            assert!((1000..=9999).contains(&serial), "got {n}");
            assert_eq!(rest, "UN10.F1501/AK/KM/2025");
        }
    }

    #[test]
    fn reference_numbers_vary_between_draws() {
        let mut rng = StdRng::seed_from_u64(42);
        let drawn: std::collections::HashSet<String> = (0..20)
            .map(|_| generate_reference_number(2025, &mut rng))
            .collect();
        assert!(drawn.len() > 1);
    }

    #[test]
    fn letter_date_format() {
        assert_eq!(format_letter_date(day()), "05 March 2025");
    }

    #[test]
    fn exemption_request_maps_fields() {
        let fields = parse_fields(
            "Nama Lengkap: Budi Santoso\nNIM (yang bernilai angka): 12345\n\
             Jurusan: Informatika\nAlasan Dispensasi: lomba debat\n\
             Tanggal Mulai: 1 Mei\nTanggal Selesai: 3 Mei",
        );
        let config = PipelineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let req =
            LetterRequest::from_fields_on(LetterKind::Exemption, &fields, &config, day(), &mut rng);

        let LetterRequest::Exemption(l) = &req else {
            panic!("expected exemption, got {req:?}");
        };
        assert_eq!(l.student_name, "Budi Santoso");
        assert_eq!(l.student_nim, "12345");
        assert_eq!(l.department, "Informatika");
        assert_eq!(l.reason, "lomba debat");
        assert_eq!(l.start_date, "1 Mei");
        assert_eq!(l.end_date, "3 Mei");
        assert_eq!(l.letter_date, "05 March 2025");
        assert_eq!(l.dean_name, "Wayan Firdaus Mahmudy");
        assert!(l.reference_number.ends_with("/UN10.F1501/AK/KM/2025"));
        assert_eq!(req.subject_name(), "Budi Santoso");
    }

    #[test]
    fn assignment_request_uses_defaults_for_missing_values() {
        let config = PipelineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let req = LetterRequest::from_fields_on(
            LetterKind::Assignment,
            &ExtractedFields::new(),
            &config,
            day(),
            &mut rng,
        );

        let LetterRequest::Assignment(l) = &req else {
            panic!("expected assignment, got {req:?}");
        };
        assert_eq!(l.student_name, "");
        assert_eq!(l.competition, "");
        assert_eq!(l.supervisor_nip, "0012056904");
        assert_eq!(l.reference_number, "06274/UN10.F1501/B/KM/2024");
        assert_eq!(req.kind(), LetterKind::Assignment);
    }

    #[test]
    fn assignment_request_reads_aliases() {
        let fields = parse_fields(
            "NAMA  LENGKAP: Siti\nNAMA DOSEN PEMBIMBING: Dr. Andi, M.Kom\n\
             NAMA PERLOMBAAN: Gemastik\nTANGGAL PELAKSANAAN: 10 Juni",
        );
        let config = PipelineConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let req =
            LetterRequest::from_fields_on(LetterKind::Assignment, &fields, &config, day(), &mut rng);
        let LetterRequest::Assignment(l) = req else {
            panic!("expected assignment");
        };
        assert_eq!(l.student_name, "Siti");
        assert_eq!(l.supervisor_name, "Dr. Andi, M.Kom");
        assert_eq!(l.competition, "Gemastik");
        assert_eq!(l.competition_date, "10 Juni");
    }
}
