//! Configuration types for the letter pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The decoding strategy, the output folders
//! and the signer identity live here rather than as hidden defaults inside
//! the stages, so tests can pin deterministic decoding and a temp directory.

use crate::error::SuratError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for the extract → render → convert pipeline.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use surat_pengajuan::{Decoding, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .output_root("/srv/surat")
///     .decoding(Decoding::Greedy)
///     .max_new_tokens(256)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory under which upload folders (`STD/`, `Dispen/`) and letter
    /// folders (`surat_tugas/`, `surat_dispen/`) are created. Default: `.`.
    pub output_root: PathBuf,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// How the model picks tokens. Default: sampled, temperature 0.7, top-p 0.9.
    pub decoding: Decoding,

    /// Budget for the document text embedded in the prompt, in approximate
    /// tokens (whitespace-separated words). Longer documents are cut silently.
    /// Default: 825.
    pub max_input_tokens: usize,

    /// Maximum tokens the model may generate. Default: 200.
    pub max_new_tokens: usize,

    /// Directory containing the pdfium shared library. If None, the
    /// `PDFIUM_LIB_PATH` env var is consulted, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// LibreOffice executable used for DOCX → PDF. Default: `soffice`.
    pub soffice_bin: String,

    /// Who signs the letters.
    pub signatory: Signatory,

    /// Supervisor NIP used when the model does not extract one.
    pub default_supervisor_nip: String,

    /// Reference number printed on assignment letters.
    pub assignment_reference: String,

    /// Largest accepted upload in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            model: None,
            provider_name: None,
            provider: None,
            decoding: Decoding::default(),
            max_input_tokens: 825,
            max_new_tokens: 200,
            pdfium_lib_path: None,
            soffice_bin: "soffice".to_string(),
            signatory: Signatory::default(),
            default_supervisor_nip: "0012056904".to_string(),
            assignment_reference: "06274/UN10.F1501/B/KM/2024".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("output_root", &self.output_root)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("decoding", &self.decoding)
            .field("max_input_tokens", &self.max_input_tokens)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("soffice_bin", &self.soffice_bin)
            .field("signatory", &self.signatory)
            .field("default_supervisor_nip", &self.default_supervisor_nip)
            .field("assignment_reference", &self.assignment_reference)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn decoding(mut self, decoding: Decoding) -> Self {
        self.config.decoding = decoding;
        self
    }

    pub fn max_input_tokens(mut self, n: usize) -> Self {
        self.config.max_input_tokens = n;
        self
    }

    pub fn max_new_tokens(mut self, n: usize) -> Self {
        self.config.max_new_tokens = n;
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn soffice_bin(mut self, program: impl Into<String>) -> Self {
        self.config.soffice_bin = program.into();
        self
    }

    pub fn signatory(mut self, signatory: Signatory) -> Self {
        self.config.signatory = signatory;
        self
    }

    pub fn default_supervisor_nip(mut self, nip: impl Into<String>) -> Self {
        self.config.default_supervisor_nip = nip.into();
        self
    }

    pub fn assignment_reference(mut self, reference: impl Into<String>) -> Self {
        self.config.assignment_reference = reference.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, SuratError> {
        let c = &self.config;
        if c.max_input_tokens == 0 {
            return Err(SuratError::InvalidConfig(
                "max_input_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_new_tokens == 0 {
            return Err(SuratError::InvalidConfig(
                "max_new_tokens must be ≥ 1".into(),
            ));
        }
        if let Decoding::Sampled { temperature, top_p } = c.decoding {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(SuratError::InvalidConfig(format!(
                    "temperature must be 0.0–2.0, got {temperature}"
                )));
            }
            if !(top_p > 0.0 && top_p <= 1.0) {
                return Err(SuratError::InvalidConfig(format!(
                    "top_p must be in (0.0, 1.0], got {top_p}"
                )));
            }
        }
        if c.max_upload_bytes == 0 {
            return Err(SuratError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.soffice_bin.trim().is_empty() {
            return Err(SuratError::InvalidConfig(
                "soffice_bin must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Token selection strategy for the field-extraction model.
///
/// Sampled decoding reproduces the behaviour users are used to, but two runs
/// over the same PDF can extract different values. `Greedy` is deterministic
/// and is what tests select.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decoding {
    /// Always take the most likely token (temperature 0).
    Greedy,
    /// Nucleus sampling.
    Sampled { temperature: f32, top_p: f32 },
}

impl Default for Decoding {
    fn default() -> Self {
        Decoding::Sampled {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// The two letter templates a submission can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterKind {
    /// "Surat Tugas Dosen": assigns a lecturer to supervise a competition.
    Assignment,
    /// "Pengajuan Dispensasi": excuses a student from academic activities.
    Exemption,
}

impl LetterKind {
    pub const ALL: [LetterKind; 2] = [LetterKind::Assignment, LetterKind::Exemption];

    /// Label shown in the form and accepted on input.
    pub fn label(self) -> &'static str {
        match self {
            LetterKind::Assignment => "Surat Tugas Dosen",
            LetterKind::Exemption => "Pengajuan Dispensasi",
        }
    }

    /// Short code used in URLs and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            LetterKind::Assignment => "std",
            LetterKind::Exemption => "dispen",
        }
    }

    /// Folder receiving the uploaded request PDFs.
    pub fn upload_folder(self) -> &'static str {
        match self {
            LetterKind::Assignment => "STD",
            LetterKind::Exemption => "Dispen",
        }
    }

    /// Folder receiving the generated letters.
    pub fn letter_folder(self) -> &'static str {
        match self {
            LetterKind::Assignment => "surat_tugas",
            LetterKind::Exemption => "surat_dispen",
        }
    }

    /// File-name prefix of the generated letters.
    pub fn letter_prefix(self) -> &'static str {
        match self {
            LetterKind::Assignment => "surat_tugas",
            LetterKind::Exemption => "surat_dispensasi",
        }
    }
}

impl fmt::Display for LetterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LetterKind {
    type Err = SuratError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        LetterKind::ALL
            .into_iter()
            .find(|k| {
                s == k.label().to_lowercase()
                    || s == k.code()
                    || s == format!("{k:?}").to_lowercase()
            })
            .ok_or_else(|| {
                SuratError::InvalidConfig(format!(
                    "unknown letter kind '{s}' (expected one of: std, dispen, \
                     \"Surat Tugas Dosen\", \"Pengajuan Dispensasi\")"
                ))
            })
    }
}

/// Identity printed in the signature block of every letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatory {
    pub name: String,
    pub nip: String,
    /// Title line above the name, e.g. "Dekan".
    pub title: String,
    /// Faculty named in the letter boilerplate.
    pub faculty: String,
}

impl Default for Signatory {
    fn default() -> Self {
        Self {
            name: "Wayan Firdaus Mahmudy".to_string(),
            nip: "196012301986011001".to_string(),
            title: "Dekan".to_string(),
            faculty: "Fakultas Ilmu Komputer Universitas Brawijaya".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_input_tokens, 825);
        assert_eq!(c.max_new_tokens, 200);
        assert_eq!(
            c.decoding,
            Decoding::Sampled {
                temperature: 0.7,
                top_p: 0.9
            }
        );
        assert_eq!(c.soffice_bin, "soffice");
    }

    #[test]
    fn debug_lists_letter_defaults() {
        let out = format!("{:?}", PipelineConfig::default());
        assert!(out.contains("default_supervisor_nip: \"0012056904\""));
        assert!(out.contains("assignment_reference: \"06274/UN10.F1501/B/KM/2024\""));
        assert!(out.contains("provider: None"));
    }

    #[test]
    fn builder_rejects_bad_sampling() {
        let err = PipelineConfig::builder()
            .decoding(Decoding::Sampled {
                temperature: 0.7,
                top_p: 0.0,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("top_p"));

        let err = PipelineConfig::builder()
            .decoding(Decoding::Sampled {
                temperature: 3.0,
                top_p: 0.9,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn builder_rejects_zero_budgets() {
        assert!(PipelineConfig::builder().max_input_tokens(0).build().is_err());
        assert!(PipelineConfig::builder().max_new_tokens(0).build().is_err());
    }

    #[test]
    fn letter_kind_parses_labels_and_codes() {
        assert_eq!(
            "Surat Tugas Dosen".parse::<LetterKind>().unwrap(),
            LetterKind::Assignment
        );
        assert_eq!(
            "pengajuan dispensasi".parse::<LetterKind>().unwrap(),
            LetterKind::Exemption
        );
        assert_eq!("STD".parse::<LetterKind>().unwrap(), LetterKind::Assignment);
        assert_eq!("dispen".parse::<LetterKind>().unwrap(), LetterKind::Exemption);
        assert_eq!(
            "exemption".parse::<LetterKind>().unwrap(),
            LetterKind::Exemption
        );
        assert!("cuti".parse::<LetterKind>().is_err());
    }

    #[test]
    fn letter_kind_folders() {
        assert_eq!(LetterKind::Assignment.letter_folder(), "surat_tugas");
        assert_eq!(LetterKind::Exemption.letter_folder(), "surat_dispen");
        assert_eq!(LetterKind::Exemption.letter_prefix(), "surat_dispensasi");
        assert_eq!(LetterKind::Assignment.upload_folder(), "STD");
    }
}
