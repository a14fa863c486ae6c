//! Extracted field sets and the parser for model output.
//!
//! The model is asked to answer with one `Label: value` line per field, but
//! nothing forces it to. [`parse_fields`] is therefore deliberately lenient:
//! anything that is not a `key: non-empty value` line is skipped.

use crate::prompts::FieldSpec;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Label → value pairs pulled out of a request document.
///
/// Keeps first-seen order for display. Inserting an existing key replaces its
/// value in place, so duplicate labels keep the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    entries: Vec<(String, String)>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look a schema field up by its label or any alias, ignoring case,
    /// spacing and parenthetical hints. The last matching entry wins.
    pub fn find(&self, spec: &FieldSpec) -> Option<&str> {
        let wanted: Vec<String> = std::iter::once(spec.label)
            .chain(spec.aliases.iter().copied())
            .map(normalize_label)
            .collect();

        // Prefer the primary label over aliases when both are present.
        for name in &wanted {
            if let Some((_, v)) = self
                .entries
                .iter()
                .rev()
                .find(|(k, _)| normalize_label(k) == *name)
            {
                return Some(v.as_str());
            }
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = ExtractedFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// Parse decoded model output into fields.
///
/// For every line containing a `:`, the text before the first colon is the
/// key and the rest is the value, both trimmed. Lines without a colon and
/// lines whose value is empty are ignored.
pub fn parse_fields(output: &str) -> ExtractedFields {
    let mut fields = ExtractedFields::new();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        fields.insert(key.trim(), value);
    }
    fields
}

static RE_TRAILING_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical form of a label for matching: markdown emphasis and list
/// bullets stripped, a trailing `(hint)` removed, whitespace collapsed,
/// upper-cased.
pub fn normalize_label(label: &str) -> String {
    let s = label.trim().trim_start_matches(['-', '•', '*']).replace('*', "");
    let s = RE_TRAILING_HINT.replace(s.trim(), "");
    RE_WHITESPACE.replace_all(s.trim(), " ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LetterKind;
    use crate::prompts::{spec_for, Field};

    #[test]
    fn parses_label_value_lines() {
        let f = parse_fields("Nama Lengkap: Budi Santoso\nNIM: 12345");
        assert_eq!(f.get("Nama Lengkap"), Some("Budi Santoso"));
        assert_eq!(f.get("NIM"), Some("12345"));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn ignores_lines_without_colon() {
        let f = parse_fields("Anda adalah asisten AI\nFormat hasil ekstraksi\nNIM: 1");
        assert_eq!(f.len(), 1);
        assert_eq!(f.get("NIM"), Some("1"));
    }

    #[test]
    fn drops_empty_values() {
        let f = parse_fields("Jurusan:   \nLokasi:\nNIM: 7");
        assert_eq!(f.get("Jurusan"), None);
        assert_eq!(f.get("Lokasi"), None);
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn splits_on_first_colon_and_trims() {
        let f = parse_fields("  Tanggal :  12:30 WIB  ");
        assert_eq!(f.get("Tanggal"), Some("12:30 WIB"));
    }

    #[test]
    fn duplicate_keys_keep_last_value_first_position() {
        let f = parse_fields("NIM: 1\nNama Lengkap: A\nNIM: 2");
        assert_eq!(f.get("NIM"), Some("2"));
        let keys: Vec<&str> = f.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["NIM", "Nama Lengkap"]);
    }

    #[test]
    fn empty_output_yields_empty_fields() {
        assert!(parse_fields("").is_empty());
        assert!(parse_fields("\n\n   \n").is_empty());
    }

    #[test]
    fn normalize_strips_hints_and_spacing() {
        assert_eq!(normalize_label("NIM (yang bernilai angka)"), "NIM");
        assert_eq!(normalize_label("NAMA  LENGKAP"), "NAMA LENGKAP");
        assert_eq!(normalize_label("**Nama Lengkap**"), "NAMA LENGKAP");
        assert_eq!(normalize_label("- Jurusan"), "JURUSAN");
    }

    #[test]
    fn find_matches_label_variants_and_aliases() {
        let nim = spec_for(LetterKind::Exemption, Field::StudentNim).unwrap();
        let f = parse_fields("NIM (yang bernilai angka): 12345");
        assert_eq!(f.find(nim), Some("12345"));

        let dept = spec_for(LetterKind::Exemption, Field::Department).unwrap();
        let f = parse_fields("FAKULTAS: Ilmu Komputer");
        assert_eq!(f.find(dept), Some("Ilmu Komputer"));
    }

    #[test]
    fn find_prefers_primary_label_over_alias() {
        let dept = spec_for(LetterKind::Exemption, Field::Department).unwrap();
        let f = parse_fields("Jurusan: Informatika\nFakultas: Ilmu Komputer");
        assert_eq!(f.find(dept), Some("Informatika"));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let f = parse_fields("NIM: 12345\nNama Lengkap: Budi");
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#"{"NIM":"12345","Nama Lengkap":"Budi"}"#);
    }
}
