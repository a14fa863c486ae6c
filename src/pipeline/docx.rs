//! Minimal WordprocessingML (DOCX) writer.
//!
//! A `.docx` file is a zip archive of XML parts. Letters only need headings,
//! paragraphs with an alignment, and bold/italic runs, so this module models
//! exactly that and serialises it with `quick-xml` into the five parts Word
//! and LibreOffice require.

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::{self, Cursor, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    fn as_ooxml(self) -> Option<&'static str> {
        match self {
            Alignment::Left => None,
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
        }
    }
}

/// A span of text sharing one character format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Self::default()
        }
    }
}

/// A block-level paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    /// `Some(n)` renders with the `Heading{n}` style.
    pub heading: Option<u8>,
    pub alignment: Alignment,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_run(Run::plain(text))
    }

    pub fn with_run(run: Run) -> Self {
        Self {
            runs: vec![run],
            ..Self::default()
        }
    }

    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self {
            heading: Some(level),
            ..Self::text(text)
        }
    }

    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Concatenated run text.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// An ordered list of paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, paragraph: Paragraph) -> &mut Self {
        self.paragraphs.push(paragraph);
        self
    }

    /// All text, one line per paragraph.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialise as a complete `.docx` package.
    pub fn write_to<W: Write + Seek>(&self, out: W) -> io::Result<W> {
        let mut zip = ZipWriter::new(out);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;
        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(DOCUMENT_RELS.as_bytes())?;
        zip.start_file("word/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;
        zip.start_file("word/document.xml", options)?;
        zip.write_all(&self.document_xml()?)?;

        zip.finish().map_err(io::Error::other)
    }

    /// Serialise into memory.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// The `word/document.xml` part.
    pub fn document_xml(&self) -> io::Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer
            .create_element("w:document")
            .with_attribute(("xmlns:w", W_NS))
            .write_inner_content(|w| {
                w.create_element("w:body").write_inner_content(|w| {
                    for paragraph in &self.paragraphs {
                        write_paragraph(w, paragraph)?;
                    }
                    write_section(w)
                })?;
                Ok(())
            })?;
        Ok(writer.into_inner().into_inner())
    }
}

fn write_paragraph<W: Write>(w: &mut Writer<W>, p: &Paragraph) -> io::Result<()> {
    w.create_element("w:p").write_inner_content(|w| {
        if p.heading.is_some() || p.alignment.as_ooxml().is_some() {
            w.create_element("w:pPr").write_inner_content(|w| {
                if let Some(level) = p.heading {
                    let style = format!("Heading{level}");
                    w.create_element("w:pStyle")
                        .with_attribute(("w:val", style.as_str()))
                        .write_empty()?;
                }
                if let Some(jc) = p.alignment.as_ooxml() {
                    w.create_element("w:jc")
                        .with_attribute(("w:val", jc))
                        .write_empty()?;
                }
                Ok(())
            })?;
        }
        for run in &p.runs {
            write_run(w, run)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn write_run<W: Write>(w: &mut Writer<W>, run: &Run) -> io::Result<()> {
    w.create_element("w:r").write_inner_content(|w| {
        if run.bold || run.italic {
            w.create_element("w:rPr").write_inner_content(|w| {
                if run.bold {
                    w.create_element("w:b").write_empty()?;
                }
                if run.italic {
                    w.create_element("w:i").write_empty()?;
                }
                Ok(())
            })?;
        }
        // Newlines inside a run are explicit breaks in WordprocessingML.
        for (i, line) in run.text.split('\n').enumerate() {
            if i > 0 {
                w.create_element("w:br").write_empty()?;
            }
            let line = xml_text(line);
            if !line.is_empty() {
                w.create_element("w:t")
                    .with_attribute(("xml:space", "preserve"))
                    .write_text_content(BytesText::new(&line))?;
            }
        }
        Ok(())
    })?;
    Ok(())
}

/// Drop characters that XML 1.0 does not allow in text (most C0 controls,
/// U+FFFE and U+FFFF). Escaping cannot represent them.
fn xml_text(s: &str) -> Cow<'_, str> {
    let allowed = |c: char| {
        matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
    };
    if s.chars().all(allowed) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| allowed(c)).collect())
    }
}

/// A4 portrait with 1" margins.
fn write_section<W: Write>(w: &mut Writer<W>) -> io::Result<()> {
    w.create_element("w:sectPr").write_inner_content(|w| {
        w.create_element("w:pgSz")
            .with_attributes([("w:w", "11906"), ("w:h", "16838")])
            .write_empty()?;
        w.create_element("w:pgMar")
            .with_attributes([
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ])
            .write_empty()?;
        Ok(())
    })?;
    Ok(())
}

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults>
<w:rPrDefault><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:cs="Times New Roman"/><w:sz w:val="24"/></w:rPr></w:rPrDefault>
<w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault>
</w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
</w:styles>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.push(Paragraph::heading("SURAT TUGAS", 1).aligned(Alignment::Center))
            .push(Paragraph::with_run(Run::bold("Kepada <Yth> & rekan")))
            .push(Paragraph::text("baris satu\nbaris dua").aligned(Alignment::Right));
        doc
    }

    #[test]
    fn document_xml_escapes_and_formats() {
        let xml = String::from_utf8(sample().document_xml().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(r#"<w:jc w:val="right"/>"#));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains("Kepada &lt;Yth&gt; &amp; rekan"));
        assert!(xml.contains("baris satu</w:t><w:br/><w:t xml:space=\"preserve\">baris dua"));
    }

    #[test]
    fn control_characters_are_dropped_from_text() {
        let mut doc = Document::new();
        doc.push(Paragraph::text("Budi\u{0C} Santoso\u{1}\ttab\u{FFFF}"));
        let xml = String::from_utf8(doc.document_xml().unwrap()).unwrap();
        assert!(xml.contains("Budi Santoso\ttab</w:t>"));
        assert!(!xml.contains(['\u{0C}', '\u{1}', '\u{FFFF}']));
    }

    #[test]
    fn package_contains_required_parts() {
        let bytes = sample().to_bytes().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/document.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {name}");
        }
        let mut body = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert!(body.contains("SURAT TUGAS"));
    }

    #[test]
    fn plain_text_joins_paragraphs() {
        let text = sample().plain_text();
        assert_eq!(
            text,
            "SURAT TUGAS\nKepada <Yth> & rekan\nbaris satu\nbaris dua"
        );
    }
}
