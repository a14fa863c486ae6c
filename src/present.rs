//! Presentation of a submission: HTML pages for the web form and plain
//! `Label: value` lines for the terminal.
//!
//! Every interpolated string goes through [`escape_html`]; extracted values
//! come straight from a model and file names from the client.

use crate::config::LetterKind;
use crate::fields::ExtractedFields;
use crate::process::Submission;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::borrow::Cow;
use std::fmt::Write;

pub const APP_TITLE: &str = "Aplikasi Pengajuan Dokumen Kemahasiswaan";

/// Escape `<`, `>`, `&`, `'` and `"`.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// `Label: value` per line, in extraction order.
pub fn format_fields(fields: &ExtractedFields) -> String {
    let mut out = String::new();
    for (label, value) in fields.iter() {
        let _ = writeln!(out, "{label}: {value}");
    }
    out
}

/// Upload form with a kind selector. `error` is shown above the form.
pub fn render_form_page(kinds: &[LetterKind], selected: LetterKind, error: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(message) = error {
        let _ = writeln!(
            body,
            r#"<div class="alert">{}</div>"#,
            escape_html(message)
        );
    }

    body.push_str(r#"<form method="post" action="/process" enctype="multipart/form-data">"#);
    body.push_str("\n<fieldset><legend>Pilih Jenis Pengajuan</legend>\n");
    for kind in kinds {
        let checked = if *kind == selected { " checked" } else { "" };
        let _ = writeln!(
            body,
            r#"<label><input type="radio" name="kind" value="{code}"{checked}> {label}</label><br>"#,
            code = kind.code(),
            label = escape_html(kind.label()),
        );
    }
    body.push_str("</fieldset>\n");
    body.push_str(
        r#"<p><label>Upload dokumen (PDF): <input type="file" name="file" accept="application/pdf,.pdf" required></label></p>
<p><button type="submit">Proses Dokumen</button></p>
</form>"#,
    );

    page(
        &format!("Form Pengajuan {}", selected.label()),
        &body,
    )
}

/// Result page: extracted fields on one tab, the generated PDF inline on
/// the other.
pub fn render_result_page(submission: &Submission, pdf_bytes: &[u8]) -> String {
    let mut fields = String::new();
    if submission.fields.is_empty() {
        fields.push_str("<p><em>Tidak ada informasi yang berhasil diekstrak.</em></p>\n");
    } else {
        fields.push_str("<dl>\n");
        for (label, value) in submission.fields.iter() {
            let _ = writeln!(
                fields,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(label),
                escape_html(value)
            );
        }
        fields.push_str("</dl>\n");
    }

    let folder = submission
        .upload_path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let pdf_name = submission
        .document
        .pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let encoded = STANDARD.encode(pdf_bytes);

    let mut body = String::new();
    let _ = writeln!(
        body,
        r#"<div class="success">File berhasil disimpan di folder {}</div>"#,
        escape_html(&folder)
    );
    let _ = write!(
        body,
        r#"<div class="tabs">
<input type="radio" name="tab" id="tab-fields" checked><label for="tab-fields">Hasil Ekstraksi</label>
<input type="radio" name="tab" id="tab-preview"><label for="tab-preview">Preview Dokumen</label>
<section id="panel-fields">
<h3>Informasi yang Diekstrak:</h3>
{fields}</section>
<section id="panel-preview">
<h3>Dokumen yang Dihasilkan:</h3>
<iframe src="data:application/pdf;base64,{encoded}" width="700" height="1000" type="application/pdf"></iframe>
<p><a href="/documents/{code}/{href}" download>Unduh {name}</a></p>
</section>
</div>
<p><a href="/?kind={code}">Ajukan dokumen lain</a></p>"#,
        code = submission.kind.code(),
        href = escape_html(&pdf_name),
        name = escape_html(&pdf_name),
    );

    page(
        &format!("Form Pengajuan {}", submission.kind.label()),
        &body,
    )
}

fn page(heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{title}</h1>
<h2>{heading}</h2>
{body}
</body>
</html>
"#,
        title = APP_TITLE,
        heading = escape_html(heading),
    )
}

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
.alert{background:#fde8e8;color:#9b1c1c;padding:.75rem;border-radius:4px}\
.success{background:#def7ec;color:#03543f;padding:.75rem;border-radius:4px}\
.tabs>input{display:none}\
.tabs>label{display:inline-block;padding:.5rem 1rem;cursor:pointer;border-bottom:2px solid transparent}\
.tabs>input:checked+label{border-bottom-color:#e02424}\
.tabs>section{display:none;padding-top:1rem}\
#tab-fields:checked~#panel-fields,#tab-preview:checked~#panel-preview{display:block}\
dt{font-weight:bold}dd{margin:0 0 .5rem 0}";
