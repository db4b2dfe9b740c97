//! Document parsing: raw bytes of a named file into searchable text.
//!
//! Parsing never fails. Decoding and extraction problems are reported through
//! [`ParseFidelity::Degraded`] and the best available text is returned.

use crate::html;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Document kind, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Markdown,
    Text,
    Json,
    Html,
    Pdf,
    Unknown,
}

impl DocumentKind {
    /// Detect kind from a filename (case-insensitive extension).
    pub fn from_filename(filename: &str) -> Self {
        match extension(filename).as_str() {
            "md" | "markdown" => Self::Markdown,
            "txt" => Self::Text,
            "json" => Self::Json,
            "html" | "htm" => Self::Html,
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Json => "json",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Unknown => "unknown",
        }
    }
}

/// Why a parse produced less than full-fidelity text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradeReason {
    /// Bytes were not valid UTF-8 and were decoded as Latin-1
    LossyDecoding,
    /// JSON did not parse; raw text was kept
    MalformedJson(String),
    /// PDF extraction failed; raw bytes were decoded as text
    PdfExtraction(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LossyDecoding => write!(f, "not valid UTF-8, decoded as Latin-1"),
            Self::MalformedJson(msg) => write!(f, "malformed JSON: {}", msg),
            Self::PdfExtraction(msg) => write!(f, "PDF extraction failed: {}", msg),
        }
    }
}

/// Outcome quality of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParseFidelity {
    #[default]
    Exact,
    Degraded(DegradeReason),
}

impl ParseFidelity {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Structural metadata extracted alongside the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html_names: Vec<String>,
}

/// A parsed document. Derived once per document and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub source_document: String,
    pub kind: DocumentKind,

    /// Lowercased extension including the dot, or empty
    pub ext: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    pub fidelity: ParseFidelity,
}

/// Parse `bytes` as the file named `filename`.
pub fn parse_document(filename: &str, bytes: &[u8]) -> ParsedDocument {
    let kind = DocumentKind::from_filename(filename);
    let ext = match extension(filename) {
        e if e.is_empty() => String::new(),
        e => format!(".{}", e),
    };

    let (text, decoding) = decode_bytes(bytes);
    let mut metadata = DocumentMetadata::default();
    let mut fidelity = decoding;

    let text = match kind {
        DocumentKind::Markdown | DocumentKind::Text | DocumentKind::Unknown => text,
        DocumentKind::Json => match serde_json::from_str::<Value>(&text) {
            Ok(value) => flatten_json(&value).join("\n"),
            Err(e) => {
                fidelity = ParseFidelity::Degraded(DegradeReason::MalformedJson(e.to_string()));
                text
            }
        },
        DocumentKind::Html => {
            let scan = html::scan_markup(&text);
            metadata.html_ids = scan.ids;
            metadata.html_names = scan.names;
            scan.text
        }
        DocumentKind::Pdf => match extract_pdf(bytes) {
            Ok(extracted) => {
                fidelity = ParseFidelity::Exact;
                extracted
            }
            Err(msg) => {
                fidelity = ParseFidelity::Degraded(DegradeReason::PdfExtraction(msg));
                text
            }
        },
    };

    if let ParseFidelity::Degraded(reason) = &fidelity {
        warn!("Degraded parse of '{}': {}", filename, reason);
    }

    ParsedDocument {
        source_document: filename.to_string(),
        kind,
        ext,
        text,
        metadata,
        fidelity,
    }
}

/// Decode as UTF-8, falling back to Latin-1 (every byte maps to one char).
pub fn decode_bytes(bytes: &[u8]) -> (String, ParseFidelity) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), ParseFidelity::Exact),
        Err(_) => (
            bytes.iter().map(|&b| b as char).collect(),
            ParseFidelity::Degraded(DegradeReason::LossyDecoding),
        ),
    }
}

/// Flatten a JSON value into `path: scalar` lines.
///
/// Object keys are joined with `/`, array indices appended as `[i]`. A bare
/// scalar at the root yields a single line with an empty path.
pub fn flatten_json(value: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    flatten_into(value, "", &mut lines);
    lines
}

fn flatten_into(value: &Value, prefix: &str, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}/{}", prefix, key)
                };
                flatten_into(child, &path, lines);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, &format!("{}[{}]", prefix, i), lines);
            }
        }
        Value::String(s) => lines.push(format!("{}: {}", prefix, s)),
        scalar => lines.push(format!("{}: {}", prefix, scalar)),
    }
}

/// Per-page PDF text joined with newlines.
fn extract_pdf(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
    match result {
        Ok(Ok(pages)) => Ok(pages
            .iter()
            .map(|page| page.trim())
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n")),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("extractor panicked".to_string()),
    }
}

fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection_is_case_insensitive() {
        assert_eq!(DocumentKind::from_filename("SPECS.MD"), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_filename("page.HTM"), DocumentKind::Html);
        assert_eq!(DocumentKind::from_filename("notes.txt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_filename("api.Json"), DocumentKind::Json);
        assert_eq!(DocumentKind::from_filename("guide.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("Makefile"), DocumentKind::Unknown);
    }

    #[test]
    fn test_markdown_passes_through_verbatim() {
        let src = "# Discounts\n\nCode SAVE15 gives 15% off.\n";
        let doc = parse_document("product_specs.md", src.as_bytes());
        assert_eq!(doc.text, src);
        assert_eq!(doc.ext, ".md");
        assert_eq!(doc.fidelity, ParseFidelity::Exact);
    }

    #[test]
    fn test_invalid_utf8_degrades_to_latin1() {
        let doc = parse_document("notes.txt", &[b'c', b'a', b'f', 0xE9]);
        assert_eq!(doc.text, "caf\u{e9}");
        assert_eq!(
            doc.fidelity,
            ParseFidelity::Degraded(DegradeReason::LossyDecoding)
        );
    }

    #[test]
    fn test_json_flattening() {
        let src = r#"{"discounts":{"SAVE15":{"percent":15,"active":true}},"shipping":[{"name":"express","cost":10}, null]}"#;
        let doc = parse_document("api.json", src.as_bytes());
        assert_eq!(
            doc.text,
            "discounts/SAVE15/percent: 15\n\
             discounts/SAVE15/active: true\n\
             shipping[0]/name: express\n\
             shipping[0]/cost: 10\n\
             shipping[1]: null"
        );
        assert!(!doc.fidelity.is_degraded());
    }

    #[test]
    fn test_malformed_json_keeps_raw_text() {
        let src = "{\"discount\": 15,";
        let doc = parse_document("broken.json", src.as_bytes());
        assert_eq!(doc.text, src);
        assert!(matches!(
            doc.fidelity,
            ParseFidelity::Degraded(DegradeReason::MalformedJson(_))
        ));
    }

    #[test]
    fn test_html_collects_ids_and_names() {
        let src = r#"<form><input id="email" name="email"><button id="pay_now">Pay Now</button></form>"#;
        let doc = parse_document("checkout.html", src.as_bytes());
        assert_eq!(doc.text, "Pay Now");
        assert_eq!(doc.metadata.html_ids, vec!["email", "pay_now"]);
        assert_eq!(doc.metadata.html_names, vec!["email"]);
    }

    /// Minimal PDF with one line of Helvetica text per page.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pdf_pages_joined_with_line_breaks() {
        let doc = parse_document("guide.pdf", &pdf_with_pages(&["Alpha", "Omega"]));
        assert_eq!(doc.fidelity, ParseFidelity::Exact);

        let alpha = doc.text.find("Alpha").unwrap();
        let omega = doc.text.find("Omega").unwrap();
        assert!(alpha < omega);
        assert!(doc.text[alpha..omega].contains('\n'), "{:?}", doc.text);
        assert_eq!(doc.text.lines().count(), 2, "{:?}", doc.text);
    }

    #[test]
    fn test_invalid_pdf_falls_back_to_raw_text() {
        let doc = parse_document("guide.pdf", b"not really a pdf");
        assert_eq!(doc.text, "not really a pdf");
        assert!(matches!(
            doc.fidelity,
            ParseFidelity::Degraded(DegradeReason::PdfExtraction(_))
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let src = br#"<p id="a">Hello</p>"#;
        assert_eq!(
            parse_document("p.html", src),
            parse_document("p.html", src)
        );
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_document("empty.json", b"");
        assert_eq!(doc.text, "");
        assert!(doc.fidelity.is_degraded());
        assert_eq!(parse_document("empty.md", b"").text, "");
    }
}
