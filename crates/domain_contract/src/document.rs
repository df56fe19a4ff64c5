//! Contract PDF documents
//!
//! Generates a single-page PDF 1.4 file with a title and the contract text
//! in Helvetica. Lines longer than the page are wrapped; text that does not
//! fit on the page is cut off.

use core_kernel::PdfId;
use serde::{Deserialize, Serialize};

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const LINE_HEIGHT: u32 = 14;
const WRAP_COLUMNS: usize = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDocument {
    pub id: PdfId,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl ContractDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: PdfId::new_v7(),
            bytes,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(D::Error::custom)
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn escape(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .fold(String::new(), |mut out, c| {
            if matches!(c, '(' | ')' | '\\') {
                out.push('\\');
            }
            out.push(c);
            out
        })
}

fn wrap(line: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > WRAP_COLUMNS {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    lines.push(current);
    lines
}

fn content_stream(title: &str, body: &str) -> String {
    let max_lines = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT) as usize - 2;
    let mut stream = format!(
        "BT\n/F1 16 Tf\n{} {} Td\n({}) Tj\n/F1 10 Tf\n0 -{} Td\n",
        MARGIN,
        PAGE_HEIGHT - MARGIN,
        escape(title),
        LINE_HEIGHT * 2
    );
    for line in body.lines().flat_map(wrap).take(max_lines) {
        stream.push_str(&format!("({}) Tj\n0 -{} Td\n", escape(&line), LINE_HEIGHT));
    }
    stream.push_str("ET");
    stream
}

/// Renders a titled text document as PDF bytes
pub fn render_pdf(title: &str, body: &str) -> Vec<u8> {
    let stream = content_stream(title, body);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, object));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_pdf_with_text() {
        let bytes = render_pdf("Contract Agreement", "Order (42)\nSecond line");
        assert!(is_pdf(&bytes));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("(Contract Agreement) Tj"));
        assert!(text.contains("(Order \\(42\\)) Tj"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_xref_points_at_objects() {
        let bytes = render_pdf("T", "body");
        let text = String::from_utf8(bytes).unwrap();
        let xref = text.find("xref\n").unwrap();
        let first_entry = text[xref..].lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(text[offset..].starts_with("1 0 obj"));
    }

    #[test]
    fn test_long_lines_wrap() {
        let long = "word ".repeat(60);
        let wrapped = wrap(&long);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|l| l.len() <= WRAP_COLUMNS));
    }
}
