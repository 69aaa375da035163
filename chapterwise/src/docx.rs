// DOCX parsing and paragraph extraction

use log::{debug, info};
use std::io::{Cursor, Read};
use thiserror::Error;

/// Style classification for an extracted paragraph.
///
/// Classification happens once, here, so downstream code never deals with
/// raw style-name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Heading,
    Body,
}

/// A paragraph extracted from a DOCX document, in document order
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// Plain text content (entities decoded, trimmed)
    pub text: String,
    /// Style classification
    pub style: ParagraphStyle,
}

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("Not a DOCX file: {0}")]
    InvalidFileType(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Style ids that mark the start of a new chapter
const HEADING_STYLES: &[&str] = &["Title", "Heading1", "Heading2"];

/// Parse a DOCX byte stream and extract its paragraphs in document order
pub fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<Paragraph>, DocxError> {
    debug!("Opening DOCX container ({} bytes)", bytes.len());

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocxError::InvalidFileType(format!("not a ZIP container: {}", e)))?;

    let mut file = archive
        .by_name("word/document.xml")
        .map_err(|_| DocxError::InvalidFileType("missing word/document.xml".to_string()))?;

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| DocxError::Malformed(format!("unreadable document.xml: {}", e)))?;

    let mut paragraphs = Vec::new();

    for block in paragraph_blocks(&xml) {
        let text = collect_text_runs(block);
        let trimmed = text.trim();

        // Skip empty paragraphs
        if trimmed.is_empty() {
            continue;
        }

        let style = match extract_style_id(block) {
            Some(id) if HEADING_STYLES.contains(&id.as_str()) => ParagraphStyle::Heading,
            _ => ParagraphStyle::Body,
        };

        paragraphs.push(Paragraph {
            text: trimmed.to_string(),
            style,
        });
    }

    if paragraphs.is_empty() {
        return Err(DocxError::Malformed(
            "no extractable paragraphs".to_string(),
        ));
    }

    info!("Extracted {} paragraphs from document", paragraphs.len());
    Ok(paragraphs)
}

/// Find all `<w:p>` element bodies in document order
fn paragraph_blocks(xml: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(rel_start) = find_element_open(&xml[pos..], "w:p") {
        let start = pos + rel_start;
        let Some(content_start) = xml[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let Some(end) = xml[content_start..].find("</w:p>").map(|i| content_start + i) else {
            break;
        };
        blocks.push(&xml[content_start..end]);
        pos = end + "</w:p>".len();
    }

    blocks
}

/// Find the opening of an element with the exact given name, ignoring
/// elements whose names merely share the prefix (w:p vs w:pPr vs w:pStyle).
fn find_element_open(xml: &str, name: &str) -> Option<usize> {
    let tag = format!("<{}", name);
    let mut pos = 0;

    while let Some(rel) = xml[pos..].find(&tag) {
        let start = pos + rel;
        let after = xml[start + tag.len()..].chars().next();
        match after {
            Some('>') | Some(' ') | Some('/') | Some('\t') | Some('\n') | Some('\r') => {
                return Some(start);
            }
            _ => pos = start + tag.len(),
        }
    }

    None
}

/// Extract the paragraph style id from a `<w:pStyle w:val="..."/>` element
fn extract_style_id(block: &str) -> Option<String> {
    let start = find_element_open(block, "w:pStyle")?;
    let tag_end = block[start..].find('>').map(|i| start + i)?;
    let tag = &block[start..tag_end];

    let val_start = tag.find("w:val=\"").map(|i| i + "w:val=\"".len())?;
    let val_end = tag[val_start..].find('"').map(|i| val_start + i)?;

    Some(tag[val_start..val_end].to_string())
}

/// Concatenate the contents of all `<w:t>` runs in a paragraph block
fn collect_text_runs(block: &str) -> String {
    let mut result = String::new();
    let mut pos = 0;

    while let Some(rel_start) = find_element_open(&block[pos..], "w:t") {
        let start = pos + rel_start;
        let Some(content_start) = block[start..].find('>').map(|i| start + i + 1) else {
            break;
        };

        // Self-closing run has no text
        if block[start..content_start].ends_with("/>") {
            pos = content_start;
            continue;
        }

        let Some(end) = block[content_start..].find("</w:t>").map(|i| content_start + i) else {
            break;
        };
        result.push_str(&unescape_xml(&block[content_start..end]));
        pos = end + "</w:t>".len();
    }

    result
}

/// Decode the XML entities WordprocessingML text runs can contain
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Build a minimal DOCX archive from (style, text) pairs. Test helper shared
/// with the pipeline tests.
#[cfg(test)]
pub(crate) fn make_docx(paragraphs: &[(Option<&str>, &str)]) -> Vec<u8> {
    use std::io::Write;

    let mut body = String::new();
    for (style, text) in paragraphs {
        body.push_str("<w:p>");
        if let Some(style) = style {
            body.push_str(&format!("<w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>", style));
        }
        body.push_str(&format!("<w:r><w:t>{}</w:t></w:r>", text));
        body.push_str("</w:p>");
    }
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document><w:body>{}</w:body></w:document>",
        body
    );

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}
