//! Chapter segmentation: turning the paragraph stream into titled chapters.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::docx::{Paragraph, ParagraphStyle};

/// A titled contiguous span of document content
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Chapter title, taken from a heading paragraph
    pub title: String,
    /// Body paragraphs joined with single newlines (may be empty)
    pub body: String,
    /// Position within the document, starting at 0
    pub order: usize,
}

/// What to do with body text appearing before the first heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadingTextPolicy {
    /// Collect it into an implicit chapter titled "Introduction"
    Introduction,
    /// Discard it
    Drop,
}

/// Title used for the implicit leading chapter
const IMPLICIT_CHAPTER_TITLE: &str = "Introduction";

#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Title for the single chapter of a document with no headings
    pub default_title: String,
    /// Policy for body text before the first heading
    pub leading_text: LeadingTextPolicy,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            default_title: "Document".to_string(),
            leading_text: LeadingTextPolicy::Introduction,
        }
    }
}

/// Split the paragraph stream into chapters at heading paragraphs.
///
/// Pure transformation: chapters come out contiguous, non-overlapping, and in
/// document order. A document with no headings at all yields exactly one
/// chapter titled `options.default_title`, whatever the leading-text policy.
pub fn segment(paragraphs: &[Paragraph], options: &SegmentOptions) -> Vec<Chapter> {
    let has_headings = paragraphs
        .iter()
        .any(|p| p.style == ParagraphStyle::Heading);

    if !has_headings {
        let body: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        info!(
            "No headings found; producing single chapter \"{}\"",
            options.default_title
        );
        return vec![Chapter {
            title: options.default_title.clone(),
            body: body.join("\n"),
            order: 0,
        }];
    }

    let mut chapters: Vec<Chapter> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for paragraph in paragraphs {
        match paragraph.style {
            ParagraphStyle::Heading => {
                if let Some((title, body)) = current.take() {
                    push_chapter(&mut chapters, title, &body);
                }
                debug!("New chapter: {}", paragraph.text);
                current = Some((paragraph.text.clone(), Vec::new()));
            }
            ParagraphStyle::Body => match current {
                Some((_, ref mut body)) => body.push(&paragraph.text),
                None => match options.leading_text {
                    LeadingTextPolicy::Introduction => {
                        debug!("Leading body text collected into implicit chapter");
                        current = Some((IMPLICIT_CHAPTER_TITLE.to_string(), vec![&paragraph.text]));
                    }
                    LeadingTextPolicy::Drop => {
                        debug!("Dropping body text before first heading");
                    }
                },
            },
        }
    }

    if let Some((title, body)) = current {
        push_chapter(&mut chapters, title, &body);
    }

    info!("Segmented document into {} chapters", chapters.len());
    chapters
}

fn push_chapter(chapters: &mut Vec<Chapter>, title: String, body: &[&str]) {
    let order = chapters.len();
    chapters.push(Chapter {
        title,
        body: body.join("\n"),
        order,
    });
}
