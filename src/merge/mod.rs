//! Placeholder substitution over a parsed document.

mod image;
mod splice;

pub use image::{
    ImagePool, insert_image, insert_images, replace_all_images, replace_first_image,
};
pub use splice::{RunMatch, locate, splice};

use crate::error::Error;
use crate::model::{Block, Document, Paragraph, Run, RunFormat, TableCell};
use crate::xml::XmlElement;

/// Ordered placeholder → value pairs. Keys are processed in this order.
pub type Mapping = Vec<(String, String)>;

/// How line breaks inside a replacement value are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineMode {
    /// One run with `w:br` line breaks.
    #[default]
    Breaks,
    /// First line in place, each further non-blank line as a new paragraph
    /// after the matched one, inside the same table cell.
    Paragraphs,
}

/// Per-key match counts, in mapping order. A count is the number of
/// paragraphs that contained the key, not the number of occurrences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Replacements {
    pub counts: Vec<(String, usize)>,
}

impl Replacements {
    pub fn count(&self, key: &str) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| k == key)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    /// Keys that matched nowhere.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.counts
            .iter()
            .filter(|(_, n)| *n == 0)
            .map(|(k, _)| k.as_str())
    }

    pub(crate) fn record(&mut self, key: &str, count: usize, what: &str) {
        if count > 0 {
            log::info!("Replaced '{}' with {} in {} location(s)", key, what, count);
        } else {
            log::warn!("'{}' not found in document", key);
        }
        self.counts.push((key.to_string(), count));
    }
}

/// Replace every key of `mapping` throughout `document`: top-level paragraphs
/// and paragraphs inside table cells, in document order.
///
/// Missing keys are logged and reported with a zero count. Nothing is rolled
/// back. In [`LineMode::Paragraphs`] only table cells are searched, and a
/// document without tables yields [`Error::NoTables`].
pub fn resolve(
    document: &mut Document,
    mapping: &[(String, String)],
    mode: LineMode,
) -> Result<Replacements, Error> {
    if mode == LineMode::Paragraphs && document.tables().next().is_none() {
        log::error!("No tables found in document");
        return Err(Error::NoTables);
    }

    let mut replacements = Replacements::default();
    for (key, value) in mapping {
        let value = value.replace("\r\n", "\n");
        let count = match mode {
            LineMode::Breaks => replace_everywhere(document, key, &value),
            LineMode::Paragraphs => replace_in_cells(document, key, &value),
        };
        replacements.record(key, count, "text");
    }
    Ok(replacements)
}

fn replace_everywhere(document: &mut Document, key: &str, value: &str) -> usize {
    let mut count = 0;
    document.visit_paragraphs_mut(|paragraph| {
        if paragraph.text().contains(key) && splice(paragraph, key, value) {
            count += 1;
        }
    });
    count
}

fn replace_in_cells(document: &mut Document, key: &str, value: &str) -> usize {
    let mut lines = value.split('\n');
    let first = lines.next().unwrap_or_default();
    let rest: Vec<&str> = lines.filter(|line| !line.trim().is_empty()).collect();

    let mut count = 0;
    document.visit_cells_mut(|cell| count += split_into_cell(cell, key, first, &rest));
    count
}

fn split_into_cell(cell: &mut TableCell, key: &str, first: &str, rest: &[&str]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < cell.blocks.len() {
        let follow_on = match &mut cell.blocks[i] {
            Block::Paragraph(p) if p.text().contains(key) => {
                if splice(p, key, first) {
                    Some(FollowOn::of(p))
                } else {
                    None
                }
            }
            _ => None,
        };
        i += 1;
        let Some(follow_on) = follow_on else {
            continue;
        };
        count += 1;
        for line in rest {
            cell.blocks.insert(i, Block::Paragraph(follow_on.paragraph(line)));
            i += 1;
        }
    }
    count
}

/// Style and character formatting carried onto the extra paragraphs of a
/// multi-line value.
struct FollowOn {
    style: Option<XmlElement>,
    format: RunFormat,
}

impl FollowOn {
    fn of(paragraph: &Paragraph) -> Self {
        let style = paragraph
            .properties()
            .and_then(|ppr| ppr.child(crate::docx::WML_NS, "pStyle"))
            .cloned();
        let mut format = RunFormat::default();
        if let Some(run) = paragraph.runs().next() {
            let source = run.format();
            format.inherit(&RunFormat {
                underline: None,
                ..source
            });
        }
        Self { style, format }
    }

    fn paragraph(&self, line: &str) -> Paragraph {
        let mut paragraph = Paragraph::new();
        if let Some(style) = &self.style {
            paragraph.set_properties(Some(
                XmlElement::new("w:pPr", Some(crate::docx::WML_NS)).with_child(style.clone()),
            ));
        }
        paragraph.push_run(Run::with_text(line, &self.format));
        paragraph
    }
}
