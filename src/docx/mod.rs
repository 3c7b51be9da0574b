mod media;
mod write;

pub use media::{EmbeddedImage, Media};
pub(crate) use write::write_document;

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use crate::error::Error;
use crate::model::{
    Block, Document, Paragraph, ParagraphItem, RowItem, Run, RunContent, RunFormat, RunGroup,
    Table, TableCell, TableItem, TableRow,
};
use crate::xml::{self, XmlElement, XmlNode};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const WPD_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const PKG_REL_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const CONTENT_TYPES_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// An opened `.docx`: every ZIP entry in its original order, plus the parsed
/// document part and the media registry. Only `word/document.xml`, its
/// relationships, the content types and new media parts are rewritten on save.
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
    document: Document,
    media: Media,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::MissingResource(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        let document_xml = part_text(&entries, DOCUMENT_PART)?.ok_or_else(|| {
            Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into())
        })?;
        let document = parse_document(document_xml)?;

        let relationships = match part_text(&entries, DOCUMENT_RELS_PART)? {
            Some(text) => xml::parse(text)?,
            None => XmlElement::new("Relationships", Some(PKG_REL_NS))
                .with_attr("xmlns", PKG_REL_NS),
        };
        let content_types = part_text(&entries, CONTENT_TYPES_PART)?
            .map(xml::parse)
            .transpose()?
            .ok_or_else(|| Error::InvalidDocx("missing [Content_Types].xml".into()))?;

        let taken: HashSet<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        let media = Media::new(relationships, content_types, taken, document.max_drawing_id());

        log::debug!(
            "Opened package: {} entries, {} blocks",
            entries.len(),
            document.blocks.len()
        );

        Ok(Self {
            entries,
            document,
            media,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    /// Borrow the document and the media registry at the same time, for
    /// operations that insert images while walking paragraphs.
    pub fn parts_mut(&mut self) -> (&mut Document, &mut Media) {
        (&mut self.document, &mut self.media)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Cursor::new(Vec::new());
        let mut zip = zip::ZipWriter::new(&mut out);
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        let mut wrote_rels = false;
        for (name, data) in &self.entries {
            let contents: Cow<[u8]> = match name.as_str() {
                DOCUMENT_PART => Cow::Owned(write_document(&self.document).into_bytes()),
                DOCUMENT_RELS_PART => {
                    wrote_rels = true;
                    Cow::Owned(self.media.relationships_xml().into_bytes())
                }
                CONTENT_TYPES_PART => Cow::Owned(self.media.content_types_xml().into_bytes()),
                _ => Cow::Borrowed(data.as_slice()),
            };
            let options = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&contents)?;
        }
        if !wrote_rels {
            zip.start_file(DOCUMENT_RELS_PART, deflated)?;
            zip.write_all(self.media.relationships_xml().as_bytes())?;
        }
        for (name, data) in self.media.parts() {
            zip.start_file(name.as_str(), stored)?;
            zip.write_all(data)?;
        }
        zip.finish()?;
        Ok(out.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn part_text<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Result<Option<&'a str>, Error> {
    entries
        .iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, data)| std::str::from_utf8(data).map_err(Error::from))
        .transpose()
}

/// Parse a WML toggle property (e.g. `w:b`, `w:i`). Present with no val or a
/// val other than "0"/"false"/"off" means true.
fn wml_bool(parent: &XmlElement, name: &str) -> Option<bool> {
    parent
        .child(WML_NS, name)
        .map(|n| n.attr("w:val").is_none_or(|v| v != "0" && v != "false" && v != "off"))
}

fn wml_attr<'a>(node: &'a XmlElement, child: &str) -> Option<&'a str> {
    node.child(WML_NS, child).and_then(|n| n.attr("w:val"))
}

/// Read the formatting record out of a raw `w:rPr`.
pub(crate) fn run_format(rpr: &XmlElement) -> RunFormat {
    let font_name = rpr.child(WML_NS, "rFonts").and_then(|fonts| {
        fonts
            .attr("w:ascii")
            .or_else(|| fonts.attr("w:hAnsi"))
            .map(String::from)
    });
    let underline = wml_attr(rpr, "u").map(|v| v != "none").or_else(|| {
        rpr.child(WML_NS, "u").map(|_| true)
    });
    RunFormat {
        font_name,
        font_size: wml_attr(rpr, "sz").and_then(|v| v.parse().ok()),
        bold: wml_bool(rpr, "b"),
        italic: wml_bool(rpr, "i"),
        underline,
        color: wml_attr(rpr, "color")
            .filter(|v| *v != "auto")
            .map(String::from),
    }
}

/// Build a `w:rPr` carrying the set fields of `format`, children in schema
/// order. Returns `None` for an empty record.
pub(crate) fn run_properties(format: &RunFormat) -> Option<XmlElement> {
    if format.is_empty() {
        return None;
    }
    let toggle = |name: &str, on: bool| {
        let el = XmlElement::new(&format!("w:{}", name), Some(WML_NS));
        if on { el } else { el.with_attr("w:val", "0") }
    };
    let mut rpr = XmlElement::new("w:rPr", Some(WML_NS));
    if let Some(name) = &format.font_name {
        rpr.push(
            XmlElement::new("w:rFonts", Some(WML_NS))
                .with_attr("w:ascii", name.as_str())
                .with_attr("w:hAnsi", name.as_str()),
        );
    }
    if let Some(bold) = format.bold {
        rpr.push(toggle("b", bold));
    }
    if let Some(italic) = format.italic {
        rpr.push(toggle("i", italic));
    }
    if let Some(color) = &format.color {
        rpr.push(XmlElement::new("w:color", Some(WML_NS)).with_attr("w:val", color.as_str()));
    }
    if let Some(size) = format.font_size {
        rpr.push(XmlElement::new("w:sz", Some(WML_NS)).with_attr("w:val", size.to_string()));
    }
    if let Some(underline) = format.underline {
        let val = if underline { "single" } else { "none" };
        rpr.push(XmlElement::new("w:u", Some(WML_NS)).with_attr("w:val", val));
    }
    Some(rpr)
}

/// Split an element into an empty shell (name and attributes) and its
/// child elements. Whitespace between block-level elements is dropped.
fn into_shell(element: XmlElement) -> (XmlElement, Vec<XmlElement>) {
    let XmlElement {
        name,
        namespace,
        attributes,
        children,
    } = element;
    let shell = XmlElement {
        name,
        namespace,
        attributes,
        children: Vec::new(),
    };
    let elements = children
        .into_iter()
        .filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
        .collect();
    (shell, elements)
}

pub(crate) fn parse_document(xml_content: &str) -> Result<Document, Error> {
    let mut root = xml::parse(xml_content)?;
    if !root.is(WML_NS, "document") {
        return Err(Error::InvalidDocx(format!(
            "unexpected root element <{}>",
            root.name
        )));
    }

    let max_drawing_id = root
        .descendants()
        .filter(|e| e.is(WPD_NS, "docPr"))
        .filter_map(|e| e.attr("id")?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    let body = root
        .child_mut(WML_NS, "body")
        .ok_or_else(|| Error::InvalidDocx("Missing w:body".into()))?;
    let children = std::mem::take(&mut body.children);
    let blocks = parse_blocks(children.into_iter().filter_map(|node| match node {
        XmlNode::Element(e) => Some(e),
        _ => None,
    }));

    Ok(Document {
        root,
        blocks,
        max_drawing_id,
    })
}

fn parse_blocks(elements: impl IntoIterator<Item = XmlElement>) -> Vec<Block> {
    elements
        .into_iter()
        .map(|el| {
            if el.is(WML_NS, "p") {
                Block::Paragraph(parse_paragraph(el))
            } else if el.is(WML_NS, "tbl") {
                Block::Table(parse_table(el))
            } else {
                Block::Other(el)
            }
        })
        .collect()
}

fn parse_table(element: XmlElement) -> Table {
    let (shell, children) = into_shell(element);
    let items = children
        .into_iter()
        .map(|el| {
            if el.is(WML_NS, "tr") {
                TableItem::Row(parse_row(el))
            } else {
                TableItem::Other(el)
            }
        })
        .collect();
    Table { shell, items }
}

fn parse_row(element: XmlElement) -> TableRow {
    let (shell, children) = into_shell(element);
    let items = children
        .into_iter()
        .map(|el| {
            if el.is(WML_NS, "tc") {
                let (shell, children) = into_shell(el);
                RowItem::Cell(TableCell {
                    shell,
                    blocks: parse_blocks(children),
                })
            } else {
                RowItem::Other(el)
            }
        })
        .collect();
    TableRow { shell, items }
}

/// Paragraph children that hold runs of their own.
const RUN_WRAPPERS: &[&str] = &["hyperlink", "ins", "smartTag", "fldSimple"];

fn parse_paragraph(element: XmlElement) -> Paragraph {
    let (shell, children) = into_shell(element);
    let mut properties = None;
    let mut items = Vec::with_capacity(children.len());
    for el in children {
        if el.is(WML_NS, "pPr") {
            properties = Some(el);
        } else {
            items.push(parse_paragraph_item(el));
        }
    }
    Paragraph {
        shell,
        properties,
        items,
    }
}

fn parse_paragraph_item(element: XmlElement) -> ParagraphItem {
    if element.is(WML_NS, "r") {
        return ParagraphItem::Run(parse_run(element));
    }
    let wraps_runs = element.namespace.as_deref() == Some(WML_NS)
        && RUN_WRAPPERS.contains(&element.local_name());
    if !wraps_runs {
        return ParagraphItem::Other(element);
    }
    let (shell, children) = into_shell(element);
    ParagraphItem::Group(RunGroup {
        shell,
        items: children.into_iter().map(parse_paragraph_item).collect(),
    })
}

fn parse_run(element: XmlElement) -> Run {
    let (shell, children) = into_shell(element);
    let mut properties = None;
    let mut content = Vec::with_capacity(children.len());
    for el in children {
        if el.namespace.as_deref() != Some(WML_NS) {
            content.push(RunContent::Other(el));
            continue;
        }
        match el.local_name() {
            "rPr" => properties = Some(el),
            "t" => content.push(RunContent::Text(el.text())),
            "tab" => content.push(RunContent::Tab),
            "br" | "cr" => content.push(RunContent::Break(el)),
            "drawing" => content.push(RunContent::Drawing(el)),
            "pict" => content.push(RunContent::Picture(el)),
            _ => content.push(RunContent::Other(el)),
        }
    }
    Run {
        shell,
        properties,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{body_document, styled_run};

    #[test]
    fn parses_body_paragraphs_and_tables() {
        let doc = body_document(&format!(
            "<w:p>{}</w:p><w:tbl><w:tblPr/><w:tr><w:tc><w:tcPr/><w:p>{}</w:p></w:tc></w:tr></w:tbl><w:sectPr/>",
            styled_run("Hello", ""),
            styled_run("Cell", "<w:b/>"),
        ));
        assert_eq!(doc.blocks.len(), 3);
        assert!(matches!(doc.blocks[2], Block::Other(_)));
        assert_eq!(doc.tables().count(), 1);
        assert_eq!(doc.text(), "Hello\nCell");
    }

    #[test]
    fn run_format_reads_optional_fields() {
        let rpr = xml::parse(&format!(
            r#"<w:rPr xmlns:w="{}"><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:b/><w:i w:val="0"/><w:color w:val="FF0000"/><w:sz w:val="28"/></w:rPr>"#,
            WML_NS
        ))
        .unwrap();
        let format = run_format(&rpr);
        assert_eq!(format.font_name.as_deref(), Some("Arial"));
        assert_eq!(format.bold, Some(true));
        assert_eq!(format.italic, Some(false));
        assert_eq!(format.color.as_deref(), Some("FF0000"));
        assert_eq!(format.font_size, Some(28));
        assert_eq!(format.underline, None);
    }

    #[test]
    fn run_properties_round_trip_through_run_format() {
        let format = RunFormat {
            font_name: Some("Calibri".into()),
            font_size: Some(22),
            bold: Some(true),
            italic: Some(false),
            underline: Some(true),
            color: Some("336699".into()),
        };
        let rpr = run_properties(&format).unwrap();
        assert_eq!(run_format(&rpr), format);
        assert!(run_properties(&RunFormat::default()).is_none());
    }

    #[test]
    fn untouched_document_serializes_identically_after_reparse() {
        let doc = body_document(&format!(
            "<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr>{}<w:bookmarkStart w:id=\"0\" w:name=\"x\"/></w:p>",
            styled_run(" spaced ", "<w:u w:val=\"single\"/>")
        ));
        let first = doc.to_xml();
        let again = Document::from_xml(&first).unwrap();
        assert_eq!(again.to_xml(), first);
        assert!(first.contains(r#"<w:t xml:space="preserve"> spaced </w:t>"#));
    }

    #[test]
    fn hyperlink_runs_are_part_of_the_paragraph() {
        let doc = body_document(&format!(
            "<w:p>{}<w:hyperlink r:id=\"rId5\" w:history=\"1\">{}</w:hyperlink><w:proofErr w:type=\"spellStart\"/></w:p>",
            styled_run("See ", ""),
            styled_run("the site", "<w:u w:val=\"single\"/>")
        ));
        let Some(Block::Paragraph(p)) = doc.blocks.first() else {
            panic!("expected a paragraph");
        };
        assert!(matches!(p.items[1], ParagraphItem::Group(_)));
        assert!(matches!(p.items[2], ParagraphItem::Other(_)));
        assert!(p.has_wrapped_runs());
        assert_eq!(p.runs().count(), 2);
        assert_eq!(doc.text(), "See the site");

        let xml = doc.to_xml();
        assert!(xml.contains(r#"<w:hyperlink r:id="rId5" w:history="1"><w:r>"#));
        assert_eq!(Document::from_xml(&xml).unwrap().to_xml(), xml);
    }

    #[test]
    fn rejects_non_document_root() {
        let err = Document::from_xml("<foo/>").unwrap_err();
        assert!(matches!(err, Error::InvalidDocx(_)));
    }
}
