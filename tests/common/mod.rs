#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

pub const WML: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Badge"><w:name w:val="Badge"/></w:style></w:styles>"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// A minimal but complete `.docx` whose body is `body`.
pub fn docx_bytes(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{WML}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#
    );
    let mut out = Cursor::new(Vec::new());
    let mut zip = zip::ZipWriter::new(&mut out);
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/styles.xml", STYLES_XML),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    out.into_inner()
}

pub fn write_docx(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, docx_bytes(body)).unwrap();
    path
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_pixel(width, height, image::Rgb([0, 128, 255]))
        .save(&path)
        .unwrap();
    path
}

pub fn entry_names(docx: &Path) -> Vec<String> {
    let file = std::fs::File::open(docx).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    zip.file_names().map(String::from).collect()
}

pub fn read_entry(docx: &Path, name: &str) -> Option<Vec<u8>> {
    let file = std::fs::File::open(docx).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    Some(data)
}

pub fn read_text_entry(docx: &Path, name: &str) -> String {
    String::from_utf8(read_entry(docx, name).unwrap_or_default()).unwrap()
}

pub fn run(text: &str, rpr: &str) -> String {
    let props = if rpr.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{rpr}</w:rPr>")
    };
    format!(r#"<w:r>{props}<w:t xml:space="preserve">{text}</w:t></w:r>"#)
}

pub fn paragraph(runs: &str) -> String {
    format!("<w:p>{runs}</w:p>")
}

/// A one-row table with one cell per entry of `cells` (each a paragraph list).
pub fn table(cells: &[String]) -> String {
    let cells: String = cells.iter().map(|c| format!("<w:tc>{c}</w:tc>")).collect();
    format!("<w:tbl><w:tblGrid/><w:tr>{cells}</w:tr></w:tbl>")
}

/// An existing inline picture; `cx` is its stored width in EMU, if any.
pub fn picture(id: u32, cx: Option<i64>) -> String {
    let extent = cx
        .map(|cx| format!(r#"<wp:extent cx="{cx}" cy="{cx}"/>"#))
        .unwrap_or_default();
    format!(
        r#"<w:r><w:drawing><wp:inline>{extent}<wp:docPr id="{id}" name="Picture {id}"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:blipFill><a:blip r:embed="rIdOld"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

/// Relationship targets of every `a:blip` in document order.
pub fn blip_targets(docx: &Path) -> Vec<String> {
    let rels_xml = read_text_entry(docx, "word/_rels/document.xml.rels");
    let rels = roxmltree::Document::parse(&rels_xml).unwrap();
    let document_xml = read_text_entry(docx, "word/document.xml");
    let doc = roxmltree::Document::parse(&document_xml).unwrap();
    doc.descendants()
        .filter(|n| n.tag_name().name() == "blip")
        .filter_map(|blip| {
            let id = blip.attributes().find(|a| a.name() == "embed")?.value();
            let target = rels
                .descendants()
                .find(|r| r.attribute("Id") == Some(id))
                .and_then(|r| r.attribute("Target"))
                .unwrap_or("<dangling>");
            Some(target.to_string())
        })
        .collect()
}

/// `wp:extent/@cx` of every drawing in document order.
pub fn extents(docx: &Path) -> Vec<i64> {
    let document_xml = read_text_entry(docx, "word/document.xml");
    let doc = roxmltree::Document::parse(&document_xml).unwrap();
    doc.descendants()
        .filter(|n| n.tag_name().name() == "extent")
        .filter_map(|n| n.attribute("cx")?.parse().ok())
        .collect()
}

pub fn document_text(docx: &Path) -> String {
    docxide_merge::Package::open(docx).unwrap().document().text()
}
