use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{Length, Run, RunContent};
use crate::xml::{self, XmlElement};

use super::{CONTENT_TYPES_NS, PKG_REL_NS};

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// An image part added to the package, ready to be referenced by drawings.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedImage {
    pub rel_id: String,
    /// ZIP entry name, e.g. `word/media/image3.png`.
    pub part_name: String,
    pub file_name: String,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl EmbeddedImage {
    /// Display height for `width`, keeping the pixel aspect ratio.
    pub fn height_for(&self, width: Length) -> Length {
        if self.pixel_width == 0 {
            return width;
        }
        let emu = width.as_emu() as i128 * self.pixel_height as i128 / self.pixel_width as i128;
        Length::emu(emu as i64)
    }
}

/// Media registry of a package: relationships of the document part, the
/// content-type table and the image parts added during this session.
pub struct Media {
    relationships: XmlElement,
    content_types: XmlElement,
    parts: Vec<(String, Vec<u8>)>,
    taken: HashSet<String>,
    embedded: HashMap<PathBuf, EmbeddedImage>,
    next_drawing_id: u32,
}

impl Media {
    pub(crate) fn new(
        relationships: XmlElement,
        content_types: XmlElement,
        taken: HashSet<String>,
        max_drawing_id: u32,
    ) -> Self {
        Self {
            relationships,
            content_types,
            parts: Vec::new(),
            taken,
            embedded: HashMap::new(),
            next_drawing_id: max_drawing_id + 1,
        }
    }

    pub fn parts(&self) -> &[(String, Vec<u8>)] {
        &self.parts
    }

    pub(crate) fn relationships_xml(&self) -> String {
        self.relationships.to_document_string()
    }

    pub(crate) fn content_types_xml(&self) -> String {
        self.content_types.to_document_string()
    }

    /// Add the image at `path` to the package. Embedding the same file twice
    /// reuses the first part.
    pub fn embed(&mut self, path: &Path) -> Result<EmbeddedImage, Error> {
        if let Some(image) = self.embedded.get(path) {
            return Ok(image.clone());
        }
        if !path.is_file() {
            return Err(Error::MissingResource(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        let format = image::guess_format(&data)?;
        let (pixel_width, pixel_height) =
            image::ImageReader::with_format(Cursor::new(&data), format).into_dimensions()?;

        let extension = format.extensions_str().first().copied().unwrap_or("bin");
        let part_name = self.next_part_name(extension);
        let target = part_name.strip_prefix("word/").unwrap_or(&part_name);
        let rel_id = self.add_relationship(IMAGE_REL_TYPE, target);
        self.ensure_default_content_type(extension, format.to_mime_type());

        let image = EmbeddedImage {
            rel_id,
            part_name: part_name.clone(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            pixel_width,
            pixel_height,
        };
        log::debug!(
            "Embedded {} as {} ({}x{} px, {})",
            path.display(),
            part_name,
            pixel_width,
            pixel_height,
            image.rel_id
        );
        self.taken.insert(part_name.clone());
        self.parts.push((part_name, data));
        self.embedded.insert(path.to_path_buf(), image.clone());
        Ok(image)
    }

    /// A new run holding `image` as an inline picture `width` wide.
    pub fn image_run(&mut self, image: &EmbeddedImage, width: Length) -> Run {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        let mut run = Run::new();
        run.content
            .push(RunContent::Drawing(inline_drawing(image, width, id)));
        run
    }

    fn next_part_name(&self, extension: &str) -> String {
        (1..)
            .map(|n| format!("word/media/image{}.{}", n, extension))
            .find(|name| !self.taken.contains(name))
            .unwrap_or_default()
    }

    fn add_relationship(&mut self, rel_type: &str, target: &str) -> String {
        let used: HashSet<&str> = self
            .relationships
            .child_elements()
            .filter_map(|r| r.attr("Id"))
            .collect();
        let next = used
            .iter()
            .filter_map(|id| id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = (next..)
            .map(|n| format!("rId{}", n))
            .find(|id| !used.contains(id.as_str()))
            .unwrap_or_default();
        self.relationships.push(
            XmlElement::new("Relationship", Some(PKG_REL_NS))
                .with_attr("Id", id.as_str())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        );
        id
    }

    fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) {
        let present = self.content_types.child_elements().any(|e| {
            e.local_name() == "Default"
                && e.attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if present {
            return;
        }
        // Defaults must precede Overrides in [Content_Types].xml.
        let default = XmlElement::new("Default", Some(CONTENT_TYPES_NS))
            .with_attr("Extension", extension)
            .with_attr("ContentType", content_type);
        let position = self
            .content_types
            .children
            .iter()
            .position(|n| matches!(n, xml::XmlNode::Element(e) if e.local_name() == "Override"))
            .unwrap_or(self.content_types.children.len());
        self.content_types
            .children
            .insert(position, xml::XmlNode::Element(default));
    }
}

fn inline_drawing(image: &EmbeddedImage, width: Length, id: u32) -> XmlElement {
    let cx = width.as_emu();
    let cy = image.height_for(width).as_emu();
    let name = xml::escape(&image.file_name);
    let fragment = format!(
        r#"<w:drawing xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}" descr="{name}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
        rel = image.rel_id,
    );
    let mut drawing = match xml::parse(&fragment) {
        Ok(el) => el,
        // The fragment is generated from escaped values and always parses.
        Err(_) => XmlElement::new("w:drawing", Some(super::WML_NS)),
    };
    // `w` is already bound by the enclosing document.
    drawing.attributes.retain(|(k, _)| k != "xmlns:w");
    drawing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_media() -> Media {
        let rels = xml::parse(&format!(
            r#"<Relationships xmlns="{}"><Relationship Id="rId1" Type="x" Target="styles.xml"/><Relationship Id="rId7" Type="x" Target="theme.xml"/></Relationships>"#,
            PKG_REL_NS
        ))
        .unwrap();
        let types = xml::parse(&format!(
            r#"<Types xmlns="{}"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="x"/></Types>"#,
            CONTENT_TYPES_NS
        ))
        .unwrap();
        let taken = HashSet::from(["word/media/image1.png".to_string()]);
        Media::new(rels, types, taken, 4)
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(w, h).save(&path).unwrap();
        path
    }

    #[test]
    fn embed_registers_part_relationship_and_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), "photo.png", 40, 20);
        let mut media = empty_media();

        let image = media.embed(&png).unwrap();
        assert_eq!(image.rel_id, "rId8");
        assert_eq!(image.part_name, "word/media/image2.png");
        assert_eq!((image.pixel_width, image.pixel_height), (40, 20));

        let rels = media.relationships_xml();
        assert!(rels.contains(r#"Id="rId8""#));
        assert!(rels.contains(r#"Target="media/image2.png""#));
        let types = media.content_types_xml();
        let default_at = types.find(r#"Extension="png""#).unwrap();
        assert!(default_at < types.find("Override").unwrap());

        let again = media.embed(&png).unwrap();
        assert_eq!(again, image);
        assert_eq!(media.parts().len(), 1);
    }

    #[test]
    fn missing_image_is_a_missing_resource() {
        let mut media = empty_media();
        let err = media.embed(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, Error::MissingResource(_)));
    }

    #[test]
    fn image_run_scales_height_and_numbers_drawings() {
        let image = EmbeddedImage {
            rel_id: "rId3".into(),
            part_name: "word/media/image1.png".into(),
            file_name: "a&b.png".into(),
            pixel_width: 200,
            pixel_height: 100,
        };
        let mut media = empty_media();
        let first = media.image_run(&image, Length::inches(2.0));
        let second = media.image_run(&image, Length::inches(2.0));
        assert!(first.is_image());
        assert_eq!(first.image_width(), Some(Length::inches(2.0)));

        let RunContent::Drawing(drawing) = &first.content[0] else {
            panic!("expected drawing");
        };
        let extent = drawing
            .descendants()
            .find(|e| e.local_name() == "extent")
            .unwrap();
        assert_eq!(extent.attr("cy"), Some("914400"));
        let doc_pr = |run: &Run| match &run.content[0] {
            RunContent::Drawing(d) => d
                .descendants()
                .find(|e| e.local_name() == "docPr")
                .and_then(|e| e.attr("id").map(String::from)),
            _ => None,
        };
        assert_eq!(doc_pr(&first).as_deref(), Some("5"));
        assert_eq!(doc_pr(&second).as_deref(), Some("6"));
    }
}
