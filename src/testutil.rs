use crate::docx::WML_NS;
use crate::model::Document;

pub(crate) fn body_document(body: &str) -> Document {
    Document::from_xml(&format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}</w:body></w:document>"#,
        WML_NS, body
    ))
    .expect("test document parses")
}

pub(crate) fn styled_run(text: &str, rpr: &str) -> String {
    let props = if rpr.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", rpr)
    };
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        props, text
    )
}

pub(crate) fn cell(paragraphs: &str) -> String {
    format!("<w:tc><w:tcPr><w:tcW w:w=\"2000\" w:type=\"dxa\"/></w:tcPr>{}</w:tc>", paragraphs)
}

pub(crate) fn image_run(cx: Option<i64>) -> String {
    let extent = cx
        .map(|cx| format!(r#"<wp:extent cx="{}" cy="{}"/>"#, cx, cx))
        .unwrap_or_default();
    format!(
        r#"<w:r><w:drawing><wp:inline>{}<wp:docPr id="1" name="Picture 1"/><a:graphic><a:graphicData><a:blip r:embed="rId9"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        extent
    )
}
