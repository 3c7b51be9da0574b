use crate::model::{
    Block, Document, Paragraph, ParagraphItem, RowItem, Run, RunContent, Table, TableItem,
};
use crate::xml::{XmlElement, XmlNode};

use super::WML_NS;

pub(crate) fn write_document(doc: &Document) -> String {
    let mut root = doc.root.clone();
    if let Some(body) = root.child_mut(WML_NS, "body") {
        body.children = doc
            .blocks
            .iter()
            .map(|b| XmlNode::Element(block_element(b)))
            .collect();
    }
    root.to_document_string()
}

fn block_element(block: &Block) -> XmlElement {
    match block {
        Block::Paragraph(p) => paragraph_element(p),
        Block::Table(t) => table_element(t),
        Block::Other(e) => e.clone(),
    }
}

fn table_element(table: &Table) -> XmlElement {
    let mut tbl = table.shell.clone();
    for item in &table.items {
        match item {
            TableItem::Other(e) => tbl.push(e.clone()),
            TableItem::Row(row) => {
                let mut tr = row.shell.clone();
                for item in &row.items {
                    match item {
                        RowItem::Other(e) => tr.push(e.clone()),
                        RowItem::Cell(cell) => {
                            let mut tc = cell.shell.clone();
                            for block in &cell.blocks {
                                tc.push(block_element(block));
                            }
                            // A cell must end with a paragraph to be valid WML.
                            if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
                                tc.push(XmlElement::new("w:p", Some(WML_NS)));
                            }
                            tr.push(tc);
                        }
                    }
                }
                tbl.push(tr);
            }
        }
    }
    tbl
}

fn paragraph_element(paragraph: &Paragraph) -> XmlElement {
    let mut p = paragraph.shell.clone();
    if let Some(ppr) = &paragraph.properties {
        p.push(ppr.clone());
    }
    for item in &paragraph.items {
        p.push(item_element(item));
    }
    p
}

fn item_element(item: &ParagraphItem) -> XmlElement {
    match item {
        ParagraphItem::Run(run) => run_element(run),
        ParagraphItem::Group(group) => {
            let mut el = group.shell.clone();
            for item in &group.items {
                el.push(item_element(item));
            }
            el
        }
        ParagraphItem::Other(e) => e.clone(),
    }
}

fn run_element(run: &Run) -> XmlElement {
    let mut r = run.shell.clone();
    if let Some(rpr) = &run.properties {
        r.push(rpr.clone());
    }
    for item in &run.content {
        match item {
            RunContent::Text(text) => {
                let mut t = XmlElement::new("w:t", Some(WML_NS));
                if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                    t.set_attr("xml:space", "preserve");
                }
                t.children.push(XmlNode::Text(text.clone()));
                r.push(t);
            }
            RunContent::Tab => r.push(XmlElement::new("w:tab", Some(WML_NS))),
            RunContent::Break(e)
            | RunContent::Drawing(e)
            | RunContent::Picture(e)
            | RunContent::Other(e) => r.push(e.clone()),
        }
    }
    r
}
