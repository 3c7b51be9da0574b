use crate::docx::WML_NS;
use crate::error::Error;
use crate::xml::XmlElement;

pub const EMU_PER_INCH: i64 = 914_400;
pub const EMU_PER_POINT: i64 = 12_700;

/// Physical length stored in English Metric Units, the unit DrawingML uses
/// for `wp:extent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Length(i64);

impl Length {
    pub const fn emu(emu: i64) -> Self {
        Self(emu)
    }

    pub fn inches(inches: f64) -> Self {
        Self((inches * EMU_PER_INCH as f64).round() as i64)
    }

    pub fn points(points: f64) -> Self {
        Self((points * EMU_PER_POINT as f64).round() as i64)
    }

    pub fn as_emu(self) -> i64 {
        self.0
    }

    pub fn as_inches(self) -> f64 {
        self.0 as f64 / EMU_PER_INCH as f64
    }
}

/// Character formatting that survives a splice. Every field is optional:
/// `None` means the run does not set it and inherits from its style.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunFormat {
    pub font_name: Option<String>,
    /// Half-points, as stored in `w:sz`.
    pub font_size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    /// Hex RGB as stored in `w:color`, e.g. `FF0000`.
    pub color: Option<String>,
}

impl RunFormat {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every field that `source` sets; fields it leaves unset are kept.
    pub fn inherit(&mut self, source: &RunFormat) {
        if source.font_name.is_some() {
            self.font_name.clone_from(&source.font_name);
        }
        if source.font_size.is_some() {
            self.font_size = source.font_size;
        }
        if source.bold.is_some() {
            self.bold = source.bold;
        }
        if source.italic.is_some() {
            self.italic = source.italic;
        }
        if source.underline.is_some() {
            self.underline = source.underline;
        }
        if source.color.is_some() {
            self.color.clone_from(&source.color);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunContent {
    Text(String),
    Tab,
    /// `w:br` or `w:cr`, kept as written so page breaks keep their type.
    Break(XmlElement),
    Drawing(XmlElement),
    /// Legacy VML picture (`w:pict`).
    Picture(XmlElement),
    Other(XmlElement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub(crate) shell: XmlElement,
    /// Raw `w:rPr`; written back untouched unless the run is rebuilt.
    pub(crate) properties: Option<XmlElement>,
    pub content: Vec<RunContent>,
}

impl Default for Run {
    fn default() -> Self {
        Self::new()
    }
}

impl Run {
    pub fn new() -> Self {
        Self {
            shell: XmlElement::new("w:r", Some(WML_NS)),
            properties: None,
            content: Vec::new(),
        }
    }

    pub fn with_format(format: &RunFormat) -> Self {
        let mut run = Self::new();
        run.properties = crate::docx::run_properties(format);
        run
    }

    pub fn with_text(text: &str, format: &RunFormat) -> Self {
        let mut run = Self::with_format(format);
        run.set_text(text);
        run
    }

    pub fn properties(&self) -> Option<&XmlElement> {
        self.properties.as_ref()
    }

    pub fn format(&self) -> RunFormat {
        self.properties
            .as_ref()
            .map(crate::docx::run_format)
            .unwrap_or_default()
    }

    /// Plain-text view: tabs as `\t`, line breaks as `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Tab => out.push('\t'),
                RunContent::Break(br) => {
                    if matches!(br.attr("w:type"), None | Some("textWrapping")) {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Replace the run's content with `text`, keeping its properties. Tabs
    /// become `w:tab`, line breaks become `w:br`. Control characters that
    /// XML 1.0 forbids are dropped.
    pub fn set_text(&mut self, text: &str) {
        self.content.clear();
        let text = text.replace("\r\n", "\n");
        let mut pending = String::new();
        for ch in text.chars() {
            let item = match ch {
                '\t' => RunContent::Tab,
                '\n' | '\r' => RunContent::Break(XmlElement::new("w:br", Some(WML_NS))),
                c if !crate::xml::is_xml_char(c) => {
                    log::debug!("Dropping U+{:04X}, which XML cannot carry", c as u32);
                    continue;
                }
                c => {
                    pending.push(c);
                    continue;
                }
            };
            if !pending.is_empty() {
                self.content.push(RunContent::Text(std::mem::take(&mut pending)));
            }
            self.content.push(item);
        }
        if !pending.is_empty() {
            self.content.push(RunContent::Text(pending));
        }
    }

    /// True for runs holding an embedded picture (DrawingML blip or VML).
    pub fn is_image(&self) -> bool {
        self.content.iter().any(|item| match item {
            RunContent::Picture(_) => true,
            RunContent::Drawing(e) | RunContent::Other(e) => e
                .descendants()
                .any(|d| d.is(crate::docx::DML_NS, "blip")),
            _ => false,
        })
    }

    /// Display width stored in the first `wp:extent` of the run, if any.
    pub fn image_width(&self) -> Option<Length> {
        self.content.iter().find_map(|item| match item {
            RunContent::Drawing(e) | RunContent::Other(e) => e
                .descendants()
                .filter(|d| d.is(crate::docx::WPD_NS, "extent"))
                .filter_map(|d| d.attr("cx")?.parse::<i64>().ok())
                .find(|cx| *cx > 0)
                .map(Length::emu),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParagraphItem {
    Run(Run),
    /// Hyperlink, tracked insertion or similar wrapper around runs.
    Group(RunGroup),
    /// Bookmarks, proofing marks and anything else kept verbatim.
    Other(XmlElement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunGroup {
    pub(crate) shell: XmlElement,
    pub items: Vec<ParagraphItem>,
}

fn collect_runs<'a>(items: &'a [ParagraphItem], out: &mut Vec<&'a Run>) {
    for item in items {
        match item {
            ParagraphItem::Run(r) => out.push(r),
            ParagraphItem::Group(g) => collect_runs(&g.items, out),
            ParagraphItem::Other(_) => {}
        }
    }
}

fn collect_runs_mut<'a>(items: &'a mut [ParagraphItem], out: &mut Vec<&'a mut Run>) {
    for item in items {
        match item {
            ParagraphItem::Run(r) => out.push(r),
            ParagraphItem::Group(g) => collect_runs_mut(&mut g.items, out),
            ParagraphItem::Other(_) => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub(crate) shell: XmlElement,
    pub(crate) properties: Option<XmlElement>,
    pub items: Vec<ParagraphItem>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self {
            shell: XmlElement::new("w:p", Some(WML_NS)),
            properties: None,
            items: Vec::new(),
        }
    }

    pub fn properties(&self) -> Option<&XmlElement> {
        self.properties.as_ref()
    }

    pub fn set_properties(&mut self, properties: Option<XmlElement>) {
        self.properties = properties;
    }

    /// Paragraph style id from `w:pPr/w:pStyle`.
    pub fn style(&self) -> Option<&str> {
        self.properties
            .as_ref()?
            .child(WML_NS, "pStyle")?
            .attr("w:val")
    }

    /// Every run in document order, including runs inside hyperlinks and
    /// other wrappers.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        let mut runs = Vec::new();
        collect_runs(&self.items, &mut runs);
        runs.into_iter()
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        let mut runs = Vec::new();
        collect_runs_mut(&mut self.items, &mut runs);
        runs.into_iter()
    }

    /// True when some runs sit inside a hyperlink or another wrapper.
    pub fn has_wrapped_runs(&self) -> bool {
        self.items.iter().any(|item| match item {
            ParagraphItem::Group(g) => {
                let mut runs = Vec::new();
                collect_runs(&g.items, &mut runs);
                !runs.is_empty()
            }
            _ => false,
        })
    }

    /// Visible text of all runs, wrapped ones included.
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    pub fn push_run(&mut self, run: Run) {
        self.items.push(ParagraphItem::Run(run));
    }

    /// Remove all direct runs, keeping properties and non-run items.
    pub fn clear_runs(&mut self) {
        self.items
            .retain(|item| !matches!(item, ParagraphItem::Run(_)));
    }

    /// Remove all content, keeping only paragraph properties.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub(crate) shell: XmlElement,
    /// Cell content; `w:tcPr` is kept as a leading `Block::Other`.
    pub blocks: Vec<Block>,
}

impl TableCell {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RowItem {
    Cell(TableCell),
    Other(XmlElement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub(crate) shell: XmlElement,
    pub items: Vec<RowItem>,
}

impl TableRow {
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.items.iter().filter_map(|item| match item {
            RowItem::Cell(c) => Some(c),
            RowItem::Other(_) => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.items.iter_mut().filter_map(|item| match item {
            RowItem::Cell(c) => Some(c),
            RowItem::Other(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableItem {
    Row(TableRow),
    /// `w:tblPr`, `w:tblGrid` and other non-row children.
    Other(XmlElement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub(crate) shell: XmlElement,
    pub items: Vec<TableItem>,
}

impl Table {
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.items.iter().filter_map(|item| match item {
            TableItem::Row(r) => Some(r),
            TableItem::Other(_) => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut TableRow> {
        self.items.iter_mut().filter_map(|item| match item {
            TableItem::Row(r) => Some(r),
            TableItem::Other(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Section properties, content controls and other body-level elements.
    Other(XmlElement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// `w:document` with an empty `w:body`; blocks are spliced back on write.
    pub(crate) root: XmlElement,
    pub blocks: Vec<Block>,
    pub(crate) max_drawing_id: u32,
}

impl Document {
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        crate::docx::parse_document(xml)
    }

    pub fn to_xml(&self) -> String {
        crate::docx::write_document(self)
    }

    /// Highest `wp:docPr/@id` seen when the document was parsed.
    pub fn max_drawing_id(&self) -> u32 {
        self.max_drawing_id
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Visit every paragraph in document order, descending into table cells
    /// (and tables nested inside cells).
    pub fn visit_paragraphs<F: FnMut(&Paragraph)>(&self, mut f: F) {
        walk_paragraphs(&self.blocks, &mut f);
    }

    pub fn visit_paragraphs_mut<F: FnMut(&mut Paragraph)>(&mut self, mut f: F) {
        walk_paragraphs_mut(&mut self.blocks, &mut f);
    }

    /// Visit every table cell in document order. A cell is visited before
    /// the cells of tables nested inside it.
    pub fn visit_cells_mut<F: FnMut(&mut TableCell)>(&mut self, mut f: F) {
        walk_cells_mut(&mut self.blocks, &mut f);
    }

    /// Paragraph texts joined with newlines.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        self.visit_paragraphs(|p| lines.push(p.text()));
        lines.join("\n")
    }
}

fn walk_paragraphs<F: FnMut(&Paragraph)>(blocks: &[Block], f: &mut F) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for row in table.rows() {
                    for cell in row.cells() {
                        walk_paragraphs(&cell.blocks, f);
                    }
                }
            }
            Block::Other(_) => {}
        }
    }
}

fn walk_paragraphs_mut<F: FnMut(&mut Paragraph)>(blocks: &mut [Block], f: &mut F) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for row in table.rows_mut() {
                    for cell in row.cells_mut() {
                        walk_paragraphs_mut(&mut cell.blocks, f);
                    }
                }
            }
            Block::Other(_) => {}
        }
    }
}

fn walk_cells_mut<F: FnMut(&mut TableCell)>(blocks: &mut [Block], f: &mut F) {
    for block in blocks {
        if let Block::Table(table) = block {
            for row in table.rows_mut() {
                for cell in row.cells_mut() {
                    f(cell);
                    walk_cells_mut(&mut cell.blocks, f);
                }
            }
        }
    }
}
