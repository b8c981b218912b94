mod chart;
mod images;
mod layout;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Error;
use crate::fonts::{FontStyle, StandardFonts, substitute_diacritics};
use crate::i18n::{Language, t};
use crate::matrix::{
    self, LayerDef, LayerVariant, MatrixDefinition, PrimaryDef, element_name, layer_variant,
    source_cell_name,
};
use crate::model::{
    Comment, CommentMap, ImageAttachment, MAX_RATING, ReportContext, SOURCE_PRIMARY_ID,
    SOURCE_SUB_CELLS, Source, has_content, source_cell_id,
};

pub use chart::{MAX_PNG_SIZE, rasterize_png};
use layout::{show_text, truncate_chars, wrap_text};

const MM: f32 = 72.0 / 25.4;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 20.0 * MM;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Lowest offset (from the top edge) body content may reach.
pub const PRINTABLE_BOTTOM: f32 = PAGE_HEIGHT - MARGIN;
pub const PAIR_CHART_SIZE: f32 = 70.0 * MM;
pub const SINGLE_CHART_SIZE: f32 = 100.0 * MM;
pub const IMAGE_MAX_HEIGHT: f32 = 80.0 * MM;

const INDENT_STEP: f32 = 5.0 * MM;
const BLOCK_GAP: f32 = 4.0 * MM;
const IMAGE_CAPTION_GAP: f32 = 2.0;
const HEADING_GAP: f32 = 2.0;
const LAYER_RULE_GAP: f32 = 2.0 * MM;
const RUNNING_HEADER_TOP: f32 = 10.0 * MM;
const FOOTER_RULE_Y: f32 = PAGE_HEIGHT - 15.0 * MM;
const FOOTER_TEXT_Y: f32 = PAGE_HEIGHT - 10.0 * MM;
const FOOTER_TITLE_CHARS: usize = 60;
const FOOTER_AUTHOR_CHARS: usize = 30;
const TITLE_PAGE_MAX_LINES: usize = 6;

#[derive(Clone, Copy)]
struct TextStyle {
    font: FontStyle,
    size: f32,
    color: [f32; 3],
}

const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const GREY: [f32; 3] = [0.4, 0.4, 0.4];

const TITLE_PAGE: TextStyle = TextStyle { font: FontStyle::Bold, size: 24.0, color: BLACK };
const TITLE_PAGE_INFO: TextStyle = TextStyle { font: FontStyle::Regular, size: 12.0, color: BLACK };
const HEADER_TITLE: TextStyle = TextStyle { font: FontStyle::Bold, size: 16.0, color: BLACK };
const HEADER_INFO: TextStyle = TextStyle { font: FontStyle::Regular, size: 9.0, color: GREY };
const RUNNING: TextStyle = TextStyle { font: FontStyle::Regular, size: 8.0, color: GREY };
const LAYER: TextStyle = TextStyle { font: FontStyle::Bold, size: 14.0, color: [0.1, 0.2, 0.45] };
const PRIMARY: TextStyle = TextStyle { font: FontStyle::Bold, size: 12.0, color: BLACK };
const SOURCE_TITLE: TextStyle = TextStyle { font: FontStyle::Bold, size: 11.0, color: BLACK };
const CELL_HEADER: TextStyle = TextStyle { font: FontStyle::Bold, size: 10.0, color: BLACK };
const BODY: TextStyle = TextStyle { font: FontStyle::Regular, size: 10.0, color: BLACK };
const CAPTION: TextStyle = TextStyle { font: FontStyle::Italic, size: 8.0, color: GREY };
const ERROR_LINE: TextStyle = TextStyle { font: FontStyle::Italic, size: 9.0, color: [0.75, 0.1, 0.1] };
const FOOTER: TextStyle = TextStyle { font: FontStyle::Regular, size: 8.0, color: GREY };

fn line_height(size: f32) -> f32 {
    size * 1.35
}

/// What a placed block shows. Recorded for every atomic unit the report draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    TitlePage,
    Header,
    RunningHeader,
    LayerHeader,
    PrimaryHeader,
    SourceTitle,
    CellHeader,
    Rating,
    Title,
    Content,
    Image,
    ImageCaption,
    ImageError,
    Chart,
    Footer,
}

impl BlockKind {
    /// Header, footer and title-page blocks sit outside the body area.
    pub fn is_body(self) -> bool {
        !matches!(
            self,
            BlockKind::TitlePage | BlockKind::RunningHeader | BlockKind::Footer
        )
    }
}

/// One atomic unit drawn into the document. Offsets are in points from the top
/// edge of page `page` (0-based).
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedBlock {
    pub page: usize,
    pub kind: BlockKind,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    /// Text as it appears in the document (after diacritic substitution).
    pub text: String,
}

pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    pub blocks: Vec<PlacedBlock>,
}

impl RenderedReport {
    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }

    /// Write the PDF into `dir` under [`RenderedReport::filename`].
    pub fn save(&self, dir: &Path) -> Result<PathBuf, Error> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// `slug(title)_{millis}.pdf`, or a generic name when there is no title.
pub fn report_filename(title: Option<&str>, generated_at: &DateTime<Local>) -> String {
    let stamp = generated_at.timestamp_millis();
    match title.map(str::trim).filter(|s| !s.is_empty()) {
        Some(title) => {
            let slug: String = substitute_diacritics(title)
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_lowercase()
                    } else {
                        '_'
                    }
                })
                .collect();
            format!("{slug}_{stamp}.pdf")
        }
        None => format!("credibility_report_{stamp}.pdf"),
    }
}

struct RunningHeader {
    title: String,
    author: Option<String>,
    date: String,
}

struct CellLabel {
    id: String,
    name: String,
    /// Element id whose 0–5 scale describes the rating.
    scale_id: String,
}

struct DocumentBuilder {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: StandardFonts,
    lang: Language,
    header: RunningHeader,
    all_contents: Vec<Content>,
    current_content: Content,
    image_xobjects: Vec<(String, Ref)>,
    blocks: Vec<PlacedBlock>,
}

impl DocumentBuilder {
    fn new(lang: Language, header: RunningHeader) -> Self {
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let fonts = StandardFonts::register(&mut pdf, &mut alloc);

        Self {
            pdf,
            next_id,
            catalog_id,
            pages_id,
            fonts,
            lang,
            header,
            all_contents: Vec::new(),
            current_content: Content::new(),
            image_xobjects: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    fn page_index(&self) -> usize {
        self.all_contents.len()
    }

    fn new_page(&mut self) {
        self.all_contents
            .push(std::mem::replace(&mut self.current_content, Content::new()));
    }

    fn place(&mut self, kind: BlockKind, top: f32, left: f32, width: f32, height: f32, text: &str) {
        self.blocks.push(PlacedBlock {
            page: self.page_index(),
            kind,
            top,
            left,
            width,
            height,
            text: substitute_diacritics(text),
        });
    }

    fn text_width(&self, style: TextStyle, text: &str) -> f32 {
        self.fonts.get(style.font).word_width(text, style.size)
    }

    /// Draw one line with its top at `top` (offset from the top edge). No
    /// pagination check.
    fn draw_line(&mut self, kind: BlockKind, style: TextStyle, x: f32, top: f32, text: &str) {
        let width = self.text_width(style, text);
        let content = &mut self.current_content;
        content.save_state();
        content.set_fill_rgb(style.color[0], style.color[1], style.color[2]);
        show_text(
            content,
            self.fonts.get(style.font),
            style.size,
            x,
            PAGE_HEIGHT - top - style.size,
            text,
        );
        content.restore_state();
        self.place(kind, top, x, width, line_height(style.size), text);
    }

    fn draw_centered(&mut self, kind: BlockKind, style: TextStyle, top: f32, text: &str) {
        let x = (PAGE_WIDTH - self.text_width(style, text)) / 2.0;
        self.draw_line(kind, style, x.max(MARGIN), top, text);
    }

    fn rule(&mut self, top: f32, x1: f32, x2: f32, width: f32) {
        let content = &mut self.current_content;
        content.save_state();
        content.set_stroke_rgb(0.6, 0.6, 0.6);
        content.set_line_width(width);
        content.move_to(x1, PAGE_HEIGHT - top);
        content.line_to(x2, PAGE_HEIGHT - top);
        content.stroke();
        content.restore_state();
    }

    /// Pagination cursor. When a block of `required` height would cross the
    /// printable bottom, start a new page with the running header and return the
    /// offset below it; otherwise return `y` unchanged.
    fn check_page_break(&mut self, y: f32, required: f32) -> f32 {
        if y + required > PRINTABLE_BOTTOM {
            self.new_page();
            self.draw_running_header()
        } else {
            y
        }
    }

    /// Wrapped text, one pagination check per line.
    fn paragraph(&mut self, y: f32, kind: BlockKind, style: TextStyle, indent: f32, text: &str) -> f32 {
        let lines = wrap_text(
            text,
            self.fonts.get(style.font),
            style.size,
            CONTENT_WIDTH - indent,
        );
        let lh = line_height(style.size);
        let mut y = y;
        for line in lines {
            y = self.check_page_break(y, lh);
            self.draw_line(kind, style, MARGIN + indent, y, &line.text);
            y += lh;
        }
        y
    }

    fn draw_running_header(&mut self) -> f32 {
        let top = RUNNING_HEADER_TOP;
        let title = truncate_chars(&self.header.title, FOOTER_TITLE_CHARS);
        let author = self.header.author.clone();
        let date = self.header.date.clone();

        self.draw_line(BlockKind::RunningHeader, RUNNING, MARGIN, top, &title);
        if let Some(author) = author {
            self.draw_centered(BlockKind::RunningHeader, RUNNING, top, &author);
        }
        let date_x = PAGE_WIDTH - MARGIN - self.text_width(RUNNING, &date);
        self.draw_line(BlockKind::RunningHeader, RUNNING, date_x, top, &date);
        self.rule(top + line_height(RUNNING.size) + 2.0, MARGIN, PAGE_WIDTH - MARGIN, 0.5);
        MARGIN
    }

    /// Full header of the first body page.
    fn draw_standard_header(&mut self, ctx: &ReportContext) -> f32 {
        let lang = self.lang;
        let mut y = self.paragraph(
            MARGIN,
            BlockKind::Header,
            HEADER_TITLE,
            0.0,
            t(lang, "report.defaultTitle"),
        );
        y += 2.0;
        if let Some(title) = ctx.title() {
            let line = format!("{}: {title}", t(lang, "report.reportTitle"));
            y = self.paragraph(y, BlockKind::Header, HEADER_INFO, 0.0, &line);
        }
        if let Some(author) = ctx.author() {
            let line = format!("{}: {author}", t(lang, "report.author"));
            y = self.paragraph(y, BlockKind::Header, HEADER_INFO, 0.0, &line);
        }
        let lines = [
            format!("{}: {}", t(lang, "report.generatedAt"), self.header.date),
            format!("{}: {}", t(lang, "report.commentCount"), ctx.comment_count()),
            format!("{}: {}", t(lang, "report.sourceCount"), ctx.sources.len()),
        ];
        for line in &lines {
            y = self.paragraph(y, BlockKind::Header, HEADER_INFO, 0.0, line);
        }
        y += 3.0;
        self.rule(y, MARGIN, PAGE_WIDTH - MARGIN, 0.8);
        y + 6.0 * MM
    }

    fn draw_title_page(&mut self, ctx: &ReportContext, title: &str, author: &str) {
        let lang = self.lang;
        let mut y = PAGE_HEIGHT * 0.3;
        let lh = line_height(TITLE_PAGE.size);
        let mut lines = wrap_text(
            title,
            self.fonts.get(TITLE_PAGE.font),
            TITLE_PAGE.size,
            CONTENT_WIDTH,
        );
        if lines.len() > TITLE_PAGE_MAX_LINES {
            lines.truncate(TITLE_PAGE_MAX_LINES);
            if let Some(last) = lines.last_mut() {
                last.text = format!("{}...", last.text);
                last.width = self.text_width(TITLE_PAGE, &last.text);
            }
        }
        for line in &lines {
            let x = ((PAGE_WIDTH - line.width) / 2.0).max(MARGIN);
            self.draw_line(BlockKind::TitlePage, TITLE_PAGE, x, y, &line.text);
            y += lh;
        }

        y += 4.0 * MM;
        let rule_w = CONTENT_WIDTH / 3.0;
        self.rule(y, (PAGE_WIDTH - rule_w) / 2.0, (PAGE_WIDTH + rule_w) / 2.0, 1.0);
        y += 8.0 * MM;

        let info = [
            format!("{}: {author}", t(lang, "report.author")),
            format!("{}: {}", t(lang, "report.generatedAt"), self.header.date),
            format!("{}: {}", t(lang, "report.commentCount"), ctx.comment_count()),
            format!("{}: {}", t(lang, "report.sourceCount"), ctx.sources.len()),
        ];
        for line in &info {
            self.draw_centered(BlockKind::TitlePage, TITLE_PAGE_INFO, y, line);
            y += line_height(TITLE_PAGE_INFO.size) + 2.0;
        }
    }

    fn embed_image(&mut self, attachment: &ImageAttachment) -> Result<(String, u32, u32), images::EmbedError> {
        let prepared = images::prepare(attachment)?;
        let xobj_ref = self.alloc();
        let mask_ref = prepared.has_alpha().then(|| self.alloc());
        images::write_xobject(&mut self.pdf, xobj_ref, mask_ref, &prepared);

        let pdf_name = format!("Im{}", self.image_xobjects.len() + 1);
        self.image_xobjects.push((pdf_name.clone(), xobj_ref));
        let (w, h) = prepared.dimensions();
        Ok((pdf_name, w, h))
    }

    fn render_image(&mut self, y: f32, attachment: &ImageAttachment, indent: f32) -> f32 {
        let (pdf_name, px_w, px_h) = match self.embed_image(attachment) {
            Ok(embedded) => embedded,
            Err(e) => {
                log::warn!("Image {} not embedded: {e}", attachment.name);
                let line = format!("[{}: {}]", t(self.lang, "report.imageError"), attachment.name);
                return self.paragraph(y, BlockKind::ImageError, ERROR_LINE, indent, &line) + 2.0;
            }
        };

        let (w, h) = images::fit(px_w, px_h, CONTENT_WIDTH - indent, IMAGE_MAX_HEIGHT);
        let caption_h = line_height(CAPTION.size);
        let y = self.check_page_break(y, h + IMAGE_CAPTION_GAP + caption_h);
        let x = MARGIN + indent;

        let content = &mut self.current_content;
        content.save_state();
        content.transform([w, 0.0, 0.0, h, x, PAGE_HEIGHT - y - h]);
        content.x_object(Name(pdf_name.as_bytes()));
        content.restore_state();
        self.place(BlockKind::Image, y, x, w, h, &attachment.name);

        let y = y + h + IMAGE_CAPTION_GAP;
        self.paragraph(y, BlockKind::ImageCaption, CAPTION, indent, &attachment.name) + 2.0
    }

    /// Everything one cell holds: header, rating, title, content, images.
    fn render_comment(&mut self, y: f32, cell: &CellLabel, comment: &Comment, indent_level: usize) -> f32 {
        if !comment.has_content() {
            return y;
        }
        let lang = self.lang;
        let indent = indent_level as f32 * INDENT_STEP;

        let header = format!(
            "{} {} - {}",
            t(lang, "report.secondaryElement"),
            cell.id,
            cell.name
        );
        let mut y = self.paragraph(y, BlockKind::CellHeader, CELL_HEADER, indent, &header);

        if let Some(rating) = comment.rating {
            let description = matrix::rating_description(lang, &cell.scale_id, rating);
            // Elements without a scale keep the separator with an empty description.
            let line = format!(
                "{}: {rating}/{MAX_RATING} - {description}",
                t(lang, "report.rating")
            );
            y = self.paragraph(y, BlockKind::Rating, BODY, indent, &line);
        }

        let title = comment.title.trim();
        if !title.is_empty() {
            let line = format!("{}: {title}", t(lang, "report.title"));
            y = self.paragraph(y, BlockKind::Title, BODY, indent, &line);
        }

        let body = comment.content.trim();
        if !body.is_empty() {
            let line = format!("{}: {body}", t(lang, "report.content"));
            y = self.paragraph(y, BlockKind::Content, BODY, indent, &line);
        }

        for attachment in &comment.images {
            y = self.render_image(y, attachment, indent);
        }

        y + BLOCK_GAP
    }

    /// Heading that must not be stranded at the bottom of a page: reserve room
    /// for its first line plus one body line.
    /// A heading moves to the next page together with the first `keep` points of
    /// what follows it.
    fn heading(&mut self, y: f32, kind: BlockKind, style: TextStyle, indent: f32, text: &str, keep: f32) -> f32 {
        let lines = wrap_text(
            text,
            self.fonts.get(style.font),
            style.size,
            CONTENT_WIDTH - indent,
        )
        .len();
        let y = self.check_page_break(y, lines as f32 * line_height(style.size) + HEADING_GAP + keep);
        self.paragraph(y, kind, style, indent, text) + HEADING_GAP
    }

    fn layer_header(&mut self, y: f32, layer: &LayerDef, keep: f32) -> f32 {
        let name = element_name(self.lang, &layer.id).to_string();
        let y = self.heading(y, BlockKind::LayerHeader, LAYER, 0.0, &name, LAYER_RULE_GAP + keep);
        self.rule(y, MARGIN, PAGE_WIDTH - MARGIN, 0.5);
        y + LAYER_RULE_GAP
    }

    fn primary_header(&mut self, y: f32, primary_id: &str, keep: f32) -> f32 {
        let line = format!(
            "{} {primary_id} - {}",
            t(self.lang, "report.primaryElement"),
            element_name(self.lang, primary_id)
        );
        self.heading(y, BlockKind::PrimaryHeader, PRIMARY, 0.0, &line, keep)
    }

    fn render_layer(&mut self, y: f32, layer: &LayerDef, comments: &CommentMap, sources: &[Source]) -> f32 {
        match layer_variant(&layer.id) {
            Some(LayerVariant::RadarCharts) => self.render_fixed_layer(y, layer, comments, true),
            Some(LayerVariant::Plain) => self.render_fixed_layer(y, layer, comments, false),
            Some(LayerVariant::Sources) => self.render_source_layer(y, layer, comments, sources),
            None => {
                log::debug!("No renderer for layer {}, skipping", layer.id);
                y
            }
        }
    }

    fn render_fixed_layer(&mut self, y: f32, layer: &LayerDef, comments: &CommentMap, with_charts: bool) -> f32 {
        let charts: Vec<(&PrimaryDef, Vec<u8>)> = if with_charts {
            layer
                .primaries
                .iter()
                .filter_map(|p| matrix::complete_ratings(layer, p, comments).map(|v| (p, v)))
                .collect()
        } else {
            Vec::new()
        };
        let populated = layer.primaries.iter().any(|p| {
            p.secondaries
                .iter()
                .any(|sid| has_content(comments.get(&layer.cell_key(sid))))
        });
        if charts.is_empty() && !populated {
            log::debug!("Layer {} has no content", layer.id);
            return y;
        }

        let keep = match charts.len() {
            0 => line_height(PRIMARY.size) + HEADING_GAP + line_height(CELL_HEADER.size),
            1 => SINGLE_CHART_SIZE + line_height(CAPTION.size),
            _ => PAIR_CHART_SIZE + line_height(CAPTION.size),
        };
        let mut y = self.layer_header(y, layer, keep);
        for row in charts.chunks(2) {
            y = self.render_chart_row(y, row);
        }

        for primary in &layer.primaries {
            let cells: Vec<(&String, &Comment)> = primary
                .secondaries
                .iter()
                .filter_map(|sid| {
                    comments
                        .get(&layer.cell_key(sid))
                        .filter(|c| c.has_content())
                        .map(|c| (sid, c))
                })
                .collect();
            if cells.is_empty() {
                continue;
            }

            y = self.primary_header(y, &primary.id, line_height(CELL_HEADER.size));
            for (sid, comment) in cells {
                let cell = CellLabel {
                    id: sid.clone(),
                    name: element_name(self.lang, sid).to_string(),
                    scale_id: sid.clone(),
                };
                y = self.render_comment(y, &cell, comment, 1);
            }
        }
        y
    }

    /// One or two charts side by side; a lone chart is centered and enlarged.
    fn render_chart_row(&mut self, y: f32, row: &[(&PrimaryDef, Vec<u8>)]) -> f32 {
        let size = if row.len() == 1 {
            SINGLE_CHART_SIZE
        } else {
            PAIR_CHART_SIZE
        };
        let caption_h = line_height(CAPTION.size);
        let y = self.check_page_break(y, size + caption_h);
        let slot_w = CONTENT_WIDTH / row.len() as f32;

        for (i, (primary, values)) in row.iter().enumerate() {
            let left = MARGIN + slot_w * i as f32 + (slot_w - size) / 2.0;
            chart::draw_radar(
                &mut self.current_content,
                self.fonts.get(FontStyle::Regular),
                values,
                &primary.secondaries,
                left,
                PAGE_HEIGHT - y,
                size,
            );
            self.place(BlockKind::Chart, y, left, size, size + caption_h, &primary.id);

            let caption = truncate_chars(
                &format!(
                    "{} {} - {}",
                    t(self.lang, "report.chartCaption"),
                    primary.id,
                    element_name(self.lang, &primary.id)
                ),
                48,
            );
            let caption_x = left + (size - self.text_width(CAPTION, &caption)) / 2.0;
            self.draw_line(BlockKind::ImageCaption, CAPTION, caption_x, y + size, &caption);
        }
        log::debug!("Placed {} radar chart(s) at {y:.1}", row.len());

        y + size + caption_h + BLOCK_GAP
    }

    fn render_source_layer(&mut self, y: f32, layer: &LayerDef, comments: &CommentMap, sources: &[Source]) -> f32 {
        if sources.is_empty() {
            return y;
        }
        let lang = self.lang;
        let source_keep = line_height(CELL_HEADER.size);
        let primary_keep = line_height(SOURCE_TITLE.size) + HEADING_GAP + source_keep;
        let mut y = self.layer_header(
            y,
            layer,
            line_height(PRIMARY.size) + HEADING_GAP + primary_keep,
        );
        let primary_id = layer
            .primaries
            .first()
            .map(|p| p.id.as_str())
            .unwrap_or(SOURCE_PRIMARY_ID);
        y = self.primary_header(y, primary_id, primary_keep);

        for source in sources {
            let cells: Vec<(usize, &Comment)> = (1..=SOURCE_SUB_CELLS)
                .filter_map(|sub| {
                    comments
                        .get(&source_cell_id(&source.id, sub))
                        .filter(|c| c.has_content())
                        .map(|c| (sub, c))
                })
                .collect();
            if cells.is_empty() {
                continue;
            }

            let title = match source.title.trim() {
                "" => t(lang, "report.untitledSource"),
                title => title,
            };
            let line = format!("{} {}: {title}", t(lang, "report.source"), source.id);
            y = self.heading(y, BlockKind::SourceTitle, SOURCE_TITLE, INDENT_STEP, &line, source_keep);

            for (sub, comment) in cells {
                let cell = CellLabel {
                    id: source_cell_id(&source.id, sub),
                    name: source_cell_name(lang, sub).to_string(),
                    scale_id: format!("source.{sub}"),
                };
                y = self.render_comment(y, &cell, comment, 2);
            }
        }
        y
    }

    /// Footer on every page: rule, title left, author centered, page number right.
    fn stamp_footers(&mut self) {
        self.new_page();
        let total = self.all_contents.len();
        let title = truncate_chars(&self.header.title, FOOTER_TITLE_CHARS);
        let font = self.fonts.get(FOOTER.font);
        let baseline = PAGE_HEIGHT - FOOTER_TEXT_Y;
        let page_label = t(self.lang, "report.page");
        let mut placed = Vec::new();

        for (page_idx, content) in self.all_contents.iter_mut().enumerate() {
            content.save_state();
            content.set_stroke_rgb(0.6, 0.6, 0.6);
            content.set_line_width(0.5);
            content.move_to(MARGIN, PAGE_HEIGHT - FOOTER_RULE_Y);
            content.line_to(PAGE_WIDTH - MARGIN, PAGE_HEIGHT - FOOTER_RULE_Y);
            content.stroke();

            content.set_fill_rgb(FOOTER.color[0], FOOTER.color[1], FOOTER.color[2]);
            show_text(content, font, FOOTER.size, MARGIN, baseline, &title);
            if let Some(author) = &self.header.author {
                let w = font.word_width(author, FOOTER.size);
                show_text(content, font, FOOTER.size, (PAGE_WIDTH - w) / 2.0, baseline, author);
            }
            let number = format!("{page_label} {}/{total}", page_idx + 1);
            let w = font.word_width(&number, FOOTER.size);
            show_text(content, font, FOOTER.size, PAGE_WIDTH - MARGIN - w, baseline, &number);
            content.restore_state();

            placed.push(PlacedBlock {
                page: page_idx,
                kind: BlockKind::Footer,
                top: FOOTER_RULE_Y,
                left: MARGIN,
                width: CONTENT_WIDTH,
                height: FOOTER_TEXT_Y - FOOTER_RULE_Y + FOOTER.size,
                text: substitute_diacritics(&number),
            });
        }
        self.blocks.extend(placed);
    }

    fn finish(self, ctx: &ReportContext) -> (Vec<u8>, usize, Vec<PlacedBlock>) {
        let DocumentBuilder {
            mut pdf,
            mut next_id,
            catalog_id,
            pages_id,
            fonts,
            all_contents,
            image_xobjects,
            blocks,
            ..
        } = self;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let n = all_contents.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let info_id = alloc();

        for (i, c) in all_contents.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        let font_pairs: Vec<(String, Ref)> = fonts
            .iter()
            .map(|f| (f.pdf_name.clone(), f.font_ref))
            .collect();

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for (name, font_ref) in &font_pairs {
                    fonts.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        let generated = ctx.generated_at;
        let date = Date::new(generated.year().clamp(0, 9999) as u16)
            .month(generated.month() as u8)
            .day(generated.day() as u8)
            .hour(generated.hour() as u8)
            .minute(generated.minute() as u8)
            .second(generated.second() as u8);
        {
            let mut info = pdf.document_info(info_id);
            info.creator(TextStr("credibility-report"));
            info.creation_date(date);
            if let Some(title) = ctx.title() {
                info.title(TextStr(title));
            }
            if let Some(author) = ctx.author() {
                info.author(TextStr(author));
            }
        }

        (pdf.finish(), n, blocks)
    }
}

/// Render the whole report for `ctx`. Pure: reads the snapshot, returns the PDF
/// bytes with its file name and placement log; nothing is written to disk.
pub fn render_report(ctx: &ReportContext, matrix: &MatrixDefinition) -> Result<RenderedReport, Error> {
    let t0 = std::time::Instant::now();
    if matrix.layers.is_empty() {
        return Err(Error::Pdf("matrix definition has no layers".into()));
    }

    let lang = Language::normalize(&ctx.language);
    log::debug!(
        "Rendering report: language={}, comments={}, sources={}",
        lang.tag(),
        ctx.comments.len(),
        ctx.sources.len()
    );
    let header = RunningHeader {
        title: ctx
            .title()
            .unwrap_or(t(lang, "report.defaultTitle"))
            .to_string(),
        author: ctx.author().map(|a| truncate_chars(a, FOOTER_AUTHOR_CHARS)),
        date: ctx.generated_at.format("%Y-%m-%d %H:%M").to_string(),
    };
    let mut doc = DocumentBuilder::new(lang, header);

    let mut y = match (ctx.title(), ctx.author()) {
        (Some(title), Some(author)) => {
            doc.draw_title_page(ctx, title, author);
            doc.new_page();
            doc.draw_standard_header(ctx)
        }
        _ => doc.draw_standard_header(ctx),
    };

    for layer in &matrix.layers {
        y = doc.render_layer(y, layer, &ctx.comments, &ctx.sources);
    }
    let t_layout = t0.elapsed();

    doc.stamp_footers();
    let t_footer = t0.elapsed();

    let (bytes, page_count, blocks) = doc.finish(ctx);
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: layout={:.1}ms, footer={:.1}ms, assembly={:.1}ms ({page_count} pages, {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_footer - t_layout).as_secs_f64() * 1000.0,
        (t_assembly - t_footer).as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(RenderedReport {
        bytes,
        filename: report_filename(ctx.title(), &ctx.generated_at),
        page_count,
        blocks,
    })
}
