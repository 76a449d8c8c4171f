use super::{Block, KpiSummaryBlock, ReportDocument, TableBlock};
use crate::wellness::kpi::ChartSpec;

/// Page geometry and type metrics, in millimeters from the top-left
/// corner. The PDF writer flips the y axis when it draws.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub title_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub line_height: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        // A4 portrait.
        Self {
            width: 210.0,
            height: 297.0,
            margin: 15.0,
            title_size: 16.0,
            heading_size: 12.0,
            body_size: 8.5,
            line_height: 6.0,
        }
    }
}

impl PageLayout {
    fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Bar {
        x: f32,
        y: f32,
        width: f32,
        thickness: f32,
    },
    Rule {
        y: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct LaidOutPage {
    pub ops: Vec<DrawOp>,
}

impl LaidOutPage {
    /// Bold text runs on this page, in draw order. Useful for asserting
    /// header redraws without decoding PDF bytes.
    pub fn bold_texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { bold: true, text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

struct Paginator<'a> {
    layout: &'a PageLayout,
    pages: Vec<LaidOutPage>,
    current: LaidOutPage,
    cursor: f32,
}

impl<'a> Paginator<'a> {
    fn new(layout: &'a PageLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: LaidOutPage::default(),
            cursor: layout.margin,
        }
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.cursor = self.layout.margin;
    }

    /// Starts a new page unless `needed` millimeters still fit above the
    /// bottom margin.
    fn ensure_room(&mut self, needed: f32) {
        if self.cursor + needed > self.layout.bottom_limit() && !self.current.ops.is_empty() {
            self.break_page();
        }
    }

    fn text_line(&mut self, x: f32, size: f32, bold: bool, text: &str) {
        self.current.ops.push(DrawOp::Text {
            x,
            y: self.cursor + self.layout.line_height * 0.75,
            size,
            bold,
            text: text.to_string(),
        });
    }

    fn advance(&mut self, amount: f32) {
        self.cursor += amount;
    }

    fn finish(mut self) -> Vec<LaidOutPage> {
        if !self.current.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Lays a composed document out onto pages: a title on the first page,
/// then each block in order, breaking to a fresh page whenever the next
/// unit would cross the bottom margin. Tables redraw their header row at
/// the top of every continuation page.
pub fn paginate(document: &ReportDocument, layout: &PageLayout) -> Vec<LaidOutPage> {
    let mut paginator = Paginator::new(layout);

    paginator.text_line(layout.margin, layout.title_size, true, &document.title);
    paginator.advance(layout.line_height * 2.0);

    for block in &document.blocks {
        match block {
            Block::Heading(text) => lay_heading(&mut paginator, layout, text),
            Block::KpiSummary(summary) => lay_kpi_summary(&mut paginator, layout, summary),
            Block::Notice(text) => lay_notice(&mut paginator, layout, text),
            Block::Chart(chart) => lay_chart(&mut paginator, layout, chart),
            Block::Table(table) => lay_table(&mut paginator, layout, table),
        }
        paginator.advance(layout.line_height);
    }

    paginator.finish()
}

fn lay_heading(paginator: &mut Paginator<'_>, layout: &PageLayout, text: &str) {
    paginator.ensure_room(layout.line_height * 2.0);
    paginator.text_line(layout.margin, layout.heading_size, true, text);
    paginator.advance(layout.line_height * 1.5);
}

fn lay_notice(paginator: &mut Paginator<'_>, layout: &PageLayout, text: &str) {
    paginator.ensure_room(layout.line_height);
    paginator.text_line(layout.margin, layout.body_size, false, text);
    paginator.advance(layout.line_height);
}

fn lay_kpi_summary(paginator: &mut Paginator<'_>, layout: &PageLayout, summary: &KpiSummaryBlock) {
    let lines = [
        format!("Mean stress: {:.1}", summary.mean_stress),
        format!("Adequate rest: {:.1}%", summary.pct_adequate_rest),
        format!("Alerts detected: {}", summary.alert_count),
        format!("Items: {}", summary.item_count),
    ];

    paginator.ensure_room(layout.line_height * (lines.len() as f32 + 1.0));
    paginator.text_line(layout.margin, layout.heading_size, true, "KPI summary");
    paginator.advance(layout.line_height * 1.25);
    for line in lines {
        paginator.text_line(layout.margin + 2.0, layout.body_size, false, &line);
        paginator.advance(layout.line_height);
    }
}

const CHART_LABEL_WIDTH: f32 = 38.0;
const CHART_CAPTION_WIDTH: f32 = 22.0;

fn lay_chart(paginator: &mut Paginator<'_>, layout: &PageLayout, chart: &ChartSpec) {
    // A chart is kept together as one unit; with at most a handful of
    // bars it always fits on a fresh page.
    let needed = layout.line_height * (chart.bars.len() as f32 + 2.0);
    paginator.ensure_room(needed);

    paginator.text_line(layout.margin, layout.heading_size, true, &chart.title);
    paginator.advance(layout.line_height * 1.5);

    let bar_origin = layout.margin + CHART_LABEL_WIDTH;
    let bar_span = layout.usable_width() - CHART_LABEL_WIDTH - CHART_CAPTION_WIDTH;

    for bar in &chart.bars {
        paginator.text_line(layout.margin, layout.body_size, false, &bar.label);

        let fraction = if chart.max_value > 0.0 {
            (bar.value / chart.max_value).clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        let bar_width = bar_span * fraction;
        if bar_width > 0.0 {
            paginator.current.ops.push(DrawOp::Bar {
                x: bar_origin,
                y: paginator.cursor + layout.line_height * 0.5,
                width: bar_width,
                thickness: layout.line_height * 0.55,
            });
        }

        paginator.text_line(
            bar_origin + bar_span + 2.0,
            layout.body_size,
            false,
            &bar.caption,
        );
        paginator.advance(layout.line_height);
    }
}

fn lay_table(paginator: &mut Paginator<'_>, layout: &PageLayout, table: &TableBlock) {
    if table.columns.is_empty() {
        return;
    }

    let column_width = layout.usable_width() / table.columns.len() as f32;
    let max_chars = cell_capacity(column_width, layout.body_size);

    paginator.ensure_room(layout.line_height * 3.0);
    lay_table_header(paginator, layout, table, column_width, max_chars);

    for row in &table.rows {
        if paginator.cursor + layout.line_height > layout.bottom_limit() {
            paginator.break_page();
            lay_table_header(paginator, layout, table, column_width, max_chars);
        }
        for (index, cell) in row.iter().enumerate().take(table.columns.len()) {
            paginator.text_line(
                layout.margin + column_width * index as f32,
                layout.body_size,
                false,
                &truncate_cell(cell, max_chars),
            );
        }
        paginator.advance(layout.line_height);
    }
}

fn lay_table_header(
    paginator: &mut Paginator<'_>,
    layout: &PageLayout,
    table: &TableBlock,
    column_width: f32,
    max_chars: usize,
) {
    for (index, column) in table.columns.iter().enumerate() {
        paginator.text_line(
            layout.margin + column_width * index as f32,
            layout.body_size,
            true,
            &truncate_cell(column, max_chars),
        );
    }
    paginator.advance(layout.line_height);
    paginator.current.ops.push(DrawOp::Rule {
        y: paginator.cursor,
    });
    paginator.advance(layout.line_height * 0.5);
}

/// Rough character budget for a column: Helvetica at body size averages
/// about half the point size in width, converted from mm.
fn cell_capacity(column_width_mm: f32, font_size_pt: f32) -> usize {
    let glyph_mm = font_size_pt * 0.5 * 0.3528;
    ((column_width_mm - 1.0) / glyph_mm).max(3.0) as usize
}

fn truncate_cell(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}
