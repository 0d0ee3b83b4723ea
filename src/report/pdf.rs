//! Paginated PDF export of the active figures
//!
//! Every figure page is drawn from the same scene as the on-screen and SVG
//! renderings, as vector shapes scaled into the free area of an A4 page.

use std::io::BufWriter;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Pt, TextMatrix,
};

use crate::chart::scene::{self, text_width, Anchor, Prim, Scene};
use crate::chart::Rgb;
use crate::data::table::DataTable;
use crate::error::{ReportError, Result};
use crate::figures::{parameterize, FigurePage, ReportFigure};

const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 15.0;
const FOOTER_Y: f64 = 10.0;
const BODY_SIZE: f64 = 9.0;
const LINE_HEIGHT: f64 = 4.2;
/// Characters per description line at `BODY_SIZE`
const WRAP_CHARS: usize = 100;
const TABLE_COL_CHARS: usize = 18;
const PT_PER_MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedReport {
    pub fn data_uri(&self) -> String {
        format!("data:application/pdf;base64,{}", STANDARD.encode(&self.bytes))
    }

    pub fn html_link(&self) -> String {
        format!(
            "<a href=\"{}\" download=\"{}\">Download PDF report</a>",
            self.data_uri(),
            self.file_name
        )
    }
}

fn pdf_error(e: impl std::fmt::Debug) -> ReportError {
    ReportError::Pdf(format!("{:?}", e))
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        rgb[0] as f64 / 255.0,
        rgb[1] as f64 / 255.0,
        rgb[2] as f64 / 255.0,
        None,
    ))
}

/// Flatten translucent fills onto the white page
fn over_white(rgb: Rgb, alpha: f32) -> Rgb {
    let a = alpha.clamp(0.0, 1.0);
    rgb.map(|c| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8)
}

/// Built-in fonts only cover Latin-1
fn printable(text: &str) -> String {
    text.chars().map(|c| if c.is_ascii() { c } else { '?' }).collect()
}

pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

fn clip(text: &str, chars: usize) -> String {
    if text.chars().count() <= chars {
        format!("{:<width$}", text, width = chars)
    } else {
        let mut s: String = text.chars().take(chars.saturating_sub(3)).collect();
        s.push_str("...");
        s
    }
}

/// Header plus as many rows as fit in `max_lines`
pub fn table_lines(table: &DataTable, max_lines: usize) -> Vec<String> {
    let row = |cells: Vec<String>| {
        cells
            .iter()
            .map(|c| clip(c, TABLE_COL_CHARS))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let mut lines = vec![row(table.columns.clone())];
    let room = max_lines.saturating_sub(2);
    for r in table.rows.iter().take(room) {
        lines.push(row(r.iter().map(|c| c.to_string()).collect()));
    }
    if table.n_rows() > room {
        lines.push(format!("... {} more rows", table.n_rows() - room));
    }
    lines
}

/// Maps scene pixels into a page box, flipping y
#[derive(Debug, Clone, Copy)]
struct Placement {
    left: f64,
    top: f64,
    scale: f64,
}

impl Placement {
    fn fit(scene: &Scene, left: f64, top: f64, width: f64, height: f64) -> Self {
        let sw = (scene.width as f64).max(1.0);
        let sh = (scene.height as f64).max(1.0);
        Self {
            left,
            top,
            scale: (width / sw).min(height / sh),
        }
    }

    fn point(&self, p: [f32; 2]) -> Point {
        Point::new(
            Mm(self.left + p[0] as f64 * self.scale),
            Mm(self.top - p[1] as f64 * self.scale),
        )
    }

    fn mm(&self, v: f32) -> f64 {
        v as f64 * self.scale
    }
}

fn path(points: Vec<Point>, closed: bool, fill: bool, stroke: bool) -> Line {
    Line {
        points: points.into_iter().map(|p| (p, false)).collect(),
        is_closed: closed,
        has_fill: fill,
        has_stroke: stroke,
        is_clipping_path: false,
    }
}

fn draw_scene(layer: &PdfLayerReference, font: &IndirectFontRef, scene: &Scene, at: Placement) {
    for prim in &scene.prims {
        match prim {
            Prim::Line {
                from,
                to,
                color: c,
                width,
            } => {
                layer.set_outline_color(color(*c));
                layer.set_outline_thickness((at.mm(*width) * PT_PER_MM).max(0.2));
                layer.add_shape(path(vec![at.point(*from), at.point(*to)], false, false, true));
            }
            Prim::Rect {
                min,
                max,
                fill,
                stroke,
            } => {
                if let Some(f) = fill {
                    layer.set_fill_color(color(*f));
                }
                if let Some(s) = stroke {
                    layer.set_outline_color(color(*s));
                    layer.set_outline_thickness(0.5);
                }
                let corners = vec![
                    at.point(*min),
                    at.point([max[0], min[1]]),
                    at.point(*max),
                    at.point([min[0], max[1]]),
                ];
                layer.add_shape(path(corners, true, fill.is_some(), stroke.is_some()));
            }
            Prim::Circle {
                center,
                radius,
                fill,
                alpha,
            } => {
                layer.set_fill_color(color(over_white(*fill, *alpha)));
                let ring = (0..12)
                    .map(|i| {
                        let t = i as f32 * std::f32::consts::TAU / 12.0;
                        at.point([center[0] + radius * t.cos(), center[1] + radius * t.sin()])
                    })
                    .collect();
                layer.add_shape(path(ring, true, true, false));
            }
            Prim::Text {
                pos,
                text,
                size,
                color: c,
                anchor,
                rotated,
            } => {
                let font_size = at.mm(*size) * PT_PER_MM;
                let width = text_width(text, *size);
                layer.set_fill_color(color(*c));
                if *rotated {
                    let origin = at.point([pos[0] + size * 0.35, pos[1] + width / 2.0]);
                    layer.begin_text_section();
                    layer.set_font(font, font_size);
                    layer.set_text_matrix(TextMatrix::TranslateRotate(
                        Pt::from(origin.x),
                        Pt::from(origin.y),
                        90.0,
                    ));
                    layer.write_text(printable(text), font);
                    layer.end_text_section();
                } else {
                    let x = match anchor {
                        Anchor::Start => pos[0],
                        Anchor::Middle => pos[0] - width / 2.0,
                        Anchor::End => pos[0] - width,
                    };
                    let baseline = at.point([x, pos[1] + size * 0.8]);
                    layer.use_text(printable(text), font_size, Mm::from(baseline.x), Mm::from(baseline.y), font);
                }
            }
        }
    }
}

pub struct PdfReport {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    title: String,
    figures: usize,
    pages: usize,
}

impl PdfReport {
    pub fn new(title: &str) -> Result<Self> {
        let doc = PdfDocument::empty(title);
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        Ok(Self {
            doc,
            font,
            bold,
            title: title.to_string(),
            figures: 0,
            pages: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// One page per panel; figures without output add nothing
    pub fn add_figure(&mut self, figure: &dyn ReportFigure) -> Result<()> {
        let pages = figure.pages();
        if pages.is_empty() {
            log::debug!("Skipping '{}' in PDF: nothing built", figure.meta().short_title);
            return Ok(());
        }
        self.figures += 1;
        for page in &pages {
            self.add_page(page);
        }
        Ok(())
    }

    fn add_page(&mut self, page: &FigurePage) {
        self.pages += 1;
        let (p, l) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let layer = self.doc.get_page(p).get_layer(l);
        let body_width = PAGE_W - 2.0 * MARGIN;

        layer.set_fill_color(color([110, 110, 120]));
        layer.use_text(printable(&self.title), 10.0, Mm(MARGIN), Mm(PAGE_H - 12.0), &self.font);

        layer.set_fill_color(color([20, 20, 30]));
        let mut y = PAGE_H - MARGIN - 8.0;
        let chapter = format!("{}: {}", self.figures, page.title);
        for line in wrap(&chapter, 60) {
            layer.use_text(printable(&line), 15.0, Mm(MARGIN), Mm(y), &self.bold);
            y -= 7.0;
        }
        if !page.subheader.is_empty() {
            layer.use_text(printable(&page.subheader), 11.0, Mm(MARGIN), Mm(y), &self.bold);
            y -= 6.0;
        }
        for line in wrap(&page.description, WRAP_CHARS) {
            layer.use_text(printable(&line), BODY_SIZE, Mm(MARGIN), Mm(y), &self.font);
            y -= LINE_HEIGHT;
        }
        y -= 4.0;

        let bottom = FOOTER_Y + 8.0;
        match (&page.chart, &page.table) {
            (Some(chart), _) => {
                let scene = scene::layout(chart, page.size[0], page.size[1]);
                let at = Placement::fit(&scene, MARGIN, y, body_width, y - bottom);
                draw_scene(&layer, &self.font, &scene, at);
            }
            (None, Some(table)) => {
                let max_lines = ((y - bottom) / LINE_HEIGHT).max(0.0) as usize;
                for line in table_lines(table, max_lines) {
                    layer.use_text(printable(&line), BODY_SIZE - 1.0, Mm(MARGIN), Mm(y), &self.font);
                    y -= LINE_HEIGHT;
                }
            }
            (None, None) => {}
        }

        layer.set_fill_color(color([110, 110, 120]));
        layer.use_text(
            format!("Page {}", self.pages),
            9.0,
            Mm(PAGE_W / 2.0 - 6.0),
            Mm(FOOTER_Y),
            &self.font,
        );
    }

    pub fn finish(self) -> Result<ExportedReport> {
        let mut out = BufWriter::new(Vec::new());
        self.doc.save(&mut out).map_err(pdf_error)?;
        let bytes = out.into_inner().map_err(|e| ReportError::Io(e.into_error()))?;
        log::info!("PDF report: {} figures, {} pages, {} bytes", self.figures, self.pages, bytes.len());
        Ok(ExportedReport {
            file_name: format!("{}_report.pdf", parameterize(&self.title)),
            bytes,
        })
    }
}

/// Export every active figure with output, in report order
pub fn export(title: &str, figures: &[&dyn ReportFigure]) -> Result<ExportedReport> {
    let mut report = PdfReport::new(title)?;
    for figure in figures {
        report.add_figure(*figure)?;
    }
    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::data::custom_proteins::CustomProteinSet;
    use crate::data::table::Cell;
    use crate::figures::{file_sizes, unique_counts};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn counts() -> DataTable {
        DataTable::new(
            vec!["Sample Name".into(), "Unique Proteins".into(), "Unique Peptides".into()],
            vec![
                vec![Cell::text("A:1"), Cell::number(1200.0), Cell::number(8000.0)],
                vec![Cell::text("B:1"), Cell::number(1100.0), Cell::number(7600.0)],
            ],
        )
    }

    fn files() -> file_sizes::FileSizesInput {
        file_sizes::FileSizesInput {
            metadata: DataTable::new(
                vec!["RAW S3 Path".into(), "Acquisition Type".into()],
                vec![vec![Cell::text("s3://raw/a.raw"), Cell::text("Wide DIA")]],
            ),
            sizes: HashMap::from([("s3://raw/a.raw".to_string(), 42)]),
        }
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        assert_eq!(wrap("one two three four", 9), vec!["one two", "three", "four"]);
        assert_eq!(wrap("", 10), Vec::<String>::new());
    }

    #[test]
    fn test_table_lines_truncate_long_tables() {
        let table = DataTable::new(
            vec!["n".into()],
            (0..10).map(|i| vec![Cell::number(i as f64)]).collect(),
        );
        let lines = table_lines(&table, 5);
        assert_eq!(lines, vec!["n", "0", "1", "2", "... 7 more rows"]);
    }

    #[test]
    fn test_export_writes_one_page_per_panel() {
        let limits = Limits::default();
        let custom = CustomProteinSet::default();
        let mut chart = unique_counts::create("ds", counts());
        let mut table = file_sizes::create("ds", files());
        let mut idle = unique_counts::create("ds", counts());
        chart.refresh(&limits, &custom);
        table.refresh(&limits, &custom);

        let mut report = PdfReport::new("Standard Proteomics Report").unwrap();
        report.add_figure(&chart).unwrap();
        report.add_figure(&table).unwrap();
        idle.set_active(false);
        report.add_figure(&idle).unwrap();
        assert_eq!(report.page_count(), 2);

        let exported = report.finish().unwrap();
        assert_eq!(exported.file_name, "standard_proteomics_report_report.pdf");
        assert!(exported.bytes.starts_with(b"%PDF"));
        assert!(exported.data_uri().starts_with("data:application/pdf;base64,JVBER"));
        assert!(exported.html_link().contains("download=\"standard_proteomics_report_report.pdf\""));
    }

    #[test]
    fn test_over_white_blends() {
        assert_eq!(over_white([0, 0, 0], 1.0), [0, 0, 0]);
        assert_eq!(over_white([0, 100, 255], 0.0), [255, 255, 255]);
    }
}
