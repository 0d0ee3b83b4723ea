//! Chart layout
//!
//! Turns a `Chart` into a flat list of pixel-space primitives (origin top
//! left, y down). Every output backend draws the same scene, so exported
//! files match what the report shows.

use super::{
    format_tick, hex, palette, ramp, ticks, BarChart, BoxChart, Chart, Clustergram, Heatmap,
    Histogram, Rgb, ScatterChart, ScatterMatrix, Venn, MISSING_COLOR,
};
use crate::analysis::clustering::Link;
use crate::data::table::LabeledMatrix;

const AXIS_COLOR: Rgb = [100, 100, 110];
const GRID_COLOR: Rgb = [230, 230, 235];
const TEXT_COLOR: Rgb = [30, 30, 40];
const TITLE_SIZE: f32 = 16.0;
const LABEL_SIZE: f32 = 11.0;
const TICK_SIZE: f32 = 10.0;
/// Point cap per scatter-matrix cell
const MAX_MATRIX_POINTS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prim {
    Line {
        from: [f32; 2],
        to: [f32; 2],
        color: Rgb,
        width: f32,
    },
    Rect {
        min: [f32; 2],
        max: [f32; 2],
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Circle {
        center: [f32; 2],
        radius: f32,
        fill: Rgb,
        alpha: f32,
    },
    /// `pos` is the top of the text box; `anchor` is horizontal. Rotated text
    /// runs bottom to top with `pos` as its vertical center line.
    Text {
        pos: [f32; 2],
        text: String,
        size: f32,
        color: Rgb,
        anchor: Anchor,
        rotated: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub prims: Vec<Prim>,
}

/// Approximate rendered width of a string
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.6
}

impl Scene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            prims: Vec::new(),
        }
    }

    fn line(&mut self, from: [f32; 2], to: [f32; 2], color: Rgb, width: f32) {
        self.prims.push(Prim::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn rect(&mut self, min: [f32; 2], max: [f32; 2], fill: Option<Rgb>, stroke: Option<Rgb>) {
        self.prims.push(Prim::Rect {
            min,
            max,
            fill,
            stroke,
        });
    }

    fn circle(&mut self, center: [f32; 2], radius: f32, fill: Rgb, alpha: f32) {
        self.prims.push(Prim::Circle {
            center,
            radius,
            fill,
            alpha,
        });
    }

    fn text(&mut self, pos: [f32; 2], text: &str, size: f32, anchor: Anchor) {
        self.prims.push(Prim::Text {
            pos,
            text: text.to_string(),
            size,
            color: TEXT_COLOR,
            anchor,
            rotated: false,
        });
    }

    fn vtext(&mut self, pos: [f32; 2], text: &str, size: f32) {
        self.prims.push(Prim::Text {
            pos,
            text: text.to_string(),
            size,
            color: TEXT_COLOR,
            anchor: Anchor::Middle,
            rotated: true,
        });
    }

    fn title(&mut self, title: &str) {
        if !title.is_empty() {
            let shown = truncate(title, ((self.width - 20.0) / (TITLE_SIZE * 0.6)) as usize);
            self.text([self.width / 2.0, 8.0], &shown, TITLE_SIZE, Anchor::Middle);
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars || max_chars < 4 {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(max_chars - 3).collect();
        s.push_str("...");
        s
    }
}

/// Plot area with a linear data → pixel mapping
#[derive(Debug, Clone, Copy)]
struct Frame {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Frame {
    fn w(&self) -> f32 {
        self.x1 - self.x0
    }
    fn h(&self) -> f32 {
        self.y1 - self.y0
    }
    fn px(&self, v: f64, lo: f64, hi: f64) -> f32 {
        let span = if hi > lo { hi - lo } else { 1.0 };
        self.x0 + ((v - lo) / span) as f32 * self.w()
    }
    fn py(&self, v: f64, lo: f64, hi: f64) -> f32 {
        let span = if hi > lo { hi - lo } else { 1.0 };
        self.y1 - ((v - lo) / span) as f32 * self.h()
    }
}

pub fn layout(chart: &Chart, width: f32, height: f32) -> Scene {
    let mut scene = Scene::new(width, height);
    scene.rect([0.0, 0.0], [width, height], Some([255, 255, 255]), None);
    scene.title(chart.title());
    match chart {
        Chart::Bar(c) => layout_bar(&mut scene, c),
        Chart::Histogram(c) => layout_histogram(&mut scene, c),
        Chart::Box(c) => layout_box(&mut scene, c),
        Chart::Scatter(c) => layout_scatter(&mut scene, c),
        Chart::ScatterMatrix(c) => layout_scatter_matrix(&mut scene, c),
        Chart::Heatmap(c) => layout_heatmap(&mut scene, c),
        Chart::Clustergram(c) => layout_clustergram(&mut scene, c),
        Chart::Venn(c) => layout_venn(&mut scene, c),
    }
    scene
}

// ── Axes ──

fn y_axis(scene: &mut Scene, f: &Frame, lo: f64, hi: f64, label: &str, right: bool) {
    let x = if right { f.x1 } else { f.x0 };
    scene.line([x, f.y0], [x, f.y1], AXIS_COLOR, 1.0);
    for t in ticks(lo, hi, 6.0) {
        let y = f.py(t, lo, hi);
        if !right {
            scene.line([f.x0, y], [f.x1, y], GRID_COLOR, 0.5);
        }
        let (tx, anchor) = if right {
            (x + 6.0, Anchor::Start)
        } else {
            (x - 6.0, Anchor::End)
        };
        scene.line([x - 3.0, y], [x + 3.0, y], AXIS_COLOR, 1.0);
        scene.text([tx, y - TICK_SIZE / 2.0], &format_tick(t), TICK_SIZE, anchor);
    }
    if !label.is_empty() {
        let lx = if right { f.x1 + 48.0 } else { f.x0 - 48.0 };
        scene.vtext([lx, (f.y0 + f.y1) / 2.0], label, LABEL_SIZE);
    }
}

fn x_axis_numeric(scene: &mut Scene, f: &Frame, lo: f64, hi: f64, label: &str) {
    scene.line([f.x0, f.y1], [f.x1, f.y1], AXIS_COLOR, 1.0);
    for t in ticks(lo, hi, 8.0) {
        let x = f.px(t, lo, hi);
        scene.line([x, f.y1], [x, f.y1 + 4.0], AXIS_COLOR, 1.0);
        scene.text([x, f.y1 + 6.0], &format_tick(t), TICK_SIZE, Anchor::Middle);
    }
    if !label.is_empty() {
        scene.text([(f.x0 + f.x1) / 2.0, f.y1 + 24.0], label, LABEL_SIZE, Anchor::Middle);
    }
}

/// Category names under slot centers; rotated when they would collide
fn x_axis_categories(scene: &mut Scene, f: &Frame, names: &[String], label: &str) {
    scene.line([f.x0, f.y1], [f.x1, f.y1], AXIS_COLOR, 1.0);
    if names.is_empty() {
        return;
    }
    let slot = f.w() / names.len() as f32;
    let widest = names.iter().map(|n| text_width(n, TICK_SIZE)).fold(0.0, f32::max);
    let rotate = widest > slot * 0.95;
    for (i, name) in names.iter().enumerate() {
        let x = f.x0 + slot * (i as f32 + 0.5);
        if rotate {
            let shown = truncate(name, 18);
            let half = text_width(&shown, TICK_SIZE) / 2.0;
            scene.vtext([x, f.y1 + 6.0 + half], &shown, TICK_SIZE);
        } else {
            scene.text([x, f.y1 + 6.0], name, TICK_SIZE, Anchor::Middle);
        }
    }
    if !label.is_empty() {
        let y = if rotate { scene.height - 16.0 } else { f.y1 + 24.0 };
        scene.text([(f.x0 + f.x1) / 2.0, y], label, LABEL_SIZE, Anchor::Middle);
    }
}

fn legend(scene: &mut Scene, f: &Frame, entries: &[(String, Rgb)]) {
    let mut y = f.y0 + 4.0;
    for (name, color) in entries {
        let x = f.x1 - text_width(name, LABEL_SIZE) - 22.0;
        scene.rect([x, y + 2.0], [x + 10.0, y + 12.0], Some(*color), None);
        scene.text([x + 14.0, y], name, LABEL_SIZE, Anchor::Start);
        y += 16.0;
    }
}

/// Bottom margin needed for category labels
fn category_margin(names: &[String], plot_w: f32) -> f32 {
    if names.is_empty() {
        return 40.0;
    }
    let slot = plot_w / names.len() as f32;
    let widest = names
        .iter()
        .map(|n| text_width(&truncate(n, 18), TICK_SIZE))
        .fold(0.0, f32::max);
    if widest > slot * 0.95 {
        widest + 34.0
    } else {
        44.0
    }
}

// ── Charts ──

fn layout_bar(scene: &mut Scene, c: &BarChart) {
    let right_margin = if c.has_secondary() { 70.0 } else { 20.0 };
    let plot_w = scene.width - 70.0 - right_margin;
    let bottom = category_margin(&c.categories, plot_w);
    let f = Frame {
        x0: 70.0,
        y0: 40.0,
        x1: scene.width - right_margin,
        y1: scene.height - bottom,
    };
    let hi1 = (c.axis_max(false) * 1.05).max(1.0);
    let hi2 = (c.axis_max(true) * 1.05).max(1.0);
    y_axis(scene, &f, 0.0, hi1, &c.y_label, false);
    if c.has_secondary() {
        y_axis(scene, &f, 0.0, hi2, c.y2_label.as_deref().unwrap_or(""), true);
    }

    let n = c.categories.len().max(1);
    let slot = f.w() / n as f32;
    let bar_w = slot * 0.8 / c.series.len().max(1) as f32;
    for (s, series) in c.series.iter().enumerate() {
        let hi = if series.secondary { hi2 } else { hi1 };
        for (i, v) in series.values.iter().enumerate().filter(|(_, v)| v.is_finite()) {
            let x = f.x0 + slot * i as f32 + slot * 0.1 + bar_w * s as f32;
            let y = f.py(*v, 0.0, hi);
            scene.rect([x, y], [x + bar_w, f.y1], Some(series.color), None);
        }
    }
    x_axis_categories(scene, &f, &c.categories, &c.x_label);
    if c.series.len() > 1 {
        let entries: Vec<(String, Rgb)> =
            c.series.iter().map(|s| (s.name.clone(), s.color)).collect();
        legend(scene, &f, &entries);
    }
}

fn layout_histogram(scene: &mut Scene, c: &Histogram) {
    let f = Frame {
        x0: 70.0,
        y0: 40.0,
        x1: scene.width - 20.0,
        y1: scene.height - 50.0,
    };
    let (Some(first), Some(last)) = (c.bins.first(), c.bins.last()) else {
        return;
    };
    let (lo, hi) = (first.lo, last.hi);
    let top = (c.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64 * 1.05).max(1.0);
    y_axis(scene, &f, 0.0, top, &c.y_label, false);
    for b in &c.bins {
        let x0 = f.px(b.lo, lo, hi);
        let x1 = f.px(b.hi, lo, hi);
        let gap = ((x1 - x0) * 0.05).max(0.5);
        let y = f.py(b.count as f64, 0.0, top);
        scene.rect([x0 + gap, y], [x1 - gap, f.y1], Some(c.color), None);
    }
    x_axis_numeric(scene, &f, lo, hi, &c.x_label);
}

fn layout_box(scene: &mut Scene, c: &BoxChart) {
    let names: Vec<String> = c.boxes.iter().map(|b| b.name.clone()).collect();
    let plot_w = scene.width - 90.0;
    let bottom = category_margin(&names, plot_w);
    let f = Frame {
        x0: 70.0,
        y0: 40.0,
        x1: scene.width - 20.0,
        y1: scene.height - bottom,
    };
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for b in &c.boxes {
        for v in b.outliers.iter().chain([&b.lower_whisker, &b.upper_whisker]) {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
    }
    if lo > hi {
        return;
    }
    let pad = ((hi - lo) * 0.05).max(1e-9);
    let (lo, hi) = (lo - pad, hi + pad);
    y_axis(scene, &f, lo, hi, &c.y_label, false);

    let slot = f.w() / c.boxes.len().max(1) as f32;
    for (i, b) in c.boxes.iter().enumerate() {
        let cx = f.x0 + slot * (i as f32 + 0.5);
        let half = slot * 0.3;
        let (q1, q3, med) = (f.py(b.q1, lo, hi), f.py(b.q3, lo, hi), f.py(b.median, lo, hi));
        scene.line([cx, f.py(b.upper_whisker, lo, hi)], [cx, q3], c.color, 1.0);
        scene.line([cx, q1], [cx, f.py(b.lower_whisker, lo, hi)], c.color, 1.0);
        for w in [b.upper_whisker, b.lower_whisker] {
            let y = f.py(w, lo, hi);
            scene.line([cx - half / 2.0, y], [cx + half / 2.0, y], c.color, 1.0);
        }
        scene.rect([cx - half, q3], [cx + half, q1], Some(super::secondary()), Some(c.color));
        scene.line([cx - half, med], [cx + half, med], c.color, 2.0);
        for o in &b.outliers {
            scene.circle([cx, f.py(*o, lo, hi)], 2.0, c.color, 0.8);
        }
    }
    x_axis_categories(scene, &f, &names, "");
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(0.5);
    (lo - pad, hi + pad)
}

fn layout_scatter(scene: &mut Scene, c: &ScatterChart) {
    let f = Frame {
        x0: 70.0,
        y0: 40.0,
        x1: scene.width - 20.0,
        y1: scene.height - 50.0,
    };
    let points = || c.groups.iter().flat_map(|g| g.points.iter());
    let (xlo, xhi) = padded_range(points().map(|p| p[0]));
    let (ylo, yhi) = padded_range(points().map(|p| p[1]));
    y_axis(scene, &f, ylo, yhi, &c.y_label, false);
    x_axis_numeric(scene, &f, xlo, xhi, &c.x_label);
    for g in &c.groups {
        for p in g.points.iter().filter(|p| p[0].is_finite() && p[1].is_finite()) {
            scene.circle([f.px(p[0], xlo, xhi), f.py(p[1], ylo, yhi)], 5.0, g.color, 0.9);
        }
    }
    if c.groups.len() > 1 {
        let entries: Vec<(String, Rgb)> =
            c.groups.iter().map(|g| (g.name.clone(), g.color)).collect();
        legend(scene, &f, &entries);
    }
}

fn layout_scatter_matrix(scene: &mut Scene, c: &ScatterMatrix) {
    let k = c.columns.len();
    if k == 0 {
        return;
    }
    let area = Frame {
        x0: 20.0,
        y0: 40.0,
        x1: scene.width - 20.0,
        y1: scene.height - 20.0,
    };
    let cw = area.w() / k as f32;
    let ch = area.h() / k as f32;
    let ranges: Vec<(f64, f64)> = c
        .values
        .iter()
        .map(|col| padded_range(col.iter().copied()))
        .collect();

    for row in 0..k {
        for col in 0..k {
            let cell = Frame {
                x0: area.x0 + cw * col as f32 + 2.0,
                y0: area.y0 + ch * row as f32 + 2.0,
                x1: area.x0 + cw * (col + 1) as f32 - 2.0,
                y1: area.y0 + ch * (row + 1) as f32 - 2.0,
            };
            scene.rect([cell.x0, cell.y0], [cell.x1, cell.y1], None, Some(GRID_COLOR));
            if row == col {
                let label = truncate(&c.columns[row], (cell.w() / (TICK_SIZE * 0.6)) as usize);
                scene.text(
                    [(cell.x0 + cell.x1) / 2.0, (cell.y0 + cell.y1) / 2.0 - TICK_SIZE / 2.0],
                    &label,
                    TICK_SIZE,
                    Anchor::Middle,
                );
                continue;
            }
            let (xs, ys) = (&c.values[col], &c.values[row]);
            let (xlo, xhi) = ranges[col];
            let (ylo, yhi) = ranges[row];
            let n = xs.len().min(ys.len());
            let stride = (n / MAX_MATRIX_POINTS).max(1);
            for i in (0..n).step_by(stride) {
                if xs[i].is_finite() && ys[i].is_finite() {
                    scene.circle(
                        [cell.px(xs[i], xlo, xhi), cell.py(ys[i], ylo, yhi)],
                        1.5,
                        c.color,
                        c.opacity,
                    );
                }
            }
        }
    }
}

/// Matrix cells plus row/column labels and a color bar; returns the cell area
fn heatmap_cells(
    scene: &mut Scene,
    m: &LabeledMatrix,
    range: (f64, f64),
    area: Frame,
) -> Frame {
    let label_w = m
        .rows
        .iter()
        .map(|r| text_width(&truncate(r, 24), TICK_SIZE))
        .fold(0.0, f32::max)
        .min(area.w() * 0.4);
    let col_label_h = m
        .columns
        .iter()
        .map(|c| text_width(&truncate(c, 20), TICK_SIZE))
        .fold(0.0, f32::max)
        + 8.0;
    let cells = Frame {
        x0: area.x0 + label_w + 6.0,
        y0: area.y0,
        x1: area.x1 - 60.0,
        y1: area.y1 - col_label_h,
    };
    if m.is_empty() || cells.w() <= 0.0 || cells.h() <= 0.0 {
        return cells;
    }
    let cw = cells.w() / m.n_cols() as f32;
    let ch = cells.h() / m.n_rows() as f32;
    let (lo, hi) = range;
    let span = if hi > lo { hi - lo } else { 1.0 };
    for (i, row) in m.values.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            let color = if v.is_finite() {
                ramp((v - lo) / span)
            } else {
                MISSING_COLOR
            };
            let x = cells.x0 + cw * j as f32;
            let y = cells.y0 + ch * i as f32;
            scene.rect([x, y], [x + cw, y + ch], Some(color), None);
        }
    }
    // row labels only when they fit
    if ch >= 7.0 {
        let size = ch.min(TICK_SIZE);
        for (i, r) in m.rows.iter().enumerate() {
            let y = cells.y0 + ch * (i as f32 + 0.5) - size / 2.0;
            scene.text([cells.x0 - 4.0, y], &truncate(r, 24), size, Anchor::End);
        }
    }
    for (j, c) in m.columns.iter().enumerate() {
        let shown = truncate(c, 20);
        let x = cells.x0 + cw * (j as f32 + 0.5);
        scene.vtext([x, cells.y1 + 4.0 + text_width(&shown, TICK_SIZE) / 2.0], &shown, TICK_SIZE);
    }

    // color bar
    let bx = cells.x1 + 14.0;
    let steps = 40;
    let bar_h = cells.h().min(240.0);
    for s in 0..steps {
        let t0 = s as f32 / steps as f32;
        let t1 = (s + 1) as f32 / steps as f32;
        let color = ramp(1.0 - t0 as f64);
        scene.rect(
            [bx, cells.y0 + bar_h * t0],
            [bx + 12.0, cells.y0 + bar_h * t1],
            Some(color),
            None,
        );
    }
    scene.text([bx + 15.0, cells.y0 - 2.0], &format_tick(hi), TICK_SIZE, Anchor::Start);
    scene.text(
        [bx + 15.0, cells.y0 + bar_h - TICK_SIZE],
        &format_tick(lo),
        TICK_SIZE,
        Anchor::Start,
    );
    cells
}

fn layout_heatmap(scene: &mut Scene, c: &Heatmap) {
    let area = Frame {
        x0: 10.0,
        y0: 40.0,
        x1: scene.width - 10.0,
        y1: scene.height - 10.0,
    };
    heatmap_cells(scene, &c.matrix, c.value_range(), area);
}

fn dendrogram(scene: &mut Scene, links: &[Link], along: (f32, f32), base: f32, depth: f32, vertical: bool) {
    let max_h = links.iter().map(|l| l.height).fold(0.0, f64::max);
    let n_leaves = links.len() + 1;
    let scale_pos = |p: f64| along.0 + (p as f32 / n_leaves as f32) * (along.1 - along.0);
    let scale_h = |h: f64| {
        let t = if max_h > 0.0 { (h / max_h) as f32 } else { 0.0 };
        base - t * depth
    };
    for l in links {
        let (a, b) = (scale_pos(l.left_pos), scale_pos(l.right_pos));
        let (ha, hb, h) = (scale_h(l.left_height), scale_h(l.right_height), scale_h(l.height));
        let color = super::secondary();
        if vertical {
            // leaves along x, height grows upward
            scene.line([a, ha], [a, h], color, 1.0);
            scene.line([b, hb], [b, h], color, 1.0);
            scene.line([a, h], [b, h], color, 1.0);
        } else {
            // leaves along y, height grows leftward
            scene.line([ha, a], [h, a], color, 1.0);
            scene.line([hb, b], [h, b], color, 1.0);
            scene.line([h, a], [h, b], color, 1.0);
        }
    }
}

fn layout_clustergram(scene: &mut Scene, c: &Clustergram) {
    let dendro = 80.0;
    let area = Frame {
        x0: 10.0 + dendro,
        y0: 40.0 + dendro,
        x1: scene.width - 10.0,
        y1: scene.height - 10.0,
    };
    let cells = heatmap_cells(scene, &c.matrix, super::value_range(&c.matrix), area);
    if !c.col_links.is_empty() {
        dendrogram(scene, &c.col_links, (cells.x0, cells.x1), cells.y0 - 4.0, dendro - 8.0, true);
    }
    if !c.row_links.is_empty() {
        // row labels sit between the cells and the dendrogram
        let base = cells.x0 - 4.0 - (cells.x0 - area.x0);
        dendrogram(scene, &c.row_links, (cells.y0, cells.y1), base, dendro - 8.0, false);
    }
}

fn layout_venn(scene: &mut Scene, c: &Venn) {
    let cy = scene.height / 2.0 + 10.0;
    let r = (scene.height * 0.32).min(scene.width * 0.22);
    let (lx, rx) = (scene.width / 2.0 - r * 0.55, scene.width / 2.0 + r * 0.55);
    scene.circle([lx, cy], r, super::primary(), 0.45);
    scene.circle([rx, cy], r, super::secondary(), 0.45);
    let count_size = 18.0;
    let y = cy - count_size / 2.0;
    scene.text([lx - r * 0.5, y], &c.left_only.to_string(), count_size, Anchor::Middle);
    scene.text([(lx + rx) / 2.0, y], &c.both.to_string(), count_size, Anchor::Middle);
    scene.text([rx + r * 0.5, y], &c.right_only.to_string(), count_size, Anchor::Middle);
    scene.text([lx, cy - r - 20.0], &c.left_label, LABEL_SIZE + 2.0, Anchor::Middle);
    scene.text([rx, cy - r - 20.0], &c.right_label, LABEL_SIZE + 2.0, Anchor::Middle);
}

/// Series colors as CSS hex, for legends outside the scene
pub fn series_colors(n: usize) -> Vec<String> {
    (0..n).map(|i| hex(palette(i))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BarSeries, BoxStats, HistBin};

    fn count<F: Fn(&Prim) -> bool>(scene: &Scene, f: F) -> usize {
        scene.prims.iter().filter(|p| f(p)).count()
    }

    #[test]
    fn test_bar_layout_draws_every_bar_and_right_axis() {
        let chart = Chart::Bar(BarChart {
            title: "Counts".into(),
            categories: vec!["S1".into(), "S2".into()],
            series: vec![
                BarSeries {
                    name: "Proteins".into(),
                    values: vec![10.0, 12.0],
                    color: [0, 0, 0],
                    secondary: false,
                },
                BarSeries {
                    name: "Peptides".into(),
                    values: vec![100.0, f64::NAN],
                    color: [1, 1, 1],
                    secondary: true,
                },
            ],
            x_label: "Sample".into(),
            y_label: "Proteins".into(),
            y2_label: Some("Peptides".into()),
        });
        let scene = layout(&chart, 600.0, 400.0);
        let bars = count(&scene, |p| {
            matches!(p, Prim::Rect { fill: Some(c), .. } if *c == [0, 0, 0] || *c == [1, 1, 1])
        });
        // three finite bars plus two legend swatches
        assert_eq!(bars, 5);
        let rotated = count(&scene, |p| matches!(p, Prim::Text { rotated: true, .. }));
        assert_eq!(rotated, 2);
    }

    #[test]
    fn test_heatmap_layout_has_one_rect_per_cell() {
        let m = LabeledMatrix::new(
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into(), "z".into()],
            vec![vec![0.0, 0.5, 1.0], vec![f64::NAN, 0.2, 0.3]],
        );
        let chart = Chart::Heatmap(Heatmap {
            title: "H".into(),
            matrix: m,
            z_range: Some((0.0, 1.0)),
        });
        let scene = layout(&chart, 500.0, 400.0);
        assert_eq!(count(&scene, |p| matches!(p, Prim::Rect { fill: Some(c), .. } if *c == MISSING_COLOR)), 1);
        assert!(count(&scene, |p| matches!(p, Prim::Rect { .. })) >= 6 + 40);
    }

    #[test]
    fn test_other_layouts_produce_primitives() {
        let charts = vec![
            Chart::Histogram(Histogram {
                title: "H".into(),
                bins: vec![HistBin { lo: 1.0, hi: 2.0, count: 3 }],
                x_label: "x".into(),
                y_label: "y".into(),
                color: [0, 0, 0],
            }),
            Chart::Box(BoxChart {
                title: "B".into(),
                boxes: vec![BoxStats::from_values("S1", &[1.0, 2.0, 3.0]).unwrap()],
                y_label: "log2".into(),
                color: [0, 0, 0],
            }),
            Chart::Venn(Venn {
                title: "V".into(),
                left_label: "Nuclear".into(),
                right_label: "Measured".into(),
                left_only: 3,
                both: 2,
                right_only: 5,
            }),
        ];
        for chart in &charts {
            assert!(layout(chart, 400.0, 300.0).prims.len() > 3);
        }
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
