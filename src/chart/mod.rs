//! Backend-neutral chart descriptions
//!
//! Figures build `Chart` values; `scene` lays them out as drawing primitives
//! that `raster` (PNG/PDF), `svg` and the egui painter all consume, and
//! `plot_view` shows the interactive versions.

pub mod plot_view;
pub mod raster;
pub mod scene;
pub mod svg;

use crate::analysis::clustering::Link;
use crate::analysis::stats;
use crate::config::{PRIMARY_COLOR, SECONDARY_COLOR};
use crate::data::table::LabeledMatrix;

pub type Rgb = [u8; 3];

/// Qualitative palette for multi-series charts
pub const PALETTE: [Rgb; 10] = [
    [0x63, 0x6E, 0xFA],
    [0xEF, 0x55, 0x3B],
    [0x00, 0xCC, 0x96],
    [0xAB, 0x63, 0xFA],
    [0xFF, 0xA1, 0x5A],
    [0x19, 0xD3, 0xF3],
    [0xFF, 0x66, 0x92],
    [0xB6, 0xE8, 0x80],
    [0xFF, 0x97, 0xFF],
    [0xFE, 0xCB, 0x52],
];

pub fn palette(i: usize) -> Rgb {
    PALETTE[i % PALETTE.len()]
}

pub fn hex(color: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

/// White → primary color ramp, `t` in [0, 1]
pub fn ramp(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |c: u8| (255.0 + (c as f64 - 255.0) * t).round() as u8;
    [mix(PRIMARY_COLOR[0]), mix(PRIMARY_COLOR[1]), mix(PRIMARY_COLOR[2])]
}

/// Color for cells with no value
pub const MISSING_COLOR: Rgb = [0xE4, 0xE4, 0xE8];

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Bar(BarChart),
    Histogram(Histogram),
    Box(BoxChart),
    Scatter(ScatterChart),
    ScatterMatrix(ScatterMatrix),
    Heatmap(Heatmap),
    Clustergram(Clustergram),
    Venn(Venn),
}

impl Chart {
    pub fn title(&self) -> &str {
        match self {
            Chart::Bar(c) => &c.title,
            Chart::Histogram(c) => &c.title,
            Chart::Box(c) => &c.title,
            Chart::Scatter(c) => &c.title,
            Chart::ScatterMatrix(c) => &c.title,
            Chart::Heatmap(c) => &c.title,
            Chart::Clustergram(c) => &c.title,
            Chart::Venn(c) => &c.title,
        }
    }
}

// ── Bar ──

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub color: Rgb,
    /// Plotted against the right-hand axis
    pub secondary: bool,
}

/// Grouped bars over shared categories
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    pub x_label: String,
    pub y_label: String,
    pub y2_label: Option<String>,
}

impl BarChart {
    pub fn has_secondary(&self) -> bool {
        self.series.iter().any(|s| s.secondary)
    }

    /// Largest value plotted on one axis
    pub fn axis_max(&self, secondary: bool) -> f64 {
        self.series
            .iter()
            .filter(|s| s.secondary == secondary)
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

// ── Histogram ──

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub title: String,
    pub bins: Vec<HistBin>,
    pub x_label: String,
    pub y_label: String,
    pub color: Rgb,
}

/// `n_bins` equal-width bins spanning the data; the top edge is inclusive
pub fn bin_values(values: &[f64], n_bins: usize) -> Vec<HistBin> {
    let v = stats::finite(values);
    if v.is_empty() || n_bins == 0 {
        return Vec::new();
    }
    let lo = v.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if hi > lo { (hi - lo) / n_bins as f64 } else { 1.0 };
    let mut bins: Vec<HistBin> = (0..n_bins)
        .map(|k| HistBin {
            lo: lo + k as f64 * width,
            hi: lo + (k + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for x in v {
        let k = (((x - lo) / width) as usize).min(n_bins - 1);
        bins[k].count += 1;
    }
    bins
}

// ── Box ──

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub name: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Tukey box: whiskers reach the most extreme values inside the fences
    pub fn from_values(name: &str, values: &[f64]) -> Option<Self> {
        let mut v = stats::finite(values);
        if v.is_empty() {
            return None;
        }
        v.sort_by(|a, b| a.total_cmp(b));
        let q = stats::quantiles(&v, &[0.25, 0.5, 0.75]);
        let (q1, q3) = (q[0], q[2]);
        let (lo_fence, hi_fence) = stats::tukey_fences(&v);
        let inside: Vec<f64> = v
            .iter()
            .copied()
            .filter(|x| *x >= lo_fence && *x <= hi_fence)
            .collect();
        Some(Self {
            name: name.to_string(),
            q1,
            median: q[1],
            q3,
            lower_whisker: inside.first().copied().unwrap_or(q1),
            upper_whisker: inside.last().copied().unwrap_or(q3),
            outliers: v
                .iter()
                .copied()
                .filter(|x| *x < lo_fence || *x > hi_fence)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxChart {
    pub title: String,
    pub boxes: Vec<BoxStats>,
    pub y_label: String,
    pub color: Rgb,
}

// ── Scatter ──

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterGroup {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub labels: Vec<String>,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub groups: Vec<ScatterGroup>,
    pub x_label: String,
    pub y_label: String,
}

/// Pairwise scatter of every column against every other
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterMatrix {
    pub title: String,
    pub columns: Vec<String>,
    /// `values[column][point]`
    pub values: Vec<Vec<f64>>,
    pub opacity: f32,
    pub color: Rgb,
}

// ── Heatmaps ──

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub title: String,
    pub matrix: LabeledMatrix,
    /// Fixed color range; the data range when `None`
    pub z_range: Option<(f64, f64)>,
}

impl Heatmap {
    pub fn value_range(&self) -> (f64, f64) {
        if let Some(r) = self.z_range {
            return r;
        }
        value_range(&self.matrix)
    }
}

pub fn value_range(m: &LabeledMatrix) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in m.values.iter().flatten().filter(|v| v.is_finite()) {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if lo > hi {
        (0.0, 1.0)
    } else {
        (lo, hi)
    }
}

/// Heatmap with row and column dendrograms; the matrix is already in
/// dendrogram leaf order
#[derive(Debug, Clone, PartialEq)]
pub struct Clustergram {
    pub title: String,
    pub matrix: LabeledMatrix,
    pub row_links: Vec<Link>,
    pub col_links: Vec<Link>,
}

// ── Venn ──

#[derive(Debug, Clone, PartialEq)]
pub struct Venn {
    pub title: String,
    pub left_label: String,
    pub right_label: String,
    pub left_only: usize,
    pub both: usize,
    pub right_only: usize,
}

pub fn primary() -> Rgb {
    PRIMARY_COLOR
}

pub fn secondary() -> Rgb {
    SECONDARY_COLOR
}

/// Choose a tick spacing of 1, 2 or 5 × 10^k giving roughly `target` ticks
pub fn nice_step(range: f64, target: f64) -> f64 {
    if !(range.is_finite() && range > 0.0) {
        return 1.0;
    }
    let raw = range / target.max(1.0);
    let magnitude = 10f64.powf(raw.log10().floor());
    for m in [1.0, 2.0, 5.0, 10.0] {
        if m * magnitude >= raw {
            return m * magnitude;
        }
    }
    10.0 * magnitude
}

/// Tick positions covering `[lo, hi]`
pub fn ticks(lo: f64, hi: f64, target: f64) -> Vec<f64> {
    let step = nice_step(hi - lo, target);
    let mut t = (lo / step).ceil() * step;
    let mut out = Vec::new();
    while t <= hi + step * 1e-9 && out.len() < 200 {
        out.push(if t.abs() < step * 1e-9 { 0.0 } else { t });
        t += step;
    }
    out
}

/// Short tick text: integers without decimals, otherwise up to 3 significant places
pub fn format_tick(v: f64) -> String {
    if v.fract().abs() < 1e-9 && v.abs() < 1e15 {
        format!("{}", v.round() as i64)
    } else if v.abs() >= 100.0 {
        format!("{:.0}", v)
    } else if v.abs() >= 1.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_cover_range() {
        let values: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let bins = bin_values(&values, 30);
        assert_eq!(bins.len(), 30);
        assert!(bins.iter().all(|b| b.count == 1));
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 30);
    }

    #[test]
    fn test_box_stats_split_outliers() {
        let b = BoxStats::from_values("S1", &[1.0, 2.0, 3.0, 4.0, 5.0, 50.0]).unwrap();
        assert_eq!(b.outliers, vec![50.0]);
        assert_eq!(b.upper_whisker, 5.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert!(BoxStats::from_values("empty", &[f64::NAN]).is_none());
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_step(10.0, 5.0), 2.0);
        assert_eq!(nice_step(100.0, 10.0), 10.0);
        assert_eq!(ticks(0.0, 10.0, 5.0), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(format_tick(4.0), "4");
        assert_eq!(format_tick(0.25), "0.25");
    }

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp(0.0), [255, 255, 255]);
        assert_eq!(ramp(1.0), PRIMARY_COLOR);
        assert_eq!(hex(SECONDARY_COLOR), "#308AAD");
    }
}
