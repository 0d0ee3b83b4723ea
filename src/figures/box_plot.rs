//! Peptide intensity distributions per sample, raw and normalized

use egui::Ui;

use super::{radio_choice, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::normalize::{self, SampleNormalization};
use crate::analysis::stats;
use crate::chart::{primary, BoxChart, BoxStats, Chart};
use crate::data::table::{DataTable, LabeledMatrix};

pub const TITLE: &str = "Box Plot of Raw/Normalized Peptide Intensities for each Sample";

#[derive(Debug, Clone, Default)]
pub struct BoxPlotInput {
    pub results: DataTable,
    pub normalized: DataTable,
}

/// Peptide × sample intensity matrices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxPlotData {
    pub raw: LabeledMatrix,
    pub normalized: LabeledMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelParams {
    pub filter_outliers: bool,
    pub normalization: SampleNormalization,
    pub log2: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxPlotParams {
    pub raw: PanelParams,
    pub normalized: PanelParams,
}

impl Default for BoxPlotParams {
    fn default() -> Self {
        Self {
            raw: PanelParams {
                filter_outliers: true,
                normalization: SampleNormalization::None,
                log2: true,
            },
            normalized: PanelParams {
                filter_outliers: true,
                normalization: SampleNormalization::None,
                log2: false,
            },
        }
    }
}

pub fn is_available(results: &DataTable, normalized: &DataTable) -> bool {
    !(results.is_empty() || normalized.is_empty())
}

pub fn preprocess(input: BoxPlotInput) -> BoxPlotData {
    BoxPlotData {
        raw: input
            .results
            .pivot("Peptide", "Condition", "Intensity")
            .unwrap_or_default(),
        normalized: input
            .normalized
            .pivot("PEPTIDE", "originalRUN", "ABUNDANCE")
            .unwrap_or_default(),
    }
}

/// Normalize, log scale, then drop outliers, in that order
pub fn transform(m: &LabeledMatrix, params: &PanelParams) -> LabeledMatrix {
    let mut out = params.normalization.apply(m);
    if params.log2 {
        out = normalize::log_transform(&out, 2.0);
    }
    if params.filter_outliers {
        out = stats::filter_outliers(&out);
    }
    out
}

fn box_chart(m: &LabeledMatrix, log2: bool) -> Chart {
    Chart::Box(BoxChart {
        title: String::new(),
        boxes: (0..m.n_cols())
            .filter_map(|j| BoxStats::from_values(&m.columns[j], &m.column(j)))
            .collect(),
        y_label: if log2 { "log2 Intensity" } else { "Intensity" }.into(),
        color: primary(),
    })
}

pub fn build(data: &BoxPlotData, params: &BoxPlotParams, _ctx: &FigureContext) -> FigureOutput {
    let raw = transform(&data.raw, &params.raw);
    let normalized = transform(&data.normalized, &params.normalized);
    FigureOutput::new(
        vec![
            box_chart(&raw, params.raw.log2),
            box_chart(&normalized, params.normalized.log2),
        ],
        data.raw.to_table("Peptide"),
    )
}

fn panel_controls(ui: &mut Ui, heading: &str, p: &mut PanelParams) -> bool {
    ui.label(egui::RichText::new(heading).strong());
    let mut changed = ui.checkbox(&mut p.filter_outliers, "Filter outliers").changed();
    changed |= ui.checkbox(&mut p.log2, "Log2 scale").changed();
    changed |= radio_choice(
        ui,
        "Select Normalization",
        &mut p.normalization,
        &SampleNormalization::ALL,
        SampleNormalization::label,
    );
    changed
}

fn controls(ui: &mut Ui, params: &mut BoxPlotParams, _data: &BoxPlotData, _ctx: &FigureContext) -> bool {
    let mut changed = panel_controls(ui, "Raw intensities", &mut params.raw);
    ui.add_space(4.0);
    changed |= panel_controls(ui, "Normalized intensities", &mut params.normalized);
    changed
}

pub fn create(dataset: &str, input: BoxPlotInput) -> Figure<BoxPlotData, BoxPlotParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Peptide Intensities Box Plot", dataset)
            .panels(&[
                (
                    "Box Plot of Raw Peptide Intensities for each Sample",
                    "A box plot showing the log2 peptide intensities for each sample/replicate. \
                     The outliers are filtered out and the ends of the box represent the lower \
                     (25th) and upper (75th) quartiles, while the median (second quartile) is \
                     marked by a line inside the box. If the distribution of one sample deviates \
                     from the others, that sample is an outlier.",
                ),
                (
                    "Box Plot of Normalized Peptide Intensities for each Sample",
                    "A box plot showing the same data as above but the intensities have been log2 \
                     transformed and normalized.",
                ),
            ])
            .size(750.0, 900.0),
        input,
        preprocess,
        FigureSpec {
            build,
            controls,
            summary: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::data::table::Cell;
    use pretty_assertions::assert_eq;

    fn input() -> BoxPlotInput {
        let t = |s: &str| Cell::text(s);
        let mut results = Vec::new();
        for (k, cond) in ["CondA", "CondB"].iter().enumerate() {
            for i in 1..=8 {
                results.push(vec![
                    t(*cond),
                    t(format!("PEP{}", i).as_str()),
                    Cell::number(2f64.powi(i + k as i32)),
                ]);
            }
        }
        BoxPlotInput {
            results: DataTable::new(
                vec!["Condition".into(), "Peptide".into(), "Intensity".into()],
                results,
            ),
            normalized: DataTable::new(
                vec!["PEPTIDE".into(), "originalRUN".into(), "ABUNDANCE".into()],
                vec![
                    vec![t("PEP1"), t("CondA"), Cell::number(10.0)],
                    vec![t("PEP2"), t("CondA"), Cell::number(12.0)],
                    vec![t("PEP1"), t("CondB"), Cell::number(11.0)],
                ],
            ),
        }
    }

    #[test]
    fn test_preprocess_pivots_both_tables() {
        let data = preprocess(input());
        assert_eq!(data.raw.columns, vec!["CondA", "CondB"]);
        assert_eq!(data.raw.n_rows(), 8);
        assert_eq!(data.normalized.rows, vec!["PEP1", "PEP2"]);
        assert!(data.normalized.values[1][1].is_nan());
    }

    #[test]
    fn test_two_panels_with_log2_on_raw_only() {
        let data = preprocess(input());
        let limits = Limits::default();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: None,
        };
        let out = build(&data, &BoxPlotParams::default(), &ctx);
        assert_eq!(out.charts.len(), 2);
        let Chart::Box(raw) = &out.charts[0] else {
            panic!("expected a box chart");
        };
        // log2 of 2^1..2^8 has median 4.5
        assert_eq!(raw.boxes[0].median, 4.5);
        assert_eq!(raw.boxes[1].median, 5.5);
        let Chart::Box(norm) = &out.charts[1] else {
            panic!("expected a box chart");
        };
        assert_eq!(norm.boxes[0].median, 11.0);
        assert_eq!(norm.y_label, "Intensity");
    }
}
