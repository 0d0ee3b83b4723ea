//! Pairwise log10 peptide intensities between samples

use egui::Ui;

use super::{Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::{normalize, stats};
use crate::chart::{primary, Chart, ScatterMatrix};
use crate::data::table::{DataTable, LabeledMatrix};

pub const TITLE: &str = "Scatter Matrix Plot of Peptide Intensities for each Sample";

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterMatrixParams {
    pub filter_outliers: bool,
    /// Percent, 0..=100
    pub opacity: u8,
}

impl Default for ScatterMatrixParams {
    fn default() -> Self {
        Self {
            filter_outliers: false,
            opacity: 50,
        }
    }
}

pub fn is_available(results: &DataTable) -> bool {
    !results.is_empty()
}

/// Peptide × sample intensity matrix
pub fn preprocess(results: DataTable) -> LabeledMatrix {
    results
        .pivot("Peptide", "Condition", "Intensity")
        .unwrap_or_default()
}

pub fn build(data: &LabeledMatrix, params: &ScatterMatrixParams, _ctx: &FigureContext) -> FigureOutput {
    let mut scaled = normalize::log_transform(data, 10.0);
    if params.filter_outliers {
        scaled = stats::filter_outliers(&scaled);
    }
    let chart = Chart::ScatterMatrix(ScatterMatrix {
        title: String::new(),
        columns: scaled.columns.clone(),
        values: (0..scaled.n_cols()).map(|j| scaled.column(j)).collect(),
        opacity: f32::from(params.opacity.min(100)) / 100.0,
        color: primary(),
    });
    FigureOutput::new(vec![chart], data.to_table("Peptide"))
}

fn controls(ui: &mut Ui, params: &mut ScatterMatrixParams, _data: &LabeledMatrix, _ctx: &FigureContext) -> bool {
    let mut changed = ui.checkbox(&mut params.filter_outliers, "Filter outliers").changed();
    changed |= ui
        .add(egui::Slider::new(&mut params.opacity, 0..=100).text("Point Opacity"))
        .changed();
    changed
}

pub fn create(dataset: &str, results: DataTable) -> Figure<LabeledMatrix, ScatterMatrixParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Peptide Intensities Scatter Matrix", dataset)
            .description(
                "A scatter matrix plot containing the log10 protein intensities for each sample. \
                 The diagonal displays each sample mapped against itself which is why it is a \
                 straight line. Points falling far from x=y represent outliers. The farther a pair \
                 of samples (a point) falls from x=y, the more uncorrelated it is. In order to fit \
                 outliers the axes are sometimes adjusted and are not necessarily all the same.",
            )
            .size(900.0, 900.0),
        results,
        preprocess,
        FigureSpec {
            build,
            controls,
            summary: None,
        },
    )
}
