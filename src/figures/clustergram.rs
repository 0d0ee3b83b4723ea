//! log10 peptide intensities clustered on both axes

use std::collections::BTreeSet;

use egui::Ui;

use super::{window_slider, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::clustering::single_linkage;
use crate::analysis::normalize;
use crate::analysis::pca::Pca;
use crate::chart::{Chart, Clustergram};
use crate::data::condition_map::ConditionMap;
use crate::data::table::{DataTable, LabeledMatrix};

pub const TITLE: &str = "Clustergram Plot mapping the log10 Peptide Intensities for each Sample";

const DESCRIPTION: &str = "A clustergram showing the top {} log10 peptide intensities (y-axis) for \
     each sample/bio replicate (x-axis) sorted by: {}. The dendrograms on each side cluster the \
     data by peptides and sample similarity on the y- and x-axis respectively. The cluster method \
     used is single linkage.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    PcaInfluence,
    Chronological,
}

impl SortBy {
    pub const ALL: [SortBy; 2] = [SortBy::PcaInfluence, SortBy::Chronological];

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::PcaInfluence => "PCA Most Influential Peptides",
            SortBy::Chronological => "Chronological",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClustergramInput {
    pub quant_peptides: DataTable,
    pub conditions: ConditionMap,
}

#[derive(Debug, Clone, Default)]
pub struct ClustergramData {
    /// Peptide × condition intensities
    pub matrix: LabeledMatrix,
    /// Fitted with runs as observations
    pub pca: Option<Pca>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClustergramParams {
    pub sort_by: SortBy,
    pub start: usize,
    pub component: usize,
}

/// Needs peptide rows and at least two run columns
pub fn is_available(quant_peptides: &DataTable) -> bool {
    let runs = quant_peptides
        .columns
        .iter()
        .filter(|c| !matches!(c.as_str(), "Peptide" | "Protein" | "numFragments"))
        .count();
    !quant_peptides.is_empty() && runs >= 2
}

pub fn preprocess(input: ClustergramInput) -> ClustergramData {
    let runs: Vec<&str> = input
        .quant_peptides
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !matches!(*c, "Peptide" | "Protein" | "numFragments"))
        .collect();
    let Ok(matrix) = LabeledMatrix::from_table(&input.quant_peptides, "Peptide", &runs) else {
        return ClustergramData::default();
    };
    let mut matrix = matrix.dedup_rows();
    if !input.conditions.is_empty() {
        let known: BTreeSet<String> = input.conditions.labels().cloned().collect();
        matrix = matrix.retain_columns(&known);
    }
    let pca = Pca::fit(&matrix.transpose(), 3);
    ClustergramData { matrix, pca }
}

/// Rows to show, in matrix order for chronological paging
pub fn selected_rows(data: &ClustergramData, params: &ClustergramParams, page: usize) -> Vec<usize> {
    match (params.sort_by, &data.pca) {
        (SortBy::PcaInfluence, Some(pca)) => pca.most_influential(params.component, page),
        _ => {
            let start = params.start.min(data.matrix.n_rows());
            (start..(start + page).min(data.matrix.n_rows())).collect()
        }
    }
}

fn impute_zero(m: &LabeledMatrix) -> Vec<Vec<f64>> {
    m.values
        .iter()
        .map(|r| r.iter().map(|v| if v.is_finite() { *v } else { 0.0 }).collect())
        .collect()
}

pub fn build(data: &ClustergramData, params: &ClustergramParams, ctx: &FigureContext) -> FigureOutput {
    let page = ctx.limits.clustergram_page_size;
    let window = data.matrix.select_rows(&selected_rows(data, params, page));
    let scaled = normalize::log_transform(&window, 10.0);

    let rows = single_linkage(&impute_zero(&scaled));
    let cols = single_linkage(&impute_zero(&scaled.transpose()));
    let ordered = scaled
        .select_rows(&rows.leaf_order())
        .select_columns(&cols.leaf_order());

    let mut out = FigureOutput::new(
        vec![Chart::Clustergram(Clustergram {
            title: String::new(),
            matrix: ordered,
            row_links: rows.links(),
            col_links: cols.links(),
        })],
        data.matrix.to_table("Peptide"),
    );
    out.placeholders = vec![DESCRIPTION
        .replacen("{}", &page.to_string(), 1)
        .replacen("{}", params.sort_by.label(), 1)];
    out
}

fn controls(ui: &mut Ui, params: &mut ClustergramParams, data: &ClustergramData, ctx: &FigureContext) -> bool {
    let before = params.clone();
    egui::ComboBox::from_label("Sort By")
        .selected_text(params.sort_by.label())
        .show_ui(ui, |ui| {
            for choice in SortBy::ALL {
                ui.selectable_value(&mut params.sort_by, choice, choice.label());
            }
        });
    let mut changed = false;
    match (params.sort_by, &data.pca) {
        (SortBy::PcaInfluence, Some(pca)) => {
            egui::ComboBox::from_label("PCA Dimension")
                .selected_text((params.component + 1).to_string())
                .show_ui(ui, |ui| {
                    for c in 0..pca.n_components() {
                        ui.selectable_value(&mut params.component, c, (c + 1).to_string());
                    }
                });
        }
        _ => {
            changed |= window_slider(
                ui,
                &mut params.start,
                data.matrix.n_rows(),
                ctx.limits.clustergram_page_size,
                "peptides at a time",
            );
        }
    }
    changed || before != *params
}

pub fn create(dataset: &str, input: ClustergramInput) -> Figure<ClustergramData, ClustergramParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Peptide Intensities Clustergram", dataset)
            .description(DESCRIPTION)
            .size(750.0, 1000.0),
        input,
        preprocess,
        FigureSpec {
            build,
            controls,
            summary: None,
        },
    )
}
