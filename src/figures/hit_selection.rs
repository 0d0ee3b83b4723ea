//! Proteins standing out from the rest of their sample

use std::collections::BTreeSet;

use egui::Ui;

use super::{radio_choice, window_slider, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::hit_selection::{hit_selection, sort_by_row_max_desc, HitMode, HitParams};
use crate::chart::{Chart, Heatmap};
use crate::config::Limits;
use crate::data::protein_id;
use crate::data::table::{Cell, DataTable, LabeledMatrix};

pub const TITLE: &str = "Hit Selection Mapping Protein Outliers";

/// Peptide × run intensities; `proteins[i]` is the accession owning row `i`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeptideMatrix {
    pub matrix: LabeledMatrix,
    pub proteins: Vec<String>,
}

impl PeptideMatrix {
    pub fn n_proteins(&self) -> usize {
        self.n_proteins_in(None)
    }

    /// Distinct proteins, counting only those in `keep` when a list is given
    pub fn n_proteins_in(&self, keep: Option<&BTreeSet<String>>) -> usize {
        self.proteins
            .iter()
            .filter(|p| keep.map_or(true, |keep| keep.contains(*p)))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitSelectionParams {
    pub start: usize,
    pub mode: HitMode,
    pub min_peptides: usize,
    pub max_nan_values: usize,
}

impl HitSelectionParams {
    pub fn from_limits(limits: &Limits) -> Self {
        Self {
            start: 0,
            mode: HitMode::All,
            min_peptides: limits.min_peptides_hit_selection,
            max_nan_values: limits.max_nan_values_hit_selection,
        }
    }
}

impl Default for HitSelectionParams {
    fn default() -> Self {
        Self::from_limits(&Limits::default())
    }
}

pub fn is_available(quant_peptides: &DataTable) -> bool {
    !quant_peptides.is_empty()
}

/// One row per (peptide, accession): shared peptides count for every protein
pub fn preprocess(quant_peptides: DataTable) -> PeptideMatrix {
    let Ok(mut table) = quant_peptides.explode("Protein", ';') else {
        return PeptideMatrix::default();
    };
    table.drop_columns(&["numFragments"]);
    let Ok(proteins) = table.text_column("Protein") else {
        return PeptideMatrix::default();
    };
    let runs: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !matches!(*c, "Peptide" | "Protein"))
        .collect();
    match LabeledMatrix::from_table(&table, "Peptide", &runs) {
        Ok(matrix) => PeptideMatrix {
            matrix,
            proteins: proteins.iter().map(|p| protein_id::accession(p)).collect(),
        },
        Err(e) => {
            log::warn!("Hit selection input unusable: {}", e);
            PeptideMatrix::default()
        }
    }
}

pub fn build(data: &PeptideMatrix, params: &HitSelectionParams, ctx: &FigureContext) -> FigureOutput {
    let hits = hit_selection(
        &data.matrix,
        &data.proteins,
        &HitParams {
            min_peptides: params.min_peptides,
            max_nan_values: params.max_nan_values,
            sigma: ctx.limits.hit_selection_sigma,
        },
    );
    let selected = sort_by_row_max_desc(&hits.select(params.mode));
    let shown = match ctx.custom_filter {
        Some(keep) => {
            let idx: Vec<usize> = (0..selected.n_rows())
                .filter(|i| keep.contains(&selected.rows[*i]))
                .collect();
            selected.select_rows(&idx)
        }
        None => selected.clone(),
    };
    FigureOutput::new(
        vec![Chart::Heatmap(Heatmap {
            title: String::new(),
            matrix: shown.row_window(params.start, ctx.limits.heatmap_page_size),
            z_range: Some((0.0, 1.0)),
        })],
        selected.to_table("Protein"),
    )
}

fn controls(ui: &mut Ui, params: &mut HitSelectionParams, data: &PeptideMatrix, ctx: &FigureContext) -> bool {
    let total = data.n_proteins_in(ctx.custom_filter);
    let mut changed = window_slider(ui, &mut params.start, total, ctx.limits.heatmap_page_size, "proteins");
    changed |= radio_choice(
        ui,
        "Select which Proteins to show",
        &mut params.mode,
        &HitMode::ALL,
        HitMode::label,
    );
    ui.label("Minimum Number of Peptides for a valid Protein");
    changed |= ui
        .add(egui::DragValue::new(&mut params.min_peptides).range(1..=100))
        .changed();
    ui.label("Maximum Number of NaN values for a Peptide across Samples");
    changed |= ui
        .add(egui::DragValue::new(&mut params.max_nan_values).range(0..=data.matrix.n_cols()))
        .changed();
    changed
}

pub fn create(dataset: &str, quant_peptides: DataTable, limits: &Limits) -> Figure<PeptideMatrix, HitSelectionParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Hit Selection", dataset)
            .description(
                "A hit selection algorithm takes a peptide intensity dataframe and log scales as \
                 well as median normalizes it. It then calculates how many peptides are 2 \
                 standard deviations above or below the mean and reports the associated protein. \
                 This plot shows all values above or below the mean.",
            )
            .size(500.0, 900.0)
            .custom_proteins(),
        quant_peptides,
        preprocess,
        FigureSpec {
            build,
            controls,
            summary: None,
        },
    )
    .with_params(HitSelectionParams::from_limits(limits))
}

/// Peptide table in the quant layout, for tests elsewhere in the crate
#[cfg(test)]
pub(crate) fn sample_quant_peptides() -> DataTable {
    let mut rows = Vec::new();
    for p in 0..10 {
        for k in 0..2 {
            let s1 = if p == 0 { 1e5 } else { 100.0 };
            let s2 = if p == 9 { 1.0 } else { 100.0 };
            rows.push(vec![
                Cell::text(format!("PEP{}_{}", p, k)),
                Cell::text(format!("sp|P{}|G{}_HUMAN", p, p)),
                Cell::number(6.0),
                Cell::number(s1),
                Cell::number(s2),
            ]);
        }
    }
    DataTable::new(
        vec![
            "Peptide".into(),
            "Protein".into(),
            "numFragments".into(),
            "S1".into(),
            "S2".into(),
        ],
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preprocess_explodes_shared_peptides() {
        let table = DataTable::new(
            vec!["Peptide".into(), "Protein".into(), "numFragments".into(), "S1".into()],
            vec![vec![
                Cell::text("PEPA"),
                Cell::text("sp|P1|A_HUMAN;sp|P2|B_HUMAN"),
                Cell::number(4.0),
                Cell::number(10.0),
            ]],
        );
        let data = preprocess(table);
        assert_eq!(data.matrix.rows, vec!["PEPA", "PEPA"]);
        assert_eq!(data.matrix.columns, vec!["S1"]);
        assert_eq!(data.proteins, vec!["P1", "P2"]);
        assert_eq!(data.n_proteins(), 2);
    }

    #[test]
    fn test_preprocessing_exploded_input_again_is_stable() {
        let input = sample_quant_peptides();
        let data = preprocess(input.clone());
        assert_eq!(preprocess(input.clone()), data);

        let exploded = input.explode("Protein", ';').unwrap();
        assert_eq!(preprocess(exploded), data);
    }

    #[test]
    fn test_protein_count_follows_custom_list() {
        let data = preprocess(sample_quant_peptides());
        assert_eq!(data.n_proteins_in(None), 10);
        // P42 is not measured, so it does not widen the slider
        let keep: BTreeSet<String> = ["P1".to_string(), "P9".to_string(), "P42".to_string()].into();
        assert_eq!(data.n_proteins_in(Some(&keep)), 2);
    }

    #[test]
    fn test_above_mean_hits_sorted_first() {
        let data = preprocess(sample_quant_peptides());
        let limits = Limits::default();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: None,
        };
        let params = HitSelectionParams {
            mode: HitMode::AboveMean,
            ..HitSelectionParams::from_limits(&limits)
        };
        let out = build(&data, &params, &ctx);
        let Chart::Heatmap(h) = &out.charts[0] else {
            panic!("expected a heatmap");
        };
        assert_eq!(h.z_range, Some((0.0, 1.0)));
        assert_eq!(h.matrix.rows[0], "P0");
        assert_eq!(h.matrix.values[0], vec![1.0, 0.0]);
        assert_eq!(out.table.n_rows(), 10);
    }

    #[test]
    fn test_custom_list_limits_rows() {
        let data = preprocess(sample_quant_peptides());
        let limits = Limits::default();
        let keep: BTreeSet<String> = ["P9".to_string()].into();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: Some(&keep),
        };
        let out = build(&data, &HitSelectionParams::default(), &ctx);
        let Chart::Heatmap(h) = &out.charts[0] else {
            panic!("expected a heatmap");
        };
        assert_eq!(h.matrix.rows, vec!["P9"]);
        assert_eq!(h.matrix.values[0], vec![0.0, 1.0]);
    }
}
