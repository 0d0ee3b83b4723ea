//! Protein intensities per run as a paged heatmap

use std::collections::BTreeSet;

use egui::Ui;

use super::{radio_choice, window_slider, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::normalize::AxisNormalization;
use crate::chart::{Chart, Heatmap};
use crate::data::protein_id;
use crate::data::table::{DataTable, LabeledMatrix};

pub const TITLE: &str = "Heatmap Plot mapping the Protein Intensities";

const NON_RUN_COLUMNS: [&str; 3] = ["Protein", "NumPeptides", "PeptideSequences"];

/// Intensity matrix with rows labeled by short protein name. `accessions[i]`
/// holds every accession behind row `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProteinMatrix {
    pub matrix: LabeledMatrix,
    pub accessions: Vec<Vec<String>>,
}

impl ProteinMatrix {
    /// Rows with at least one accession in `keep`, or all rows without a filter
    pub fn kept_rows(&self, keep: Option<&BTreeSet<String>>) -> Vec<usize> {
        (0..self.matrix.n_rows())
            .filter(|i| {
                keep.map_or(true, |keep| {
                    self.accessions
                        .get(*i)
                        .is_some_and(|accs| accs.iter().any(|a| keep.contains(a)))
                })
            })
            .collect()
    }

    /// Normalizes over every protein, then keeps the rows in `keep`
    pub fn normalized(&self, normalization: AxisNormalization, keep: Option<&BTreeSet<String>>) -> LabeledMatrix {
        let normalized = normalization.apply(&self.matrix);
        match keep {
            Some(_) => normalized.select_rows(&self.kept_rows(keep)),
            None => normalized,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProteinHeatmapParams {
    pub start: usize,
    pub normalization: AxisNormalization,
}

pub fn is_available(quant_proteins: &DataTable) -> bool {
    !quant_proteins.is_empty()
}

pub fn preprocess(quant_proteins: DataTable) -> ProteinMatrix {
    let runs: Vec<&str> = quant_proteins
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !NON_RUN_COLUMNS.contains(c))
        .collect();
    let Ok(mut matrix) = LabeledMatrix::from_table(&quant_proteins, "Protein", &runs) else {
        return ProteinMatrix::default();
    };
    let accessions = matrix.rows.iter().map(|p| protein_id::accessions(p)).collect();
    matrix.rows = matrix.rows.iter().map(|p| protein_id::short_name(p)).collect();
    ProteinMatrix { matrix, accessions }
}

pub fn build(data: &ProteinMatrix, params: &ProteinHeatmapParams, ctx: &FigureContext) -> FigureOutput {
    let shown = data.normalized(params.normalization, ctx.custom_filter);
    let window = shown.row_window(params.start, ctx.limits.heatmap_page_size);
    FigureOutput::new(
        vec![Chart::Heatmap(Heatmap {
            title: String::new(),
            matrix: window,
            z_range: None,
        })],
        data.matrix.to_table("Protein"),
    )
}

fn controls(ui: &mut Ui, params: &mut ProteinHeatmapParams, data: &ProteinMatrix, ctx: &FigureContext) -> bool {
    let rows = data.kept_rows(ctx.custom_filter).len();
    let mut changed = window_slider(ui, &mut params.start, rows, ctx.limits.heatmap_page_size, "proteins");
    changed |= radio_choice(
        ui,
        "Select normalization",
        &mut params.normalization,
        &AxisNormalization::ALL,
        AxisNormalization::label,
    );
    changed
}

pub fn create(dataset: &str, quant_proteins: DataTable) -> Figure<ProteinMatrix, ProteinHeatmapParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Protein Intensities Heatmap", dataset)
            .description(
                "A heatmap plotting the intensities of each detected Protein. The data is row \
                 normalized and sorted by the protein with the highest row-normalized intensity \
                 compared to the others.",
            )
            .size(500.0, 900.0)
            .custom_proteins(),
        quant_proteins,
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

    fn quant_proteins() -> DataTable {
        let t = |s: &str| Cell::text(s);
        DataTable::new(
            vec![
                "Protein".into(),
                "NumPeptides".into(),
                "PeptideSequences".into(),
                "S1".into(),
                "S2".into(),
            ],
            vec![
                vec![t("sp|P1|ACTB_HUMAN"), Cell::number(2.0), t("AA;BB"), Cell::number(1.0), Cell::number(3.0)],
                vec![t("sp|P2|TUBB_HUMAN;sp|P3|TUBA_HUMAN"), Cell::number(1.0), t("CC"), Cell::number(2.0), Cell::number(2.0)],
                vec![t("sp|P4|H2A_HUMAN"), Cell::number(1.0), t("DD"), Cell::number(5.0), Cell::number(0.0)],
            ],
        )
    }

    #[test]
    fn test_rows_use_short_names_and_keep_accessions() {
        let data = preprocess(quant_proteins());
        assert_eq!(data.matrix.rows, vec!["ACTB", "TUBA", "H2A"]);
        assert_eq!(data.matrix.columns, vec!["S1", "S2"]);
        assert_eq!(data.accessions[1], vec!["P2", "P3"]);
    }

    #[test]
    fn test_row_normalized_window() {
        let data = preprocess(quant_proteins());
        let mut limits = Limits::default();
        limits.heatmap_page_size = 2;
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: None,
        };
        let params = ProteinHeatmapParams {
            start: 1,
            normalization: AxisNormalization::Row,
        };
        let out = build(&data, &params, &ctx);
        let Chart::Heatmap(h) = &out.charts[0] else {
            panic!("expected a heatmap");
        };
        assert_eq!(h.matrix.rows, vec!["TUBA", "H2A"]);
        assert_eq!(h.matrix.values[0], vec![0.5, 0.5]);
        assert_eq!(h.matrix.values[1], vec![1.0, 0.0]);
        assert_eq!(out.table.n_rows(), 3);
    }

    #[test]
    fn test_custom_accessions_restrict_rows() {
        let data = preprocess(quant_proteins());
        let limits = Limits::default();
        let custom: BTreeSet<String> = ["P3".to_string(), "P4".to_string()].into();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: Some(&custom),
        };
        let params = ProteinHeatmapParams {
            start: 0,
            normalization: AxisNormalization::None,
        };
        let out = build(&data, &params, &ctx);
        let Chart::Heatmap(h) = &out.charts[0] else {
            panic!("expected a heatmap");
        };
        assert_eq!(h.matrix.rows, vec!["TUBA", "H2A"]);
        assert_eq!(h.matrix.values[1], vec![5.0, 0.0]);
    }

    #[test]
    fn test_column_normalization_uses_all_proteins_before_restricting() {
        let data = preprocess(quant_proteins());
        let limits = Limits::default();
        let custom: BTreeSet<String> = ["P4".to_string()].into();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: Some(&custom),
        };
        let params = ProteinHeatmapParams {
            start: 0,
            normalization: AxisNormalization::Column,
        };
        let out = build(&data, &params, &ctx);
        let Chart::Heatmap(h) = &out.charts[0] else {
            panic!("expected a heatmap");
        };
        // S1 sums to 8 and S2 to 5 over all three proteins
        assert_eq!(h.matrix.rows, vec!["H2A"]);
        assert_eq!(h.matrix.values[0], vec![0.625, 0.0]);
        assert_eq!(data.kept_rows(Some(&custom)), vec![2]);
        assert_eq!(data.kept_rows(None).len(), 3);
    }
}
