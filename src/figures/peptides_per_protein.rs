//! Distribution of the number of peptides detected per protein

use egui::Ui;

use super::{no_controls, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::stats;
use crate::chart::{bin_values, primary, Chart, Histogram};
use crate::data::table::{Cell, DataTable};
use crate::gui::table_view;

pub const TITLE: &str =
    "Histogram Plot mapping the Distribution of the Number of Peptides detected for each Protein";

#[derive(Debug, Clone, Default)]
pub struct PeptideCountsInput {
    pub quant_proteins: DataTable,
    /// Counts above this land in the last bin
    pub cap: usize,
}

/// Clamped peptide count per protein
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeptideCounts {
    pub counts: Vec<f64>,
    pub cap: usize,
}

pub fn is_available(quant_proteins: &DataTable) -> bool {
    !quant_proteins.is_empty()
}

pub fn preprocess(input: PeptideCountsInput) -> PeptideCounts {
    let cap = input.cap as f64;
    let counts = input
        .quant_proteins
        .number_column("NumPeptides")
        .unwrap_or_default()
        .into_iter()
        .map(|n| if n > cap { cap } else { n })
        .collect();
    PeptideCounts {
        counts,
        cap: input.cap,
    }
}

impl PeptideCounts {
    pub fn to_table(&self) -> DataTable {
        DataTable::new(
            vec!["NumPeptides".into()],
            self.counts.iter().map(|n| vec![Cell::number(*n)]).collect(),
        )
    }
}

pub fn build(data: &PeptideCounts, _params: &(), _ctx: &FigureContext) -> FigureOutput {
    let chart = Chart::Histogram(Histogram {
        title: String::new(),
        bins: bin_values(&data.counts, data.cap.max(1)),
        x_label: "# of Peptides".into(),
        y_label: "Number of Proteins".into(),
        color: primary(),
    });
    FigureOutput::new(vec![chart], data.to_table())
}

fn summary(ui: &mut Ui, data: &PeptideCounts, _params: &(), _output: &FigureOutput) {
    egui::CollapsingHeader::new("Show Descriptive Stats")
        .id_salt("peptides_per_protein_stats")
        .show(ui, |ui| {
            let table = stats::describe(&data.counts).to_table("NumPeptides");
            table_view::show_table(ui, "peptides_per_protein_describe", &table, 240.0);
        });
}

pub fn create(dataset: &str, input: PeptideCountsInput) -> Figure<PeptideCounts, ()> {
    Figure::new(
        FigureMeta::new(TITLE, "Number of Peptides per Protein", dataset)
            .description(
                "A histogram plotting the distribution of the number of peptides detected for \
                 each protein. It uses the data from the final report and therefore represents \
                 the data across all runs. The last bar to the right represents a catch-all and \
                 includes everything above this value. Ideally we should have more than two \
                 peptides for each protein but the more the better. The more peptides we have, \
                 the more confident we are in a detection. Having only one peptide could be due \
                 to randomness.",
            )
            .size(900.0, 750.0),
        input,
        preprocess,
        FigureSpec {
            build,
            controls: no_controls,
            summary: Some(summary),
        },
    )
}
