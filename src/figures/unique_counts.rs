//! Unique peptides and proteins per sample

use super::{no_controls, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::chart::{primary, secondary, BarChart, BarSeries, Chart};
use crate::data::table::DataTable;

pub const TITLE: &str =
    "Bar plot showing the number of unique peptides and proteins found in each sample";

pub fn is_available(unique_counts: &DataTable) -> bool {
    !unique_counts.is_empty()
}

/// Counts are used as loaded
pub fn preprocess(table: DataTable) -> DataTable {
    table
}

pub fn build(table: &DataTable, _params: &(), _ctx: &FigureContext) -> FigureOutput {
    let samples = table.text_column("Sample Name").unwrap_or_default();
    let proteins = table.number_column("Unique Proteins").unwrap_or_default();
    let peptides = table.number_column("Unique Peptides").unwrap_or_default();
    let chart = Chart::Bar(BarChart {
        title: String::new(),
        categories: samples,
        series: vec![
            BarSeries {
                name: "Unique Proteins".into(),
                values: proteins,
                color: primary(),
                secondary: false,
            },
            BarSeries {
                name: "Unique Peptides".into(),
                values: peptides,
                color: secondary(),
                secondary: true,
            },
        ],
        x_label: "Sample Name".into(),
        y_label: "Unique Proteins".into(),
        y2_label: Some("Unique Peptides".into()),
    });
    FigureOutput::new(vec![chart], table.clone())
}

pub fn create(dataset: &str, table: DataTable) -> Figure<DataTable, ()> {
    Figure::new(
        FigureMeta::new(TITLE, "# Unique Peptides and Proteins", dataset)
            .description(
                "A bar plot showing the number of unique peptides and proteins found in each sample.",
            )
            .size(900.0, 750.0)
            .inline_table(),
        table,
        preprocess,
        FigureSpec {
            build,
            controls: no_controls,
            summary: None,
        },
    )
}
