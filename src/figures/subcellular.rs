//! Subcellular location enrichment heatmap

use std::collections::HashMap;

use egui::Ui;

use super::{window_slider, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::enrichment::{enrichment_scores, parse_locations, ProteinLocation};
use crate::analysis::normalize;
use crate::chart::{Chart, Heatmap};
use crate::data::protein_id;
use crate::data::table::DataTable;

pub const TITLE: &str = "A heatmap showing the subcellular location enrichment";

#[derive(Debug, Clone, Default)]
pub struct SubcellularInput {
    pub normalized: DataTable,
    pub locations: DataTable,
    pub expected: DataTable,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubcellularData {
    pub records: Vec<ProteinLocation>,
    pub expected: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubcellularParams {
    pub start: usize,
    pub min_max: bool,
}

impl Default for SubcellularParams {
    fn default() -> Self {
        Self {
            start: 0,
            min_max: true,
        }
    }
}

pub fn is_available(normalized: &DataTable, locations: &DataTable, expected: &DataTable) -> bool {
    !(normalized.is_empty() || locations.is_empty() || expected.is_empty())
}

/// Distinct (entry name, sample) pairs with positive abundance, left-joined
/// with their main locations
pub fn preprocess(input: SubcellularInput) -> SubcellularData {
    let locations: HashMap<String, Vec<String>> = match (
        input.locations.text_column("Entry name"),
        input.locations.text_column("Main location"),
    ) {
        (Ok(names), Ok(locs)) => names
            .into_iter()
            .zip(locs)
            .map(|(n, l)| (n, parse_locations(&l)))
            .collect(),
        _ => HashMap::new(),
    };

    let mut records = Vec::new();
    if let (Ok(proteins), Ok(samples), Ok(abundance)) = (
        input.normalized.text_column("PROTEIN"),
        input.normalized.text_column("originalRUN"),
        input.normalized.number_column("ABUNDANCE"),
    ) {
        let mut seen = std::collections::HashSet::new();
        for ((protein, sample), a) in proteins.iter().zip(&samples).zip(&abundance) {
            if !(a.is_finite() && *a > 0.0) {
                continue;
            }
            let name = protein_id::entry_name(protein);
            if seen.insert((name.clone(), sample.clone())) {
                records.push(ProteinLocation {
                    locations: locations.get(&name).cloned().unwrap_or_default(),
                    protein: name,
                    sample: sample.clone(),
                });
            }
        }
    }

    let expected = match (
        input.expected.text_column("Location"),
        input.expected.number_column("Expected Fraction"),
    ) {
        (Ok(locs), Ok(fractions)) => locs.into_iter().zip(fractions).collect(),
        _ => Vec::new(),
    };
    SubcellularData { records, expected }
}

pub fn build(data: &SubcellularData, params: &SubcellularParams, ctx: &FigureContext) -> FigureOutput {
    let scores = enrichment_scores(&data.records, &data.expected);
    let shown = if params.min_max {
        normalize::min_max_columns(&scores)
    } else {
        scores.clone()
    };
    let window = shown.row_window(params.start, ctx.limits.heatmap_page_size);
    FigureOutput::new(
        vec![Chart::Heatmap(Heatmap {
            title: String::new(),
            matrix: window,
            z_range: None,
        })],
        scores.to_table("Location"),
    )
}

fn controls(ui: &mut Ui, params: &mut SubcellularParams, data: &SubcellularData, ctx: &FigureContext) -> bool {
    let rows = data
        .expected
        .iter()
        .filter(|(_, f)| f.is_finite() && *f > 0.0)
        .count();
    let mut changed = window_slider(ui, &mut params.start, rows, ctx.limits.heatmap_page_size, "proteins");
    changed |= ui.checkbox(&mut params.min_max, "Use Min-Max Normalization").changed();
    changed
}

pub fn create(dataset: &str, input: SubcellularInput) -> Figure<SubcellularData, SubcellularParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Subcellular Location Enrichment", dataset)
            .description(
                "A heatmap plotting the enrichment scores for each subcellular location. \
                 Conceptually the enrichment factor metric is simply the measure of how many \
                 more protein we find within a given sample relative to a random distribution.",
            )
            .size(500.0, 1000.0),
        input,
        preprocess,
        FigureSpec {
            build,
            controls,
            summary: None,
        },
    )
}
