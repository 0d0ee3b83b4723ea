//! GO cellular component enrichment for a chosen subset of samples

use std::collections::BTreeSet;

use egui::Ui;

use super::{Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::go_enrichment::{results_table, test_enrichment, GoAnnotations, GO_TERMS};
use crate::chart::{palette, BarChart, BarSeries, Chart};
use crate::data::condition_map::ConditionMap;
use crate::data::protein_id;
use crate::data::table::{DataTable, LabeledMatrix};

pub const TITLE: &str = "Bar plot showing the GO term enrichment of the proteins in each sample";

#[derive(Debug, Clone, Default)]
pub struct GoInput {
    pub quant_proteins: DataTable,
    pub metadata: DataTable,
    pub go_annotations: DataTable,
    pub conditions: ConditionMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleInfo {
    pub label: String,
    pub fraction: String,
    pub compound: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoData {
    /// Accession × sample intensities
    pub matrix: LabeledMatrix,
    pub annotations: GoAnnotations,
    pub samples: Vec<SampleInfo>,
}

impl GoData {
    pub fn fractions(&self) -> BTreeSet<String> {
        self.samples.iter().map(|s| s.fraction.clone()).collect()
    }

    pub fn compounds(&self) -> BTreeSet<String> {
        self.samples.iter().map(|s| s.compound.clone()).collect()
    }

    /// Sample labels matching both selections and present in the matrix
    pub fn matching_samples(&self, params: &GoParams) -> BTreeSet<String> {
        self.samples
            .iter()
            .filter(|s| params.fractions.contains(&s.fraction) && params.compounds.contains(&s.compound))
            .map(|s| s.label.clone())
            .filter(|label| self.matrix.columns.contains(label))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoParams {
    pub fractions: BTreeSet<String>,
    pub compounds: BTreeSet<String>,
    pub terms: BTreeSet<String>,
}

impl Default for GoParams {
    fn default() -> Self {
        Self {
            fractions: BTreeSet::new(),
            compounds: BTreeSet::new(),
            terms: GO_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

pub fn is_available(quant_proteins: &DataTable, metadata: &DataTable, go_annotations: &DataTable) -> bool {
    !(quant_proteins.is_empty() || metadata.is_empty() || go_annotations.is_empty())
}

pub fn preprocess(input: GoInput) -> GoData {
    let runs: Vec<&str> = input
        .quant_proteins
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !matches!(*c, "Protein" | "NumPeptides" | "PeptideSequences"))
        .collect();
    let mut matrix = LabeledMatrix::from_table(&input.quant_proteins, "Protein", &runs).unwrap_or_default();
    matrix.rows = matrix.rows.iter().map(|p| protein_id::accession(p)).collect();

    let annotations = GoAnnotations::from_table(&input.go_annotations).unwrap_or_else(|e| {
        log::warn!("GO annotations unusable: {}", e);
        GoAnnotations::default()
    });

    let column = |name: &str| input.metadata.text_column(name).unwrap_or_default();
    let (runs, fractions, compounds) = (
        column("Run"),
        column("Extraction Fraction"),
        column("Working Compound"),
    );
    let samples = runs
        .iter()
        .zip(fractions)
        .zip(compounds)
        .map(|((run, fraction), compound)| SampleInfo {
            label: input.conditions.label(run),
            fraction,
            compound,
        })
        .collect();

    GoData {
        matrix,
        annotations,
        samples,
    }
}

pub fn build(data: &GoData, params: &GoParams, _ctx: &FigureContext) -> FigureOutput {
    let samples = data.matching_samples(params);
    if samples.is_empty() {
        return FigureOutput::default();
    }
    let subset = data.matrix.retain_columns(&samples);
    let terms: Vec<String> = GO_TERMS
        .iter()
        .filter(|t| params.terms.contains(**t))
        .map(|t| t.to_string())
        .collect();
    let results = test_enrichment(&subset, &data.annotations, &terms);

    let categories: Vec<String> = terms
        .iter()
        .filter(|t| results.iter().any(|r| &r.term == *t))
        .cloned()
        .collect();
    let series = subset
        .columns
        .iter()
        .enumerate()
        .map(|(i, sample)| BarSeries {
            name: sample.clone(),
            values: categories
                .iter()
                .map(|term| {
                    results
                        .iter()
                        .find(|r| &r.term == term && &r.sample == sample)
                        .map(|r| r.neg_log10_p())
                        .unwrap_or(0.0)
                })
                .collect(),
            color: palette(i),
            secondary: false,
        })
        .collect();
    let chart = Chart::Bar(BarChart {
        title: String::new(),
        categories,
        series,
        x_label: "GO Name".into(),
        y_label: "pvalue (-log10)".into(),
        y2_label: None,
    });
    FigureOutput::new(vec![chart], results_table(&results))
}

fn multi_select<'a>(
    ui: &mut Ui,
    label: &str,
    options: impl IntoIterator<Item = &'a String>,
    selected: &mut BTreeSet<String>,
) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new(format!("{} ({} selected)", label, selected.len()))
        .id_salt(label)
        .show(ui, |ui| {
            for option in options {
                let mut on = selected.contains(option);
                if ui.checkbox(&mut on, option.as_str()).changed() {
                    if on {
                        selected.insert(option.clone());
                    } else {
                        selected.remove(option);
                    }
                    changed = true;
                }
            }
        });
    changed
}

fn controls(ui: &mut Ui, params: &mut GoParams, data: &GoData, _ctx: &FigureContext) -> bool {
    let mut changed = multi_select(ui, "Extraction Fractions", &data.fractions(), &mut params.fractions);
    changed |= multi_select(ui, "Working Compounds", &data.compounds(), &mut params.compounds);
    let terms: Vec<String> = GO_TERMS.iter().map(|t| t.to_string()).collect();
    changed |= multi_select(ui, "GO term filters", &terms, &mut params.terms);
    if data.matching_samples(params).is_empty() {
        ui.weak("No sample matches the current selection");
    }
    changed
}

pub fn create(dataset: &str, input: GoInput) -> Figure<GoData, GoParams> {
    Figure::new(
        FigureMeta::new(TITLE, "GO Enrichment", dataset)
            .description(
                "A bar plot showing, for each selected sample, how strongly the proteins of a \
                 cellular component GO term are enriched among the most intense proteins \
                 (one-sided rank-sum test, -log10 p-value). Higher bars mean a stronger \
                 enrichment.",
            )
            .size(900.0, 750.0),
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

    fn input() -> GoInput {
        let t = |s: &str| Cell::text(s);
        let mut proteins = Vec::new();
        for i in 0..12 {
            let nuclear = i < 4;
            let high = if nuclear { 1000.0 + i as f64 } else { 10.0 + i as f64 };
            proteins.push(vec![
                t(format!("sp|P{}|G{}_HUMAN", i, i).as_str()),
                Cell::number(2.0),
                t("AA"),
                Cell::number(high),
                Cell::number(50.0 + i as f64),
            ]);
        }
        GoInput {
            quant_proteins: DataTable::new(
                vec![
                    "Protein".into(),
                    "NumPeptides".into(),
                    "PeptideSequences".into(),
                    "DMSO:1".into(),
                    "Drug:1".into(),
                ],
                proteins,
            ),
            metadata: DataTable::new(
                vec!["Run".into(), "Extraction Fraction".into(), "Working Compound".into()],
                vec![
                    vec![t("r1"), t("Nuclear"), t("DMSO")],
                    vec![t("r2"), t("Cytosol"), t("Drug")],
                ],
            ),
            go_annotations: DataTable::new(
                vec!["Accession".into(), "GO Name".into()],
                (0..4)
                    .map(|i| vec![t(format!("P{}", i).as_str()), t("nucleus")])
                    .collect(),
            ),
            conditions: ConditionMap::from_pairs([("r1", "DMSO:1"), ("r2", "Drug:1")]),
        }
    }

    fn ctx(limits: &Limits) -> FigureContext<'_> {
        FigureContext {
            limits,
            custom_filter: None,
        }
    }

    #[test]
    fn test_nothing_built_until_a_sample_matches() {
        let data = preprocess(input());
        assert_eq!(data.matrix.rows[0], "P0");
        assert_eq!(data.fractions().len(), 2);
        let limits = Limits::default();
        let out = build(&data, &GoParams::default(), &ctx(&limits));
        assert!(out.charts.is_empty());
        assert!(out.table.is_empty());
    }

    #[test]
    fn test_selected_sample_shows_enriched_term() {
        let data = preprocess(input());
        let params = GoParams {
            fractions: ["Nuclear".to_string()].into(),
            compounds: ["DMSO".to_string()].into(),
            ..GoParams::default()
        };
        assert_eq!(data.matching_samples(&params), ["DMSO:1".to_string()].into());

        let limits = Limits::default();
        let out = build(&data, &params, &ctx(&limits));
        let Chart::Bar(bar) = &out.charts[0] else {
            panic!("expected a bar chart");
        };
        assert_eq!(bar.categories, vec!["nucleus"]);
        assert_eq!(bar.series.len(), 1);
        assert_eq!(bar.series[0].name, "DMSO:1");
        // -log10(p) well above 2 for the four top-ranked nuclear proteins
        assert!(bar.series[0].values[0] > 2.0);
        assert_eq!(out.table.n_rows(), 1);
    }
}
