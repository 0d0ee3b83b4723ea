//! Overlap of measured proteins with a reference list (nuclear proteins, or
//! the uploaded custom proteins)

use std::collections::BTreeSet;

use super::{no_controls, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::chart::{Chart, Venn};
use crate::data::protein_id;
use crate::data::table::{Cell, DataTable};

pub const TITLE: &str =
    "A Venn Diagram showing the overlap between a list of nuclear proteins and the measured proteins";

#[derive(Debug, Clone, Default)]
pub struct OverlapInput {
    pub results: DataTable,
    pub nuclear: DataTable,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlapData {
    pub measured: BTreeSet<String>,
    pub reference: BTreeSet<String>,
    pub reference_label: String,
}

pub fn is_available(results: &DataTable, nuclear: &DataTable) -> bool {
    !(results.is_empty() || nuclear.is_empty())
}

pub fn preprocess(input: OverlapInput) -> OverlapData {
    let measured = input
        .results
        .text_column("Protein")
        .unwrap_or_default()
        .iter()
        .flat_map(|group| protein_id::accessions(group))
        .filter(|a| !a.is_empty())
        .collect();
    let reference_label = input.nuclear.columns.last().cloned().unwrap_or_default();
    let reference = input
        .nuclear
        .text_column(&reference_label)
        .unwrap_or_default()
        .iter()
        .map(|p| protein_id::accession(p))
        .filter(|a| !a.is_empty())
        .collect();
    OverlapData {
        measured,
        reference,
        reference_label,
    }
}

pub fn build(data: &OverlapData, _params: &(), ctx: &FigureContext) -> FigureOutput {
    let (reference, label) = match ctx.custom_filter {
        Some(custom) => (custom, "Custom Proteins".to_string()),
        None => (&data.reference, data.reference_label.clone()),
    };
    let both: BTreeSet<&String> = reference.intersection(&data.measured).collect();

    let mut rows = Vec::new();
    for p in reference.union(&data.measured) {
        let set = if both.contains(p) {
            "Both"
        } else if reference.contains(p) {
            label.as_str()
        } else {
            "Measured Proteins"
        };
        rows.push(vec![Cell::text(p.clone()), Cell::text(set)]);
    }

    let venn = Venn {
        title: String::new(),
        left_only: reference.len() - both.len(),
        both: both.len(),
        right_only: data.measured.len() - both.len(),
        left_label: label,
        right_label: "Measured Proteins".into(),
    };
    FigureOutput::new(
        vec![Chart::Venn(venn)],
        DataTable::new(vec!["Protein".into(), "Set".into()], rows),
    )
}

pub fn create(dataset: &str, input: OverlapInput) -> Figure<OverlapData, ()> {
    Figure::new(
        FigureMeta::new(TITLE, "Nuclear Protein Overlap", dataset)
            .description(
                "A Venn diagram showing the overlap between a list of nuclear proteins and the \
                 proteins that were measured during these sample runs.",
            )
            .size(800.0, 500.0)
            .custom_proteins(),
        input,
        preprocess,
        FigureSpec {
            build,
            controls: no_controls,
            summary: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    fn input() -> OverlapInput {
        let t = |s: &str| Cell::text(s);
        OverlapInput {
            results: DataTable::new(
                vec!["Run".into(), "Protein".into()],
                vec![
                    vec![t("R1"), t("sp|P1|A_HUMAN")],
                    vec![t("R1"), t("sp|P2|B_HUMAN;sp|P3|C_HUMAN")],
                    vec![t("R2"), t("sp|P1|A_HUMAN")],
                ],
            ),
            nuclear: DataTable::new(
                vec!["Gene".into(), "Nuclear Proteins".into()],
                vec![vec![t("g1"), t("P1")], vec![t("g9"), t("sp|P9|Z_HUMAN")]],
            ),
        }
    }

    #[test]
    fn test_counts_each_region() {
        let data = preprocess(input());
        assert_eq!(data.measured.len(), 3);
        assert_eq!(data.reference_label, "Nuclear Proteins");

        let limits = Limits::default();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: None,
        };
        let out = build(&data, &(), &ctx);
        let Chart::Venn(v) = &out.charts[0] else {
            panic!("expected a venn diagram");
        };
        assert_eq!((v.left_only, v.both, v.right_only), (1, 1, 2));
        assert_eq!(out.table.n_rows(), 4);
    }

    #[test]
    fn test_custom_list_replaces_reference() {
        let data = preprocess(input());
        let custom: BTreeSet<String> = ["P2".to_string(), "P3".to_string()].into();
        let limits = Limits::default();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: Some(&custom),
        };
        let out = build(&data, &(), &ctx);
        let Chart::Venn(v) = &out.charts[0] else {
            panic!("expected a venn diagram");
        };
        assert_eq!(v.left_label, "Custom Proteins");
        assert_eq!((v.left_only, v.both, v.right_only), (0, 2, 1));
    }
}
