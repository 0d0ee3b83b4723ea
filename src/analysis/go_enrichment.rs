//! Gene Ontology (cellular component) enrichment
//!
//! Within each sample the measured proteins are ranked by intensity; a GO
//! term is enriched when its member proteins rank higher than the rest
//! (one-sided Mann-Whitney U test, normal approximation with tie and
//! continuity corrections).

use std::collections::{BTreeMap, BTreeSet};

use statrs::distribution::{ContinuousCDF, Normal};

use crate::data::table::{Cell, DataTable, LabeledMatrix};
use crate::error::Result;

/// Cellular-component terms offered in the figure, all selected by default
pub const GO_TERMS: [&str; 12] = [
    "nucleus",
    "nuclear chromosome",
    "nucleoplasm",
    "protein-DNA complex",
    "transcription regulator complex",
    "inner mitochondrial membrane protein complex",
    "mitochondrial nucleoid",
    "cell surface",
    "ER to Golgi transport vesicle membrane",
    "organelle membrane",
    "lysosome",
    "cytoplasm",
];

/// GO term → member accessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoAnnotations {
    terms: BTreeMap<String, BTreeSet<String>>,
}

impl GoAnnotations {
    /// From an `Accession` / `GO Name` table
    pub fn from_table(table: &DataTable) -> Result<Self> {
        let accessions = table.text_column("Accession")?;
        let names = table.text_column("GO Name")?;
        let mut terms: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (acc, name) in accessions.into_iter().zip(names) {
            if !acc.is_empty() && !name.is_empty() {
                terms.entry(name).or_default().insert(acc);
            }
        }
        Ok(Self { terms })
    }

    pub fn members(&self, term: &str) -> Option<&BTreeSet<String>> {
        self.terms.get(term)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoResult {
    pub term: String,
    pub sample: String,
    pub p_value: f64,
}

impl GoResult {
    pub fn neg_log10_p(&self) -> f64 {
        -self.p_value.max(f64::MIN_POSITIVE).log10()
    }
}

/// Average ranks (1-based), ties share the mean of their positions
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|a, b| values[*a].total_cmp(&values[*b]));
    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < idx.len() {
        let mut j = i;
        while j + 1 < idx.len() && values[idx[j + 1]] == values[idx[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            out[idx[k]] = avg;
        }
        i = j + 1;
    }
    out
}

/// P-value that `in_group` tends to exceed `out_group`
pub fn mann_whitney_greater(in_group: &[f64], out_group: &[f64]) -> f64 {
    let (n1, n2) = (in_group.len() as f64, out_group.len() as f64);
    if in_group.is_empty() || out_group.is_empty() {
        return 1.0;
    }
    let all: Vec<f64> = in_group.iter().chain(out_group).copied().collect();
    let r = ranks(&all);
    let r1: f64 = r[..in_group.len()].iter().sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;

    let n = n1 + n2;
    let mut tie_term = 0.0;
    let mut sorted = all.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    for group in sorted.chunk_by(|a, b| a == b) {
        let t = group.len() as f64;
        tie_term += t * t * t - t;
    }
    let var = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if var <= 0.0 {
        return 1.0;
    }
    let z = (u1 - n1 * n2 / 2.0 - 0.5) / var.sqrt();
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (1.0 - normal.cdf(z)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// One result per (term, sample); `data` rows are accessions, columns samples
pub fn test_enrichment(
    data: &LabeledMatrix,
    annotations: &GoAnnotations,
    terms: &[String],
) -> Vec<GoResult> {
    let mut results = Vec::new();
    for term in terms {
        let Some(members) = annotations.members(term) else {
            continue;
        };
        for (j, sample) in data.columns.iter().enumerate() {
            let mut inside = Vec::new();
            let mut outside = Vec::new();
            for (acc, row) in data.rows.iter().zip(&data.values) {
                let v = row[j];
                if !(v.is_finite() && v > 0.0) {
                    continue;
                }
                if members.contains(acc) {
                    inside.push(v);
                } else {
                    outside.push(v);
                }
            }
            results.push(GoResult {
                term: term.clone(),
                sample: sample.clone(),
                p_value: mann_whitney_greater(&inside, &outside),
            });
        }
    }
    results
}

/// `GO Name`, `Sample Name`, `pvalue`, `pvalue (-log10)`
pub fn results_table(results: &[GoResult]) -> DataTable {
    DataTable::new(
        ["GO Name", "Sample Name", "pvalue", "pvalue (-log10)"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        results
            .iter()
            .map(|r| {
                vec![
                    Cell::text(r.term.clone()),
                    Cell::text(r.sample.clone()),
                    Cell::number(r.p_value),
                    Cell::number(r.neg_log10_p()),
                ]
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_average_ties() {
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_mann_whitney_direction() {
        let high = [100.0, 90.0, 95.0, 85.0, 99.0];
        let low = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert!(mann_whitney_greater(&high, &low) < 0.01);
        assert!(mann_whitney_greater(&low, &high) > 0.99);
        assert_eq!(mann_whitney_greater(&[], &low), 1.0);
    }

    #[test]
    fn test_enrichment_per_sample() {
        let annotations = GoAnnotations::from_table(&DataTable::new(
            vec!["Accession".into(), "GO Name".into()],
            vec![
                vec![Cell::text("P1"), Cell::text("nucleus")],
                vec![Cell::text("P2"), Cell::text("nucleus")],
                vec![Cell::text("P3"), Cell::text("nucleus")],
            ],
        ))
        .unwrap();
        let rows: Vec<String> = (1..=10).map(|i| format!("P{}", i)).collect();
        // nucleus members are the most intense proteins in S1, the least in S2
        let values = (1..=10)
            .map(|i| vec![100.0 - i as f64, i as f64])
            .collect();
        let m = LabeledMatrix::new(rows, vec!["S1".into(), "S2".into()], values);

        let terms = vec!["nucleus".to_string(), "lysosome".to_string()];
        let results = test_enrichment(&m, &annotations, &terms);
        assert_eq!(results.len(), 2);
        assert!(results[0].p_value < 0.05);
        assert!(results[1].p_value > 0.5);
        assert!(results[0].neg_log10_p() > 1.3);
        assert_eq!(results_table(&results).n_rows(), 2);
    }
}
