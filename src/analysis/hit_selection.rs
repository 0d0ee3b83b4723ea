//! Hit selection: proteins whose intensity in a sample sits far from the
//! mean of all proteins in that sample
//!
//! Peptide intensities are log10 scaled and median centered per sample,
//! peptides with too many missing values are dropped, and each protein with
//! enough peptides is scored by the mean of its peptides. A protein is a hit
//! in a sample when its score lies more than `sigma` standard deviations
//! above (or below) that sample's mean score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{normalize, stats};
use crate::data::table::LabeledMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitMode {
    #[default]
    All,
    BelowMean,
    AboveMean,
}

impl HitMode {
    pub const ALL: [HitMode; 3] = [HitMode::All, HitMode::BelowMean, HitMode::AboveMean];

    pub fn label(&self) -> &'static str {
        match self {
            HitMode::All => "All",
            HitMode::BelowMean => "Below Mean",
            HitMode::AboveMean => "Above Mean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitParams {
    pub min_peptides: usize,
    pub max_nan_values: usize,
    pub sigma: f64,
}

/// Binary protein × sample matrices (1.0 = hit)
#[derive(Debug, Clone, PartialEq)]
pub struct Hits {
    pub above: LabeledMatrix,
    pub below: LabeledMatrix,
}

impl Hits {
    pub fn select(&self, mode: HitMode) -> LabeledMatrix {
        match mode {
            HitMode::AboveMean => self.above.clone(),
            HitMode::BelowMean => self.below.clone(),
            HitMode::All => {
                let mut union = self.above.clone();
                for (row, below) in union.values.iter_mut().zip(&self.below.values) {
                    for (v, b) in row.iter_mut().zip(below) {
                        *v = v.max(*b);
                    }
                }
                union
            }
        }
    }
}

/// Per-protein mean of log10, median-centered peptide intensities.
/// `proteins[i]` owns peptide row `i`.
pub fn protein_scores(
    peptides: &LabeledMatrix,
    proteins: &[String],
    params: &HitParams,
) -> LabeledMatrix {
    let centered = normalize::median_center(&normalize::log_transform(peptides, 10.0));

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, row) in centered.values.iter().enumerate() {
        let nan_count = row.iter().filter(|v| !v.is_finite()).count();
        if nan_count > params.max_nan_values {
            continue;
        }
        if let Some(protein) = proteins.get(i) {
            groups.entry(protein.as_str()).or_default().push(i);
        }
    }
    groups.retain(|_, rows| rows.len() >= params.min_peptides);

    let mut scores = LabeledMatrix::filled(
        groups.keys().map(|p| p.to_string()).collect(),
        centered.columns.clone(),
        f64::NAN,
    );
    for (p, rows) in groups.values().enumerate() {
        for j in 0..centered.n_cols() {
            let vals: Vec<f64> = rows.iter().map(|i| centered.values[*i][j]).collect();
            scores.values[p][j] = stats::mean(&vals);
        }
    }
    scores
}

pub fn hit_selection(peptides: &LabeledMatrix, proteins: &[String], params: &HitParams) -> Hits {
    let scores = protein_scores(peptides, proteins, params);
    let mut above = LabeledMatrix::filled(scores.rows.clone(), scores.columns.clone(), 0.0);
    let mut below = above.clone();

    for j in 0..scores.n_cols() {
        let col = scores.column(j);
        let mu = stats::mean(&col);
        let sd = stats::std_dev(&col);
        if !mu.is_finite() || !sd.is_finite() {
            continue;
        }
        for (i, v) in col.iter().enumerate() {
            if *v > mu + params.sigma * sd {
                above.values[i][j] = 1.0;
            } else if *v < mu - params.sigma * sd {
                below.values[i][j] = 1.0;
            }
        }
    }
    log::debug!(
        "Hit selection over {} proteins x {} samples",
        scores.n_rows(),
        scores.n_cols()
    );
    Hits { above, below }
}

/// Rows ordered by their maximum value, largest first (stable)
pub fn sort_by_row_max_desc(m: &LabeledMatrix) -> LabeledMatrix {
    let row_max = |r: &Vec<f64>| {
        r.iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max)
    };
    let mut idx: Vec<usize> = (0..m.n_rows()).collect();
    idx.sort_by(|a, b| row_max(&m.values[*b]).total_cmp(&row_max(&m.values[*a])));
    m.select_rows(&idx)
}
