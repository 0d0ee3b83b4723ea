//! Subcellular location enrichment
//!
//! For each sample, the fraction of its location-annotated proteins found in
//! a location, divided by the fraction expected for that location across the
//! proteome. A score of 1 means no enrichment.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::table::LabeledMatrix;

/// A measured protein in one sample with its annotated main locations
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinLocation {
    pub protein: String,
    pub sample: String,
    pub locations: Vec<String>,
}

/// Split a `;`-separated location annotation
pub fn parse_locations(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Location × sample score matrix: one score per (sample, location), pooled
/// over the sample's proteins rather than per protein. Locations without an
/// expected fraction (or with a zero one) are left out.
pub fn enrichment_scores(records: &[ProteinLocation], expected: &[(String, f64)]) -> LabeledMatrix {
    let mut annotated: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut hits: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
    for rec in records.iter().filter(|r| !r.locations.is_empty()) {
        annotated
            .entry(rec.sample.as_str())
            .or_default()
            .insert(rec.protein.as_str());
        for loc in &rec.locations {
            hits.entry((rec.sample.as_str(), loc.as_str()))
                .or_default()
                .insert(rec.protein.as_str());
        }
    }

    let expected: Vec<&(String, f64)> = expected
        .iter()
        .filter(|(_, f)| f.is_finite() && *f > 0.0)
        .collect();
    let samples: Vec<&str> = annotated.keys().copied().collect();

    let mut m = LabeledMatrix::filled(
        expected.iter().map(|(l, _)| l.clone()).collect(),
        samples.iter().map(|s| s.to_string()).collect(),
        0.0,
    );
    for (i, (location, fraction)) in expected.iter().enumerate() {
        for (j, sample) in samples.iter().enumerate() {
            let total = annotated[sample].len() as f64;
            let found = hits
                .get(&(*sample, location.as_str()))
                .map_or(0, BTreeSet::len) as f64;
            m.values[i][j] = found / total / fraction;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(protein: &str, sample: &str, locs: &str) -> ProteinLocation {
        ProteinLocation {
            protein: protein.into(),
            sample: sample.into(),
            locations: parse_locations(locs),
        }
    }

    #[test]
    fn test_scores_are_observed_over_expected() {
        let records = vec![
            rec("A_HUMAN", "S1", "Nucleoplasm;Cytosol"),
            rec("B_HUMAN", "S1", "Nucleoplasm"),
            rec("C_HUMAN", "S1", "Mitochondria"),
            rec("D_HUMAN", "S1", "Cytosol"),
            rec("A_HUMAN", "S2", "Nucleoplasm;Cytosol"),
            rec("E_HUMAN", "S2", ""),
        ];
        let expected = vec![
            ("Nucleoplasm".to_string(), 0.25),
            ("Cytosol".to_string(), 0.5),
            ("Golgi".to_string(), 0.0),
        ];
        let m = enrichment_scores(&records, &expected);
        assert_eq!(m.rows, vec!["Nucleoplasm", "Cytosol"]);
        assert_eq!(m.columns, vec!["S1", "S2"]);
        // S1: 2 of 4 annotated proteins in the nucleoplasm, expected 1 in 4
        assert_eq!(m.values[0], vec![2.0, 4.0]);
        assert_eq!(m.values[1], vec![1.0, 2.0]);
    }

    #[test]
    fn test_parse_locations() {
        assert_eq!(parse_locations(" Nucleoli ; Cytosol;"), vec!["Nucleoli", "Cytosol"]);
        assert!(parse_locations("").is_empty());
    }
}
