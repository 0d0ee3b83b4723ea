//! Run identifier → condition label mapping
//!
//! Raw run ids (`20210308_A1.mzML`) are matched on the part before the first
//! `.`. Labels come from the sample metadata when it exists, otherwise from
//! the `Condition` column of the results table.

use std::collections::{BTreeMap, HashMap};

use crate::data::table::{Cell, DataTable};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionMap {
    map: BTreeMap<String, String>,
}

/// Part of a run id before the first `.`
pub fn strip_extension(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

impl ConditionMap {
    pub fn build(results: &DataTable, metadata: &DataTable, marker: &str) -> Self {
        let labels = if metadata.is_empty() {
            Self::labels_from_results(results)
        } else {
            Self::labels_from_metadata(metadata, marker)
        };

        let mut map = BTreeMap::new();
        if let Ok(runs) = results.text_column("Run") {
            for run in runs {
                let id = strip_extension(&run).to_string();
                let label = labels.get(&id).cloned().unwrap_or_else(|| id.clone());
                map.insert(id, label);
            }
        }
        log::info!("Condition map covers {} runs", map.len());
        Self { map }
    }

    /// `{compound}:{cell line}:{n}`, numbering each sample's rows from 1
    fn labels_from_metadata(metadata: &DataTable, marker: &str) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        let (Some(run), Some(sample), Some(acq)) = (
            metadata.column_index("Run"),
            metadata.column_index("Sample"),
            metadata.column_index("Acquisition Type"),
        ) else {
            log::warn!("Metadata lacks Run/Sample/Acquisition Type columns");
            return labels;
        };
        let compound = metadata.column_index("Working Compound");
        let cell_line = metadata.column_index("Working Cell Line");
        let field = |row: &[Cell], j: Option<usize>| j.map(|j| row[j].to_string()).unwrap_or_default();

        let mut counters: HashMap<String, usize> = HashMap::new();
        for row in metadata.rows.iter().filter(|r| r[acq].to_string() == marker) {
            let n = counters.entry(row[sample].to_string()).or_insert(0);
            *n += 1;
            let label = format!("{}:{}:{}", field(row, compound), field(row, cell_line), n);
            labels.insert(strip_extension(&row[run].to_string()).to_string(), label);
        }
        labels
    }

    fn labels_from_results(results: &DataTable) -> HashMap<String, String> {
        let (Ok(runs), Ok(conditions)) = (results.text_column("Run"), results.text_column("Condition"))
        else {
            return HashMap::new();
        };
        runs.iter()
            .zip(conditions)
            .map(|(run, cond)| (strip_extension(run).to_string(), cond))
            .collect()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            map: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Label for a raw id; ids of unknown runs (and names such as
    /// `Protein`) come back unchanged
    pub fn label(&self, id: &str) -> String {
        self.map
            .get(strip_extension(id))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &String> {
        self.map.values()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.map
    }

    /// Rewrite the values of one column in place
    pub fn relabel_column(&self, table: &mut DataTable, column: &str) {
        let Some(j) = table.column_index(column) else {
            return;
        };
        for row in &mut table.rows {
            if let Cell::Text(_) | Cell::Number(_) = row[j] {
                row[j] = Cell::Text(self.label(&row[j].to_string()));
            }
        }
    }

    /// Rewrite column headers that name a known run
    pub fn relabel_headers(&self, table: &mut DataTable) {
        for column in &mut table.columns {
            *column = self.label(column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(csv: &str) -> DataTable {
        DataTable::read_delimited(csv.as_bytes(), b',').unwrap()
    }

    fn results() -> DataTable {
        table(
            "Run,Condition,Protein,Peptide,Intensity\n\
             S1.mzML,CondA,P1,AAA,1\n\
             S2.mzML,CondB,P1,AAA,2\n\
             S1.mzML,CondA,P2,BBB,3\n",
        )
    }

    #[test]
    fn test_metadata_labels_are_numbered_per_sample() {
        let metadata = table(
            "Run,Sample,Acquisition Type,Working Compound,Working Cell Line\n\
             S1,X,Wide DIA,CompX,L1\n\
             S2,X,Wide DIA,CompX,L1\n",
        );
        let map = ConditionMap::build(&results(), &metadata, "Wide DIA");
        assert_eq!(
            map,
            ConditionMap::from_pairs([("S1", "CompX:L1:1"), ("S2", "CompX:L1:2")])
        );
    }

    #[test]
    fn test_empty_metadata_falls_back_to_results() {
        let map = ConditionMap::build(&results(), &DataTable::empty(), "Wide DIA");
        assert_eq!(map, ConditionMap::from_pairs([("S1", "CondA"), ("S2", "CondB")]));
    }

    #[test]
    fn test_other_acquisitions_are_skipped_and_unmapped_runs_fall_back() {
        let metadata = table(
            "Run,Sample,Acquisition Type,Working Compound,Working Cell Line\n\
             S0,X,Narrow DIA,CompX,L1\n\
             S1,X,Wide DIA,CompX,L1\n",
        );
        let map = ConditionMap::build(&results(), &metadata, "Wide DIA");
        assert_eq!(map.label("S1.mzML"), "CompX:L1:1");
        assert_eq!(map.label("S2.mzML"), "S2");
        assert_eq!(map.label("S9.raw"), "S9.raw");
    }

    #[test]
    fn test_relabel_helpers() {
        let map = ConditionMap::from_pairs([("S1", "CondA")]);
        let mut t = table("Protein,S1,S2\nP1,1,2\n");
        map.relabel_headers(&mut t);
        assert_eq!(t.columns, vec!["Protein", "CondA", "S2"]);

        let mut r = results();
        map.relabel_column(&mut r, "Run");
        assert_eq!(r.text_column("Run").unwrap(), vec!["CondA", "S2.mzML", "CondA"]);
    }

    #[test]
    fn test_relabelling_twice_changes_nothing_more() {
        let map = ConditionMap::build(&results(), &DataTable::empty(), "Wide DIA");

        let mut headers = table("Protein,S1.mzML,S2,S3\nP1,1,2,3\n");
        map.relabel_headers(&mut headers);
        let once = headers.clone();
        map.relabel_headers(&mut headers);
        assert_eq!(headers, once);
        assert_eq!(headers.columns, vec!["Protein", "CondA", "CondB", "S3"]);

        let mut runs = results();
        map.relabel_column(&mut runs, "Run");
        let once = runs.clone();
        map.relabel_column(&mut runs, "Run");
        assert_eq!(runs, once);
        assert_eq!(runs.text_column("Run").unwrap(), vec!["CondA", "CondB", "CondA"]);
    }
}
