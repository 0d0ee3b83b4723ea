//! User-uploaded protein lists
//!
//! Every change to the upload list (or to a file's chosen column) rebuilds the
//! set from nothing and bumps `revision`, which figures use to notice they
//! need a rebuild.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::data::protein_id;
use crate::data::table::{sniff_delimiter, DataTable};
use crate::error::Result;

/// One uploaded delimited file and the column holding protein ids
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub table: DataTable,
    pub protein_column: String,
}

impl UploadedFile {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let table = DataTable::read_delimited(bytes, sniff_delimiter(bytes))?;
        let protein_column = table
            .columns
            .iter()
            .find(|c| c.to_ascii_lowercase().contains("protein"))
            .or_else(|| table.columns.first())
            .cloned()
            .unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            table,
            protein_column,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(&name, &bytes)
    }

    /// Normalized accessions of the chosen column
    pub fn accessions(&self) -> Vec<String> {
        self.table
            .text_column(&self.protein_column)
            .unwrap_or_default()
            .iter()
            .filter(|v| !v.trim().is_empty())
            .map(|v| protein_id::accession(v))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomProteinSet {
    proteins: BTreeSet<String>,
    revision: u64,
    opt_in: HashMap<String, bool>,
}

impl CustomProteinSet {
    pub fn rebuild(&mut self, files: &[UploadedFile]) {
        self.proteins = files.iter().flat_map(|f| f.accessions()).collect();
        self.revision += 1;
        log::info!(
            "Custom protein list rebuilt from {} files: {} proteins",
            files.len(),
            self.proteins.len()
        );
    }

    pub fn proteins(&self) -> &BTreeSet<String> {
        &self.proteins
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.proteins.contains(accession)
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the figure behind `session_key` filters by this list.
    /// Defaults to on once anything has been uploaded.
    pub fn use_for(&self, session_key: &str) -> bool {
        !self.is_empty() && self.opt_in.get(session_key).copied().unwrap_or(true)
    }

    pub fn set_use_for(&mut self, session_key: &str, enabled: bool) {
        self.opt_in.insert(session_key.to_string(), enabled);
    }

    /// The set to filter with, if the figure opted in
    pub fn filter_for(&self, session_key: &str) -> Option<&BTreeSet<String>> {
        self.use_for(session_key).then_some(&self.proteins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upload_normalizes_uniprot_headers() {
        let file = UploadedFile::from_bytes(
            "list.tsv",
            b"Gene\tProtein\nTP53\tsp|P12345|NAME_HUMAN\nMYC\tP01106\n",
        )
        .unwrap();
        assert_eq!(file.protein_column, "Protein");
        assert_eq!(file.accessions(), vec!["P12345".to_string(), "P01106".to_string()]);
    }

    #[test]
    fn test_rebuild_unions_and_starts_over() {
        let a = UploadedFile::from_bytes("a.csv", b"id\nsp|P1|A_HUMAN\nP2\n").unwrap();
        let b = UploadedFile::from_bytes("b.csv", b"id;x\nP2;1\nP3;2\n").unwrap();
        let mut set = CustomProteinSet::default();

        set.rebuild(&[a.clone(), b]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.revision(), 1);

        set.rebuild(&[a]);
        assert_eq!(
            set.proteins().iter().cloned().collect::<Vec<_>>(),
            vec!["P1".to_string(), "P2".to_string()]
        );
        assert_eq!(set.revision(), 2);
    }

    #[test]
    fn test_opt_in_only_when_non_empty() {
        let mut set = CustomProteinSet::default();
        assert!(!set.use_for("Protein_Heatmap"));
        assert!(set.filter_for("Protein_Heatmap").is_none());

        let file = UploadedFile::from_bytes("a.csv", b"id\nP1\n").unwrap();
        set.rebuild(&[file]);
        assert!(set.use_for("Protein_Heatmap"));
        set.set_use_for("Protein_Heatmap", false);
        assert!(!set.use_for("Protein_Heatmap"));
        assert!(set.use_for("Hit_Selection"));
    }
}
