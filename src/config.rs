//! Report configuration
//!
//! Loaded once at startup from a JSON file. Every field has a default, so a
//! partial (or missing) file is fine. Storage keys are templates with
//! `{dataset}` and `{tool}` placeholders; each artifact lists the keys to try
//! in order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::loader::Artifact;
use crate::error::Result;

pub const CONFIG_ENV: &str = "PROTEOMICS_REPORT_CONFIG";
pub const LOCAL_MODE_ENV: &str = "PROTEOMICS_REPORT_LOCAL_MODE";
pub const DEFAULT_CONFIG_FILE: &str = "report_config.json";

pub const PRIMARY_COLOR: [u8; 3] = [0x00, 0x14, 0x25];
pub const SECONDARY_COLOR: [u8; 3] = [0x30, 0x8A, 0xAD];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub report_title: String,
    /// Read every artifact from `local.data_dir` instead of the object store
    pub local_mode: bool,
    pub storage: StorageConfig,
    pub local: LocalFiles,
    pub limits: Limits,
    pub downloads_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_title: "Standard Proteomics Report".to_string(),
            local_mode: false,
            storage: StorageConfig::default(),
            local: LocalFiles::default(),
            limits: Limits::default(),
            downloads_dir: std::env::temp_dir().join("proteomics_report_downloads"),
        }
    }
}

impl ReportConfig {
    /// Resolve the config file (env var, then working directory), falling back
    /// to defaults. The local-mode env var always wins over the file.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded report configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        if let Ok(flag) = std::env::var(LOCAL_MODE_ENV) {
            config.local_mode = matches!(flag.trim(), "1" | "true" | "TRUE" | "yes");
        }
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Object-store layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Filesystem root under which every bucket is a directory
    pub root: PathBuf,
    pub experiment_bucket: String,
    pub metadata_bucket: String,
    pub raw_bucket: String,
    pub tool: String,
    pub dataset_prefix: String,
    /// A dataset is listed only if one of its keys contains this string
    pub dataset_filter: String,
    pub templates: ArtifactTemplates,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/mnt/buckets"),
            experiment_bucket: "talus-data-pipeline-encyclopedia-bucket".to_string(),
            metadata_bucket: "protein-collections".to_string(),
            raw_bucket: "talus-data-pipeline-raw-bucket".to_string(),
            tool: "encyclopedia".to_string(),
            dataset_prefix: String::new(),
            dataset_filter: "peptide_proteins_results".to_string(),
            templates: ArtifactTemplates::default(),
        }
    }
}

impl StorageConfig {
    /// Bucket holding the given artifact
    pub fn bucket_for(&self, artifact: Artifact) -> &str {
        if artifact.is_reference() {
            &self.metadata_bucket
        } else {
            &self.experiment_bucket
        }
    }

    /// Candidate keys for an artifact, placeholders filled in
    pub fn keys_for(&self, artifact: Artifact, dataset: &str, tool: &str) -> Vec<String> {
        self.templates
            .get(artifact)
            .iter()
            .map(|t| t.replace("{dataset}", dataset).replace("{tool}", tool))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactTemplates {
    pub results: Vec<String>,
    pub normalized: Vec<String>,
    pub unique_counts: Vec<String>,
    pub quant_proteins: Vec<String>,
    pub quant_peptides: Vec<String>,
    pub pca_reduced: Vec<String>,
    pub metadata: Vec<String>,
    pub nuclear_proteins: Vec<String>,
    pub protein_locations: Vec<String>,
    pub expected_location_fractions: Vec<String>,
    pub go_annotations: Vec<String>,
}

impl Default for ArtifactTemplates {
    fn default() -> Self {
        let keys = |ks: &[&str]| ks.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        Self {
            results: keys(&[
                "{dataset}/{tool}/peptide_proteins_results.parquet",
                "{dataset}/{tool}/peptide_proteins_results.csv",
            ]),
            normalized: keys(&["{dataset}/{tool}/peptide_proteins_normalized.parquet"]),
            unique_counts: keys(&[
                "{dataset}/{tool}/quant_unique_peptides_proteins.csv",
                "{dataset}/{tool}/unique_peptides_proteins.csv",
            ]),
            quant_proteins: keys(&["{dataset}/{tool}/result-quant.elib.proteins.txt"]),
            quant_peptides: keys(&["{dataset}/{tool}/result-quant.elib.peptides.txt"]),
            pca_reduced: keys(&["{dataset}/{tool}/quant_peptides_pca_reduced.parquet"]),
            metadata: keys(&["{dataset}/{tool}/benchling_metadata.csv"]),
            nuclear_proteins: keys(&["nuclear_proteins.csv"]),
            protein_locations: keys(&["protein_locations.parquet"]),
            expected_location_fractions: keys(&["expected_fractions_of_locations.parquet"]),
            go_annotations: keys(&["go_annotations.csv"]),
        }
    }
}

impl ArtifactTemplates {
    pub fn get(&self, artifact: Artifact) -> &[String] {
        match artifact {
            Artifact::Results => &self.results,
            Artifact::Normalized => &self.normalized,
            Artifact::UniqueCounts => &self.unique_counts,
            Artifact::QuantProteins => &self.quant_proteins,
            Artifact::QuantPeptides => &self.quant_peptides,
            Artifact::PcaReduced => &self.pca_reduced,
            Artifact::Metadata => &self.metadata,
            Artifact::NuclearProteins => &self.nuclear_proteins,
            Artifact::ProteinLocations => &self.protein_locations,
            Artifact::ExpectedLocationFractions => &self.expected_location_fractions,
            Artifact::GoAnnotations => &self.go_annotations,
        }
    }
}

/// File names used in local mode, relative to `data_dir`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalFiles {
    pub data_dir: PathBuf,
    pub results: String,
    pub normalized: String,
    pub unique_counts: String,
    pub quant_proteins: String,
    pub quant_peptides: String,
    pub pca_reduced: String,
    pub metadata: String,
    pub nuclear_proteins: String,
    pub protein_locations: String,
    pub expected_location_fractions: String,
    pub go_annotations: String,
}

impl Default for LocalFiles {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            results: "peptide_proteins_results.parquet".to_string(),
            normalized: "peptide_proteins_normalized.parquet".to_string(),
            unique_counts: "unique_peptides_proteins.parquet".to_string(),
            quant_proteins: "RESULTS-quant.elib.proteins.txt".to_string(),
            quant_peptides: "RESULTS-quant.elib.peptides.txt".to_string(),
            pca_reduced: "quant_peptides_pca_reduced.parquet".to_string(),
            metadata: "benchling_metadata.csv".to_string(),
            nuclear_proteins: "nuclear_proteins.csv".to_string(),
            protein_locations: "protein_locations.parquet".to_string(),
            expected_location_fractions: "expected_fractions_of_locations.parquet".to_string(),
            go_annotations: "go_annotations.csv".to_string(),
        }
    }
}

impl LocalFiles {
    pub fn path_for(&self, artifact: Artifact) -> PathBuf {
        let name = match artifact {
            Artifact::Results => &self.results,
            Artifact::Normalized => &self.normalized,
            Artifact::UniqueCounts => &self.unique_counts,
            Artifact::QuantProteins => &self.quant_proteins,
            Artifact::QuantPeptides => &self.quant_peptides,
            Artifact::PcaReduced => &self.pca_reduced,
            Artifact::Metadata => &self.metadata,
            Artifact::NuclearProteins => &self.nuclear_proteins,
            Artifact::ProteinLocations => &self.protein_locations,
            Artifact::ExpectedLocationFractions => &self.expected_location_fractions,
            Artifact::GoAnnotations => &self.go_annotations,
        };
        self.data_dir.join(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_peptides_per_protein: usize,
    pub heatmap_page_size: usize,
    pub clustergram_page_size: usize,
    pub min_peptides_hit_selection: usize,
    pub max_nan_values_hit_selection: usize,
    /// Standard deviations from the mean beyond which a protein is a hit
    pub hit_selection_sigma: f64,
    /// Metadata rows with this acquisition type define the condition labels
    pub acquisition_marker: String,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_peptides_per_protein: 30,
            heatmap_page_size: 100,
            clustergram_page_size: 100,
            min_peptides_hit_selection: 2,
            max_nan_values_hit_selection: 2,
            hit_selection_sigma: 2.0,
            acquisition_marker: "Wide DIA".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "local_mode": true, "limits": { "heatmap_page_size": 25 } }"#;
        let config: ReportConfig = serde_json::from_str(json).unwrap();
        assert!(config.local_mode);
        assert_eq!(config.limits.heatmap_page_size, 25);
        assert_eq!(config.limits.max_peptides_per_protein, 30);
        assert_eq!(config.storage.tool, "encyclopedia");
    }

    #[test]
    fn test_key_templates_expand_placeholders() {
        let storage = StorageConfig::default();
        let keys = storage.keys_for(Artifact::UniqueCounts, "210308_MLLtx", "encyclopedia");
        assert_eq!(
            keys,
            vec![
                "210308_MLLtx/encyclopedia/quant_unique_peptides_proteins.csv".to_string(),
                "210308_MLLtx/encyclopedia/unique_peptides_proteins.csv".to_string(),
            ]
        );
        assert_eq!(storage.bucket_for(Artifact::NuclearProteins), "protein-collections");
        assert_eq!(
            storage.bucket_for(Artifact::Metadata),
            "talus-data-pipeline-encyclopedia-bucket"
        );
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report_config.json");
        let mut config = ReportConfig::default();
        config.storage.tool = "diann".to_string();
        config.save(&path).unwrap();
        let loaded = ReportConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.tool, "diann");
    }
}
