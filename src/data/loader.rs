//! Dataset artifact loading with a read-through cache
//!
//! Every accessor returns a `DataTable`; a failed load is logged and comes
//! back as `DataTable::empty()`, so callers only ever test for emptiness.

use std::collections::HashMap;
use std::fmt;

use crate::config::ReportConfig;
use crate::data::storage::ObjectStore;
use crate::data::table::{DataTable, TableFormat};
use crate::error::{ReportError, Result};

/// Dataset name offered when reading from the local data directory
pub const LOCAL_DATASET: &str = "local";

/// Tabular artifacts the report reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    Results,
    Normalized,
    UniqueCounts,
    QuantProteins,
    QuantPeptides,
    PcaReduced,
    Metadata,
    NuclearProteins,
    ProteinLocations,
    ExpectedLocationFractions,
    GoAnnotations,
}

impl Artifact {
    /// Reference lists shared by every dataset
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Artifact::NuclearProteins
                | Artifact::ProteinLocations
                | Artifact::ExpectedLocationFractions
                | Artifact::GoAnnotations
        )
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Artifact::Results => "peptide/protein results",
            Artifact::Normalized => "normalized peptide/protein results",
            Artifact::UniqueCounts => "unique peptide/protein counts",
            Artifact::QuantProteins => "quant proteins",
            Artifact::QuantPeptides => "quant peptides",
            Artifact::PcaReduced => "PCA-reduced peptides",
            Artifact::Metadata => "sample metadata",
            Artifact::NuclearProteins => "nuclear protein list",
            Artifact::ProteinLocations => "protein locations",
            Artifact::ExpectedLocationFractions => "expected location fractions",
            Artifact::GoAnnotations => "GO annotations",
        };
        write!(f, "{}", name)
    }
}

/// (dataset, tool, artifact); reference lists use empty strings
type CacheKey = (String, String, Artifact);

pub struct DataLoader {
    config: ReportConfig,
    store: Box<dyn ObjectStore>,
    cache: HashMap<CacheKey, DataTable>,
}

impl DataLoader {
    pub fn new(config: ReportConfig, store: Box<dyn ObjectStore>) -> Self {
        Self {
            config,
            store,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn results(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::Results)
    }

    pub fn normalized(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::Normalized)
    }

    pub fn unique_counts(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::UniqueCounts)
    }

    pub fn quant_proteins(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::QuantProteins)
    }

    pub fn quant_peptides(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::QuantPeptides)
    }

    pub fn pca_reduced(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::PcaReduced)
    }

    pub fn metadata(&mut self, dataset: &str) -> DataTable {
        self.load(dataset, Artifact::Metadata)
    }

    pub fn nuclear_proteins(&mut self) -> DataTable {
        self.load("", Artifact::NuclearProteins)
    }

    pub fn protein_locations(&mut self) -> DataTable {
        self.load("", Artifact::ProteinLocations)
    }

    pub fn expected_location_fractions(&mut self) -> DataTable {
        self.load("", Artifact::ExpectedLocationFractions)
    }

    pub fn go_annotations(&mut self) -> DataTable {
        self.load("", Artifact::GoAnnotations)
    }

    /// Drop cached tables for one dataset, or everything
    pub fn invalidate(&mut self, dataset: Option<&str>) {
        match dataset {
            Some(name) => self.cache.retain(|(d, _, _), _| d != name),
            None => self.cache.clear(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Dataset names present in the experiment bucket
    pub fn list_datasets(&self) -> Vec<String> {
        if self.config.local_mode {
            return vec![LOCAL_DATASET.to_string()];
        }
        let storage = &self.config.storage;
        let keys = match self
            .store
            .list_keys(&storage.experiment_bucket, &storage.dataset_prefix)
        {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("Could not list datasets: {}", e);
                return Vec::new();
            }
        };
        let mut datasets: Vec<String> = keys
            .iter()
            .filter(|k| k.contains(&storage.dataset_filter))
            .filter_map(|k| {
                k[storage.dataset_prefix.len()..]
                    .split('/')
                    .find(|p| !p.is_empty())
                    .map(str::to_string)
            })
            .collect();
        datasets.sort();
        datasets.dedup();
        log::info!("Found {} datasets", datasets.len());
        datasets
    }

    /// Size in bytes of an object, `None` when it cannot be found
    pub fn object_size(&self, bucket: &str, key: &str) -> Option<u64> {
        match self.store.size(bucket, key) {
            Ok(size) => Some(size),
            Err(e) => {
                log::debug!("No size for {}/{}: {}", bucket, key, e);
                None
            }
        }
    }

    fn load(&mut self, dataset: &str, artifact: Artifact) -> DataTable {
        let key: CacheKey = if artifact.is_reference() {
            (String::new(), String::new(), artifact)
        } else {
            (dataset.to_string(), self.config.storage.tool.clone(), artifact)
        };
        if let Some(table) = self.cache.get(&key) {
            log::debug!("Cache hit: {} ({})", artifact, dataset);
            return table.clone();
        }

        let table = match self.fetch(dataset, artifact) {
            Ok(table) => {
                log::info!(
                    "Loaded {} for '{}': {} rows x {} columns",
                    artifact,
                    dataset,
                    table.n_rows(),
                    table.n_cols()
                );
                apply_fixups(artifact, table)
            }
            Err(e) => {
                log::warn!("Failed to load {} for '{}': {}", artifact, dataset, e);
                DataTable::empty()
            }
        };
        self.cache.insert(key, table.clone());
        table
    }

    fn fetch(&self, dataset: &str, artifact: Artifact) -> Result<DataTable> {
        if self.config.local_mode {
            let path = self.config.local.path_for(artifact);
            let format = TableFormat::from_name(&path.to_string_lossy())?;
            let bytes = std::fs::read(&path)?;
            return DataTable::from_bytes(&bytes, format);
        }

        let storage = &self.config.storage;
        let bucket = storage.bucket_for(artifact);
        let mut last_err = None;
        for key in storage.keys_for(artifact, dataset, &storage.tool) {
            let attempt = TableFormat::from_name(&key).and_then(|format| {
                let bytes = self.store.read(bucket, &key)?;
                DataTable::from_bytes(&bytes, format)
            });
            match attempt {
                Ok(table) => return Ok(table),
                Err(e) => {
                    log::debug!("{}/{} unavailable: {}", bucket, key, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ReportError::NotFound {
            bucket: bucket.to_string(),
            key: artifact.to_string(),
        }))
    }
}

fn apply_fixups(artifact: Artifact, mut table: DataTable) -> DataTable {
    match artifact {
        Artifact::UniqueCounts => {
            if !table.has_column("Sample Name") {
                table.rename_column("Run", "Sample Name");
            }
        }
        Artifact::QuantProteins | Artifact::QuantPeptides => {
            for column in &mut table.columns {
                *column = column.replace(".mzML", "");
            }
        }
        _ => {}
    }
    table
}
