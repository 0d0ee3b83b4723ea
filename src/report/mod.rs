//! Report assembly
//!
//! Loads every artifact of a dataset, relabels run ids with conditions and
//! builds the catalog of figures. A figure whose inputs are empty is left out
//! of the list entirely.

pub mod downloads;
pub mod pdf;

use std::collections::HashMap;

use egui::Ui;

use crate::config::{Limits, ReportConfig};
use crate::data::condition_map::ConditionMap;
use crate::data::custom_proteins::CustomProteinSet;
use crate::data::loader::DataLoader;
use crate::data::storage::split_uri;
use crate::data::table::{Cell, DataTable};
use crate::figures::{
    box_plot, clustergram, file_sizes, go_enrichment, hit_selection, pca_scatter,
    peptides_per_protein, protein_heatmap, protein_overlap, scatter_matrix, subcellular,
    unique_counts, FigureEvent, ReportFigure,
};
use downloads::Downloads;

/// Every table the catalog draws from
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub results: DataTable,
    pub normalized: DataTable,
    pub unique_counts: DataTable,
    pub quant_proteins: DataTable,
    pub quant_peptides: DataTable,
    pub pca_reduced: DataTable,
    pub metadata: DataTable,
    pub nuclear_proteins: DataTable,
    pub protein_locations: DataTable,
    pub expected_fractions: DataTable,
    pub go_annotations: DataTable,
    /// Object size per raw file path
    pub raw_sizes: HashMap<String, u64>,
}

impl ReportInputs {
    pub fn load(dataset: &str, loader: &mut DataLoader) -> Self {
        let metadata = loader.metadata(dataset);
        let raw_sizes = raw_file_sizes(&metadata, loader);
        Self {
            results: loader.results(dataset),
            normalized: loader.normalized(dataset),
            unique_counts: loader.unique_counts(dataset),
            quant_proteins: loader.quant_proteins(dataset),
            quant_peptides: loader.quant_peptides(dataset),
            pca_reduced: loader.pca_reduced(dataset),
            metadata,
            nuclear_proteins: loader.nuclear_proteins(),
            protein_locations: loader.protein_locations(),
            expected_fractions: loader.expected_location_fractions(),
            go_annotations: loader.go_annotations(),
            raw_sizes,
        }
    }

    /// Replace run ids with condition labels wherever samples are named
    pub fn relabel(&mut self, conditions: &ConditionMap) {
        conditions.relabel_column(&mut self.results, "Condition");
        conditions.relabel_column(&mut self.normalized, "originalRUN");
        conditions.relabel_column(&mut self.unique_counts, "Sample Name");
        conditions.relabel_column(&mut self.pca_reduced, "index");
        conditions.relabel_headers(&mut self.quant_proteins);
        conditions.relabel_headers(&mut self.quant_peptides);
        if let (Ok(runs), false) = (self.metadata.text_column("Run"), self.metadata.has_column("Condition")) {
            let labels = runs.iter().map(|r| Cell::text(conditions.label(r))).collect();
            self.metadata.push_column("Condition", labels);
        }
    }
}

/// Sizes of the raw files named in the metadata. `s3://bucket/key` paths are
/// looked up as given, bare keys in the raw bucket.
fn raw_file_sizes(metadata: &DataTable, loader: &DataLoader) -> HashMap<String, u64> {
    let raw_bucket = loader.config().storage.raw_bucket.clone();
    file_sizes::raw_paths(metadata)
        .into_iter()
        .filter_map(|path| {
            let size = match split_uri(&path).filter(|_| path.contains("://")) {
                Some((bucket, key)) => loader.object_size(bucket, key),
                None => loader.object_size(&raw_bucket, &path),
            }?;
            Some((path, size))
        })
        .collect()
}

/// The guarded figure catalog, in display order
pub fn catalog(
    dataset: &str,
    inputs: ReportInputs,
    conditions: &ConditionMap,
    limits: &Limits,
) -> Vec<Box<dyn ReportFigure>> {
    let ReportInputs {
        results,
        normalized,
        unique_counts: counts,
        quant_proteins,
        quant_peptides,
        pca_reduced,
        metadata,
        nuclear_proteins,
        protein_locations,
        expected_fractions,
        go_annotations,
        raw_sizes,
    } = inputs;

    let mut figures: Vec<Box<dyn ReportFigure>> = Vec::new();
    if file_sizes::is_available(&metadata) {
        figures.push(Box::new(file_sizes::create(
            dataset,
            file_sizes::FileSizesInput {
                metadata: metadata.clone(),
                sizes: raw_sizes,
            },
        )));
    }
    if unique_counts::is_available(&counts) {
        figures.push(Box::new(unique_counts::create(dataset, counts)));
    }
    if subcellular::is_available(&normalized, &protein_locations, &expected_fractions) {
        figures.push(Box::new(subcellular::create(
            dataset,
            subcellular::SubcellularInput {
                normalized: normalized.clone(),
                locations: protein_locations,
                expected: expected_fractions,
            },
        )));
    }
    if protein_overlap::is_available(&results, &nuclear_proteins) {
        figures.push(Box::new(protein_overlap::create(
            dataset,
            protein_overlap::OverlapInput {
                results: results.clone(),
                nuclear: nuclear_proteins,
            },
        )));
    }
    if scatter_matrix::is_available(&results) {
        figures.push(Box::new(scatter_matrix::create(dataset, results.clone())));
    }
    if box_plot::is_available(&results, &normalized) {
        figures.push(Box::new(box_plot::create(
            dataset,
            box_plot::BoxPlotInput {
                results,
                normalized,
            },
        )));
    }
    if peptides_per_protein::is_available(&quant_proteins) {
        figures.push(Box::new(peptides_per_protein::create(
            dataset,
            peptides_per_protein::PeptideCountsInput {
                quant_proteins: quant_proteins.clone(),
                cap: limits.max_peptides_per_protein,
            },
        )));
    }
    if protein_heatmap::is_available(&quant_proteins) {
        figures.push(Box::new(protein_heatmap::create(dataset, quant_proteins.clone())));
    }
    if hit_selection::is_available(&quant_peptides) {
        figures.push(Box::new(hit_selection::create(
            dataset,
            quant_peptides.clone(),
            limits,
        )));
    }
    if pca_scatter::is_available(&quant_peptides, &pca_reduced) {
        figures.push(Box::new(pca_scatter::create(
            dataset,
            pca_scatter::PcaInput {
                quant_peptides: quant_peptides.clone(),
                reduced: pca_reduced,
                metadata: metadata.clone(),
                conditions: conditions.clone(),
            },
        )));
    }
    if clustergram::is_available(&quant_peptides) {
        figures.push(Box::new(clustergram::create(
            dataset,
            clustergram::ClustergramInput {
                quant_peptides,
                conditions: conditions.clone(),
            },
        )));
    }
    if go_enrichment::is_available(&quant_proteins, &metadata, &go_annotations) {
        figures.push(Box::new(go_enrichment::create(
            dataset,
            go_enrichment::GoInput {
                quant_proteins,
                metadata,
                go_annotations,
                conditions: conditions.clone(),
            },
        )));
    }
    figures
}

pub struct Report {
    dataset: String,
    conditions: ConditionMap,
    figures: Vec<Box<dyn ReportFigure>>,
}

impl Report {
    pub fn build(dataset: &str, loader: &mut DataLoader, config: &ReportConfig) -> Self {
        let mut inputs = ReportInputs::load(dataset, loader);
        let conditions = ConditionMap::build(
            &inputs.results,
            &inputs.metadata,
            &config.limits.acquisition_marker,
        );
        inputs.relabel(&conditions);
        Self::from_inputs(dataset, inputs, conditions, &config.limits)
    }

    pub fn from_inputs(
        dataset: &str,
        inputs: ReportInputs,
        conditions: ConditionMap,
        limits: &Limits,
    ) -> Self {
        let figures = catalog(dataset, inputs, &conditions, limits);
        log::info!("Report for '{}' has {} figures", dataset, figures.len());
        Self {
            dataset: dataset.to_string(),
            conditions,
            figures,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn conditions(&self) -> &ConditionMap {
        &self.conditions
    }

    pub fn figures(&self) -> &[Box<dyn ReportFigure>] {
        &self.figures
    }

    pub fn figure_titles(&self) -> Vec<&str> {
        self.figures.iter().map(|f| f.meta().short_title.as_str()).collect()
    }

    /// One checkbox per figure; returns the figures whose state changed
    pub fn show_toggles(&mut self, ui: &mut Ui) -> Vec<(String, bool)> {
        let mut toggled = Vec::new();
        for figure in &mut self.figures {
            let mut active = figure.is_active();
            if ui.checkbox(&mut active, figure.meta().short_title.as_str()).changed() {
                figure.set_active(active);
                toggled.push((figure.meta().short_title.clone(), active));
            }
        }
        toggled
    }

    /// Parameter widgets of the active figures, one section each
    pub fn show_controls(&mut self, ui: &mut Ui, limits: &Limits, custom: &mut CustomProteinSet) {
        for figure in self.figures.iter_mut().filter(|f| f.is_active()) {
            ui.push_id(figure.session_key(), |ui| {
                ui.separator();
                ui.strong(figure.meta().short_title.as_str());
                figure.show_controls(ui, limits, custom);
            });
        }
    }

    pub fn show_figures(
        &mut self,
        ui: &mut Ui,
        limits: &Limits,
        custom: &CustomProteinSet,
        downloads: Option<&Downloads>,
    ) -> Vec<FigureEvent> {
        let mut events = Vec::new();
        for figure in &mut self.figures {
            ui.push_id(figure.session_key(), |ui| {
                events.extend(figure.show(ui, limits, custom, downloads));
            });
        }
        events
    }

    /// Bring every active figure's output up to date
    pub fn refresh(&mut self, limits: &Limits, custom: &CustomProteinSet) {
        for figure in &mut self.figures {
            figure.refresh(limits, custom);
        }
    }

    pub fn active_figures(&self) -> Vec<&dyn ReportFigure> {
        let mut active: Vec<&dyn ReportFigure> = Vec::new();
        for figure in self.figures.iter().filter(|f| f.is_active()) {
            active.push(figure.as_ref());
        }
        active
    }

    pub fn set_all_active(&mut self, active: bool) {
        for figure in &mut self.figures {
            figure.set_active(active);
        }
    }
}

/// Central-panel message before any dataset is chosen
pub fn show_no_dataset(ui: &mut Ui) {
    ui.centered_and_justified(|ui| {
        ui.label(egui::RichText::new("Please select a dataset.").size(18.0));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Cell;
    use crate::data::storage::FsObjectStore;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    fn csv(body: &str) -> DataTable {
        DataTable::read_delimited(body.as_bytes(), b',').unwrap()
    }

    fn results() -> DataTable {
        csv("Run,Condition,Protein,Peptide,Intensity\n\
             r1.mzML,r1.mzML,sp|P1|A_HUMAN,PEPA,100\n\
             r1.mzML,r1.mzML,sp|P2|B_HUMAN,PEPB,200\n\
             r2.mzML,r2.mzML,sp|P1|A_HUMAN,PEPA,150\n")
    }

    fn metadata() -> DataTable {
        csv("Run,Sample,Acquisition Type,Working Compound,Working Cell Line,RAW S3 Path\n\
             r1.raw,S1,Wide DIA,DMSO,HeLa,\n\
             r2.raw,S2,Wide DIA,Drug,HeLa,\n")
    }

    fn short_titles(report: &Report) -> Vec<String> {
        report.figure_titles().iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_empty_inputs_omit_figures() {
        let report = Report::from_inputs(
            "ds",
            ReportInputs::default(),
            ConditionMap::default(),
            &Limits::default(),
        );
        assert!(report.figures().is_empty());
    }

    #[test]
    fn test_guards_follow_available_inputs() {
        let results = results();
        let metadata = metadata();
        let conditions = ConditionMap::build(&results, &metadata, "Wide DIA");
        let mut inputs = ReportInputs {
            results,
            metadata,
            ..Default::default()
        };
        inputs.relabel(&conditions);
        assert_eq!(
            inputs.results.text_column("Condition").unwrap(),
            vec!["DMSO:HeLa:1", "DMSO:HeLa:1", "Drug:HeLa:1"]
        );

        let report = Report::from_inputs("ds", inputs, conditions, &Limits::default());
        // no RAW S3 Path values, no normalized table, no nuclear list
        assert_eq!(short_titles(&report), vec!["Peptide Intensities Scatter Matrix"]);
        assert_eq!(report.active_figures().len(), 1);
    }

    #[test]
    fn test_full_catalog_order() {
        let t = |s: &str| Cell::text(s);
        let quant_peptides = csv("Peptide,Protein,numFragments,r1,r2\n\
                                  PEPA,sp|P1|A_HUMAN,4,100,150\n\
                                  PEPB,sp|P2|B_HUMAN,4,200,\n");
        let quant_proteins = csv("Protein,NumPeptides,PeptideSequences,r1,r2\n\
                                  sp|P1|A_HUMAN,1,PEPA,100,150\n\
                                  sp|P2|B_HUMAN,1,PEPB,200,\n");
        let inputs = ReportInputs {
            results: results(),
            normalized: csv("PROTEIN,PEPTIDE,originalRUN,ABUNDANCE\nsp|P1|A_HUMAN,PEPA,r1,5\n"),
            unique_counts: csv("Sample Name,Unique Proteins,Unique Peptides\nr1,2,2\n"),
            quant_proteins,
            quant_peptides,
            metadata: csv("Run,Sample,Acquisition Type,Extraction Fraction,Working Compound,RAW S3 Path\n\
                           r1.raw,S1,Wide DIA,Nuclear,DMSO,s3://raw/r1.raw\n"),
            nuclear_proteins: csv("Nuclear Proteins\nP1\n"),
            protein_locations: csv("Entry name,Main location\nA_HUMAN,Nucleoplasm\n"),
            expected_fractions: csv("Location,Expected Fraction\nNucleoplasm,0.2\n"),
            go_annotations: DataTable::new(
                vec!["Accession".into(), "GO Name".into()],
                vec![vec![t("P1"), t("nucleus")]],
            ),
            ..Default::default()
        };
        let report = Report::from_inputs("ds", inputs, ConditionMap::default(), &Limits::default());
        assert_eq!(
            short_titles(&report),
            vec![
                "Raw File Sizes",
                "# Unique Peptides and Proteins",
                "Subcellular Location Enrichment",
                "Nuclear Protein Overlap",
                "Peptide Intensities Scatter Matrix",
                "Peptide Intensities Box Plot",
                "Number of Peptides per Protein",
                "Protein Intensities Heatmap",
                "Hit Selection",
                "Peptide Intensities PCA",
                "Peptide Intensities Clustergram",
                "GO Enrichment",
            ]
        );
    }

    #[test]
    fn test_refresh_and_deactivate() {
        let mut report = Report::from_inputs(
            "ds",
            ReportInputs {
                results: results(),
                ..Default::default()
            },
            ConditionMap::default(),
            &Limits::default(),
        );
        let limits = Limits::default();
        report.refresh(&limits, &CustomProteinSet::default());
        assert!(report.figures()[0].output().is_some());
        report.set_all_active(false);
        assert_eq!(report.active_figures().len(), 0);
    }

    fn put(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_build_from_store_looks_up_raw_sizes() {
        let dir = tempfile::tempdir().unwrap();
        put(
            dir.path(),
            "exp/ds1/encyclopedia/benchling_metadata.csv",
            "Run,Sample,Acquisition Type,RAW S3 Path\n\
             r1.raw,S1,Wide DIA,s3://rawbucket/2021/r1.raw\n\
             r2.raw,S2,Wide DIA,2021/r2.raw\n",
        );
        put(dir.path(), "rawbucket/2021/r1.raw", "12345");
        put(dir.path(), "rawdefault/2021/r2.raw", "12");

        let mut config = ReportConfig::default();
        config.storage.root = dir.path().to_path_buf();
        config.storage.experiment_bucket = "exp".into();
        config.storage.metadata_bucket = "meta".into();
        config.storage.raw_bucket = "rawdefault".into();
        let mut loader = DataLoader::new(config.clone(), Box::new(FsObjectStore::new(dir.path())));

        let inputs = ReportInputs::load("ds1", &mut loader);
        assert_eq!(inputs.raw_sizes.get("s3://rawbucket/2021/r1.raw"), Some(&5));
        assert_eq!(inputs.raw_sizes.get("2021/r2.raw"), Some(&2));

        let report = Report::build("ds1", &mut loader, &config);
        assert_eq!(report.dataset(), "ds1");
        assert_eq!(short_titles(&report), vec!["Raw File Sizes"]);
    }
}
