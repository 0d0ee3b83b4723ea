//! First two principal components of the peptide intensities per run

use std::collections::BTreeMap;

use egui::Ui;

use super::{Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::analysis::pca::Pca;
use crate::chart::{palette, primary, Chart, ScatterChart, ScatterGroup};
use crate::data::condition_map::ConditionMap;
use crate::data::table::{Cell, DataTable, LabeledMatrix};

pub const TITLE: &str =
    "PCA Plot mapping the Principal Components of the Peptide Intensities for each Sample";

/// Metadata columns offered for coloring
const COLOR_COLUMNS: [&str; 5] = [
    "Sample",
    "Working Compound",
    "Working Cell Line",
    "Extraction Fraction",
    "Acquisition Type",
];

#[derive(Debug, Clone, Default)]
pub struct PcaInput {
    pub quant_peptides: DataTable,
    /// Precomputed `index`, `pc1`, `pc2` coordinates
    pub reduced: DataTable,
    pub metadata: DataTable,
    pub conditions: ConditionMap,
}

/// Metadata value per observation label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorColumn {
    pub name: String,
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcaData {
    pub labels: Vec<String>,
    pub points: Vec<[f64; 2]>,
    pub x_label: String,
    pub y_label: String,
    pub color_columns: Vec<ColorColumn>,
    pub table: DataTable,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcaParams {
    pub color_by: Option<String>,
}

pub fn is_available(quant_peptides: &DataTable, reduced: &DataTable) -> bool {
    !(quant_peptides.is_empty() && reduced.is_empty())
}

/// Runs × peptides, missing intensities kept as NaN
fn run_matrix(quant_peptides: &DataTable) -> Option<LabeledMatrix> {
    let runs: Vec<&str> = quant_peptides
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !matches!(*c, "Peptide" | "Protein" | "numFragments"))
        .collect();
    if runs.is_empty() {
        return None;
    }
    LabeledMatrix::from_table(quant_peptides, "Peptide", &runs)
        .ok()
        .map(|m| m.transpose())
}

fn fitted(quant_peptides: &DataTable) -> Option<PcaData> {
    let pca = Pca::fit(&run_matrix(quant_peptides)?, 3)?;
    let points: Vec<[f64; 2]> = pca
        .scores
        .iter()
        .map(|s| [s[0], s.get(1).copied().unwrap_or(0.0)])
        .collect();

    let mut columns = vec!["index".to_string()];
    columns.extend((0..pca.n_components()).map(|c| format!("pc{}", c + 1)));
    let rows = pca
        .observations
        .iter()
        .zip(&pca.scores)
        .map(|(obs, s)| {
            let mut r = vec![Cell::text(obs.clone())];
            r.extend(s.iter().map(|v| Cell::number(*v)));
            r
        })
        .collect();

    Some(PcaData {
        labels: pca.observations.clone(),
        points,
        x_label: pca.axis_label(0),
        y_label: pca.axis_label(1),
        color_columns: Vec::new(),
        table: DataTable::new(columns, rows),
    })
}

fn precomputed(reduced: DataTable) -> PcaData {
    let (Ok(labels), Ok(x), Ok(y)) = (
        reduced.text_column("index"),
        reduced.number_column("pc1"),
        reduced.number_column("pc2"),
    ) else {
        log::warn!("PCA coordinates lack index/pc1/pc2 columns");
        return PcaData::default();
    };
    PcaData {
        labels,
        points: x.into_iter().zip(y).map(|(x, y)| [x, y]).collect(),
        x_label: "PC1".into(),
        y_label: "PC2".into(),
        color_columns: Vec::new(),
        table: reduced,
    }
}

fn color_columns(metadata: &DataTable, conditions: &ConditionMap) -> Vec<ColorColumn> {
    let Ok(runs) = metadata.text_column("Run") else {
        return Vec::new();
    };
    COLOR_COLUMNS
        .iter()
        .filter_map(|name| {
            let values = metadata.text_column(name).ok()?;
            Some(ColorColumn {
                name: name.to_string(),
                values: runs
                    .iter()
                    .zip(values)
                    .map(|(run, v)| (conditions.label(run), v))
                    .collect(),
            })
        })
        .collect()
}

pub fn preprocess(input: PcaInput) -> PcaData {
    let mut data = if input.quant_peptides.is_empty() {
        precomputed(input.reduced)
    } else {
        fitted(&input.quant_peptides).unwrap_or_else(|| {
            log::warn!("Too few runs for PCA; using precomputed coordinates");
            precomputed(input.reduced)
        })
    };
    data.color_columns = color_columns(&input.metadata, &input.conditions);
    data
}

fn groups(data: &PcaData, color_by: Option<&ColorColumn>) -> Vec<ScatterGroup> {
    let Some(column) = color_by else {
        return vec![ScatterGroup {
            name: "Samples".into(),
            points: data.points.clone(),
            labels: data.labels.clone(),
            color: primary(),
        }];
    };
    let mut by_value: BTreeMap<String, (Vec<[f64; 2]>, Vec<String>)> = BTreeMap::new();
    for (label, point) in data.labels.iter().zip(&data.points) {
        let value = column.values.get(label).cloned().unwrap_or_else(|| "NA".into());
        let slot = by_value.entry(value).or_default();
        slot.0.push(*point);
        slot.1.push(label.clone());
    }
    by_value
        .into_iter()
        .enumerate()
        .map(|(i, (name, (points, labels)))| ScatterGroup {
            name,
            points,
            labels,
            color: palette(i),
        })
        .collect()
}

pub fn build(data: &PcaData, params: &PcaParams, _ctx: &FigureContext) -> FigureOutput {
    let color_by = params
        .color_by
        .as_ref()
        .and_then(|name| data.color_columns.iter().find(|c| &c.name == name));
    let chart = Chart::Scatter(ScatterChart {
        title: String::new(),
        groups: groups(data, color_by),
        x_label: data.x_label.clone(),
        y_label: data.y_label.clone(),
    });
    FigureOutput::new(vec![chart], data.table.clone())
}

fn controls(ui: &mut Ui, params: &mut PcaParams, data: &PcaData, _ctx: &FigureContext) -> bool {
    if data.color_columns.is_empty() {
        return false;
    }
    let before = params.color_by.clone();
    egui::ComboBox::from_label("Color by")
        .selected_text(params.color_by.as_deref().unwrap_or("None"))
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut params.color_by, None, "None");
            for column in &data.color_columns {
                ui.selectable_value(&mut params.color_by, Some(column.name.clone()), &column.name);
            }
        });
    before != params.color_by
}

pub fn create(dataset: &str, input: PcaInput) -> Figure<PcaData, PcaParams> {
    Figure::new(
        FigureMeta::new(TITLE, "Peptide Intensities PCA", dataset).description(
            "A PCA (Principal Component Analysis) Plot where for each sample/bio replicate the \
             peptide intensity was reduced to two principal components. Samples that are closer \
             together are more similar, samples that are farther apart less so. Most ideally \
             we'll see similar replicates/treatments clustered together. If not, there could \
             have potentially been batch effects. The input data to the PCA algorithm were the \
             raw, unnormalized intensities.",
        ),
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
    use pretty_assertions::assert_eq;

    fn quant_peptides() -> DataTable {
        let n = Cell::number;
        DataTable::new(
            vec![
                "Peptide".into(),
                "Protein".into(),
                "numFragments".into(),
                "A:HeLa:1".into(),
                "A:HeLa:2".into(),
                "B:HeLa:1".into(),
            ],
            vec![
                vec![Cell::text("PEPA"), Cell::text("P1"), n(5.0), n(10.0), n(11.0), n(30.0)],
                vec![Cell::text("PEPB"), Cell::text("P1"), n(5.0), n(20.0), n(19.0), n(2.0)],
                vec![Cell::text("PEPC"), Cell::text("P2"), n(5.0), n(5.0), n(6.0), n(5.0)],
            ],
        )
    }

    fn metadata() -> DataTable {
        let t = |s: &str| Cell::text(s);
        DataTable::new(
            vec!["Run".into(), "Working Compound".into()],
            vec![
                vec![t("r1.raw"), t("A")],
                vec![t("r2.raw"), t("A")],
                vec![t("r3.raw"), t("B")],
            ],
        )
    }

    fn conditions() -> ConditionMap {
        ConditionMap::from_pairs([("r1", "A:HeLa:1"), ("r2", "A:HeLa:2"), ("r3", "B:HeLa:1")])
    }

    #[test]
    fn test_fit_labels_axes_with_explained_variance() {
        let data = preprocess(PcaInput {
            quant_peptides: quant_peptides(),
            ..Default::default()
        });
        assert_eq!(data.labels, vec!["A:HeLa:1", "A:HeLa:2", "B:HeLa:1"]);
        assert!(data.x_label.starts_with("PC1 ("));
        assert!(data.x_label.ends_with("%)"));
        assert_eq!(data.table.columns, vec!["index", "pc1", "pc2", "pc3"]);
        // the odd run out sits alone on the first component
        let a = data.points[0][0];
        let b = data.points[2][0];
        assert!((a - data.points[1][0]).abs() < (a - b).abs());
    }

    #[test]
    fn test_falls_back_to_precomputed_coordinates() {
        let reduced = DataTable::new(
            vec!["index".into(), "pc1".into(), "pc2".into()],
            vec![
                vec![Cell::text("S1"), Cell::number(1.0), Cell::number(-1.0)],
                vec![Cell::text("S2"), Cell::number(0.5), Cell::number(2.0)],
            ],
        );
        let data = preprocess(PcaInput {
            reduced: reduced.clone(),
            ..Default::default()
        });
        assert_eq!(data.x_label, "PC1");
        assert_eq!(data.points, vec![[1.0, -1.0], [0.5, 2.0]]);
        assert_eq!(data.table, reduced);
    }

    #[test]
    fn test_color_by_metadata_groups_points() {
        let data = preprocess(PcaInput {
            quant_peptides: quant_peptides(),
            metadata: metadata(),
            conditions: conditions(),
            ..Default::default()
        });
        assert_eq!(data.color_columns.len(), 1);
        let limits = Limits::default();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: None,
        };
        let params = PcaParams {
            color_by: Some("Working Compound".into()),
        };
        let out = build(&data, &params, &ctx);
        let Chart::Scatter(s) = &out.charts[0] else {
            panic!("expected a scatter chart");
        };
        let names: Vec<&str> = s.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(s.groups[0].labels, vec!["A:HeLa:1", "A:HeLa:2"]);

        let plain = build(&data, &PcaParams::default(), &ctx);
        let Chart::Scatter(s) = &plain.charts[0] else {
            panic!("expected a scatter chart");
        };
        assert_eq!(s.groups.len(), 1);
    }
}
