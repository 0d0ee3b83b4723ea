//! Raw file size table

use std::collections::HashMap;

use super::{no_controls, Figure, FigureContext, FigureMeta, FigureOutput, FigureSpec};
use crate::data::table::{Cell, DataTable};

pub const TITLE: &str = "Raw File Sizes";

#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    pub path: String,
    pub kind: String,
    pub size: Option<u64>,
}

/// Metadata plus the object sizes looked up for its raw paths
#[derive(Debug, Clone, Default)]
pub struct FileSizesInput {
    pub metadata: DataTable,
    pub sizes: HashMap<String, u64>,
}

/// Distinct non-empty `RAW S3 Path` values, in table order
pub fn raw_paths(metadata: &DataTable) -> Vec<String> {
    let mut seen = Vec::new();
    for path in metadata.text_column("RAW S3 Path").unwrap_or_default() {
        if !path.is_empty() && !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen
}

pub fn is_available(metadata: &DataTable) -> bool {
    !raw_paths(metadata).is_empty()
}

/// Distinct `(RAW S3 Path, Acquisition Type)` pairs
pub fn preprocess(input: FileSizesInput) -> Vec<RawFile> {
    if !input.metadata.has_column("RAW S3 Path") {
        return Vec::new();
    }
    let pairs = input.metadata.select(&["RAW S3 Path", "Acquisition Type"]).distinct();
    pairs
        .rows
        .iter()
        .filter_map(|row| {
            let path = row.first()?.to_string();
            if path.is_empty() {
                return None;
            }
            Some(RawFile {
                size: input.sizes.get(&path).copied(),
                kind: row.get(1).map(Cell::to_string).unwrap_or_default(),
                path,
            })
        })
        .collect()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').find(|p| !p.is_empty()).unwrap_or(path)
}

pub fn build(files: &Vec<RawFile>, _params: &(), _ctx: &FigureContext) -> FigureOutput {
    let mut rows: Vec<Vec<Cell>> = files
        .iter()
        .map(|f| {
            vec![
                Cell::text(basename(&f.path)),
                Cell::text(f.kind.clone()),
                f.size.map_or(Cell::Missing, |s| Cell::Number(s as f64)),
            ]
        })
        .collect();
    rows.sort_by(|a, b| a[0].to_string().cmp(&b[0].to_string()));
    FigureOutput::table_only(DataTable::new(
        vec!["File".into(), "Type".into(), "Size".into()],
        rows,
    ))
}

pub fn create(dataset: &str, input: FileSizesInput) -> Figure<Vec<RawFile>, ()> {
    Figure::new(
        FigureMeta::new(TITLE, TITLE, dataset).description("A DataFrame containing the .raw file sizes."),
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
    use pretty_assertions::assert_eq;

    fn metadata() -> DataTable {
        DataTable::new(
            vec!["Run".into(), "RAW S3 Path".into(), "Acquisition Type".into()],
            vec![
                vec![Cell::text("R2"), Cell::text("runs/b/R2.raw"), Cell::text("Wide DIA")],
                vec![Cell::text("R1"), Cell::text("runs/a/R1.raw"), Cell::text("Wide DIA")],
                vec![Cell::text("R1b"), Cell::text("runs/a/R1.raw"), Cell::text("Wide DIA")],
                vec![Cell::text("R3"), Cell::Missing, Cell::text("Narrow DIA")],
            ],
        )
    }

    #[test]
    fn test_distinct_paths_sorted_by_basename() {
        let mut sizes = HashMap::new();
        sizes.insert("runs/a/R1.raw".to_string(), 2048);
        let files = preprocess(FileSizesInput {
            metadata: metadata(),
            sizes,
        });
        assert_eq!(files.len(), 2);
        assert_eq!(raw_paths(&metadata()), vec!["runs/b/R2.raw", "runs/a/R1.raw"]);

        let limits = Limits::default();
        let ctx = FigureContext {
            limits: &limits,
            custom_filter: None,
        };
        let out = build(&files, &(), &ctx);
        assert!(out.charts.is_empty());
        assert_eq!(out.table.text_column("File").unwrap(), vec!["R1.raw", "R2.raw"]);
        assert_eq!(out.table.rows[0][2], Cell::Number(2048.0));
        assert_eq!(out.table.rows[1][2], Cell::Missing);
    }

    #[test]
    fn test_availability_needs_a_raw_path() {
        assert!(is_available(&metadata()));
        assert!(!is_available(&DataTable::empty()));
    }
}
