//! Per-session downloads directory
//!
//! Every download gets a fresh `<uuid>.<ext>` name so repeated clicks never
//! overwrite a file the user may already have opened.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::chart::{raster, scene, svg, Chart};
use crate::data::table::DataTable;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Downloads {
    dir: PathBuf,
}

impl Downloads {
    /// Clear and recreate `dir`
    pub fn create(dir: &Path) -> Result<Self> {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        log::info!("Downloads directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", Uuid::new_v4(), ext))
    }

    pub fn write_table(&self, table: &DataTable) -> Result<PathBuf> {
        let path = self.next_path("csv");
        table.write_csv(fs::File::create(&path)?)?;
        log::info!("Wrote {} rows to {}", table.n_rows(), path.display());
        Ok(path)
    }

    pub fn write_svg(&self, chart: &Chart, width: f32, height: f32) -> Result<PathBuf> {
        let path = self.next_path("svg");
        fs::write(&path, svg::render(&scene::layout(chart, width, height)))?;
        log::info!("Wrote SVG: {}", path.display());
        Ok(path)
    }

    pub fn write_png(&self, chart: &Chart, width: f32, height: f32) -> Result<PathBuf> {
        let path = self.next_path("png");
        let img = raster::render(&scene::layout(chart, width, height), 2.0);
        fs::write(&path, raster::to_png_bytes(&img)?)?;
        log::info!("Wrote PNG: {}", path.display());
        Ok(path)
    }
}

/// `file://` link for a written download
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Venn;
    use crate::data::table::Cell;

    #[test]
    fn test_create_clears_previous_session() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("downloads");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("old.csv"), "x").unwrap();

        let downloads = Downloads::create(&dir).unwrap();
        assert_eq!(fs::read_dir(downloads.dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_each_download_gets_a_unique_file() {
        let tmp = tempfile::tempdir().unwrap();
        let downloads = Downloads::create(tmp.path()).unwrap();
        let table = DataTable::new(vec!["a".into()], vec![vec![Cell::number(1.0)]]);
        let first = downloads.write_table(&table).unwrap();
        let second = downloads.write_table(&table).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "a\n1\n");

        let chart = Chart::Venn(Venn {
            title: "Overlap".into(),
            left_label: "A".into(),
            right_label: "B".into(),
            left_only: 1,
            both: 2,
            right_only: 3,
        });
        let svg_path = downloads.write_svg(&chart, 300.0, 200.0).unwrap();
        assert!(fs::read_to_string(&svg_path).unwrap().contains("<circle"));
        let png_path = downloads.write_png(&chart, 300.0, 200.0).unwrap();
        assert_eq!(png_path.extension().and_then(|e| e.to_str()), Some("png"));
        assert!(file_url(&png_path).starts_with("file://"));
    }
}
