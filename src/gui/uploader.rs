//! Custom protein list uploader panel

use std::path::PathBuf;

use crate::data::custom_proteins::{CustomProteinSet, UploadedFile};
use crate::gui::toolbar;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Added(String),
    Removed(String),
    ColumnChanged { file: String, column: String },
    Failed { file: String, error: String },
}

#[derive(Debug, Clone, Default)]
pub struct ProteinUploader {
    files: Vec<UploadedFile>,
}

impl ProteinUploader {
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Read each path; unreadable files are reported and skipped
    pub fn add_paths(&mut self, paths: &[PathBuf], set: &mut CustomProteinSet) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        for path in paths {
            match UploadedFile::open(path) {
                Ok(file) => {
                    events.push(UploadEvent::Added(file.name.clone()));
                    self.files.push(file);
                }
                Err(e) => {
                    log::error!("Upload of {} failed: {}", path.display(), e);
                    events.push(UploadEvent::Failed {
                        file: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        if events.iter().any(|e| matches!(e, UploadEvent::Added(_))) {
            set.rebuild(&self.files);
        }
        events
    }

    pub fn remove(&mut self, index: usize, set: &mut CustomProteinSet) -> Option<UploadEvent> {
        if index >= self.files.len() {
            return None;
        }
        let file = self.files.remove(index);
        set.rebuild(&self.files);
        Some(UploadEvent::Removed(file.name))
    }

    pub fn set_column(&mut self, index: usize, column: &str, set: &mut CustomProteinSet) -> Option<UploadEvent> {
        let file = self.files.get_mut(index)?;
        if file.protein_column == column || !file.table.has_column(column) {
            return None;
        }
        file.protein_column = column.to_string();
        let event = UploadEvent::ColumnChanged {
            file: file.name.clone(),
            column: column.to_string(),
        };
        set.rebuild(&self.files);
        Some(event)
    }

    pub fn show(&mut self, ui: &mut egui::Ui, set: &mut CustomProteinSet) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        ui.strong("Custom Protein Lists");
        if ui.button("📂 Upload protein lists…").clicked() {
            if let Some(paths) = toolbar::open_protein_lists_dialog() {
                events.extend(self.add_paths(&paths, set));
            }
        }

        let mut remove = None;
        let mut column_change = None;
        for (i, file) in self.files.iter().enumerate() {
            ui.push_id(i, |ui| {
                ui.horizontal(|ui| {
                    if ui.small_button("🗑").on_hover_text("Remove").clicked() {
                        remove = Some(i);
                    }
                    ui.label(&file.name);
                });
                let mut column = file.protein_column.clone();
                egui::ComboBox::from_label("Protein column")
                    .selected_text(&column)
                    .show_ui(ui, |ui| {
                        for c in &file.table.columns {
                            ui.selectable_value(&mut column, c.clone(), c);
                        }
                    });
                if column != file.protein_column {
                    column_change = Some((i, column));
                }
            });
        }
        if let Some(i) = remove {
            events.extend(self.remove(i, set));
        } else if let Some((i, column)) = column_change {
            events.extend(self.set_column(i, &column, set));
        }

        if !set.is_empty() {
            ui.weak(format!("{} proteins in the custom list", set.len()));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_uploads_rebuild_the_set_from_scratch() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.csv");
        let b = tmp.path().join("b.tsv");
        fs::write(&a, "Protein,Gene\nsp|P1|X_HUMAN,X\nP2,Y\n").unwrap();
        fs::write(&b, "id\tProteinName\nQ9\tsp|P3|Z_HUMAN\n").unwrap();

        let mut uploader = ProteinUploader::default();
        let mut set = CustomProteinSet::default();
        let events = uploader.add_paths(&[a, b, tmp.path().join("missing.csv")], &mut set);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], UploadEvent::Failed { .. }));
        assert_eq!(set.len(), 3);
        let first_revision = set.revision();

        let changed = uploader.set_column(1, "id", &mut set);
        assert_eq!(
            changed,
            Some(UploadEvent::ColumnChanged {
                file: "b.tsv".into(),
                column: "id".into()
            })
        );
        assert!(set.contains("Q9"));
        assert!(!set.contains("P3"));
        assert!(set.revision() > first_revision);

        assert_eq!(uploader.remove(0, &mut set), Some(UploadEvent::Removed("a.csv".into())));
        assert_eq!(set.proteins().iter().collect::<Vec<_>>(), vec!["Q9"]);
        assert_eq!(uploader.remove(5, &mut set), None);
    }

    #[test]
    fn test_unknown_column_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.csv");
        fs::write(&a, "Protein\nP1\n").unwrap();
        let mut uploader = ProteinUploader::default();
        let mut set = CustomProteinSet::default();
        uploader.add_paths(&[a], &mut set);
        assert_eq!(uploader.set_column(0, "Nope", &mut set), None);
        assert_eq!(uploader.set_column(0, "Protein", &mut set), None);
        assert_eq!(uploader.files().len(), 1);
    }
}
