//! Dataset selector

/// Candidate datasets and the current choice. The choice starts empty and
/// switching it is reported once, so the app rebuilds the report on change.
#[derive(Debug, Clone, Default)]
pub struct DatasetChoice {
    datasets: Vec<String>,
    selected: Option<String>,
}

impl DatasetChoice {
    pub fn new(datasets: Vec<String>) -> Self {
        Self {
            datasets,
            selected: None,
        }
    }

    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Replace the candidates; keeps the selection if it is still listed
    pub fn set_datasets(&mut self, datasets: Vec<String>) {
        if let Some(s) = &self.selected {
            if !datasets.contains(s) {
                self.selected = None;
            }
        }
        self.datasets = datasets;
    }

    /// Returns whether the selection changed
    pub fn select(&mut self, dataset: &str) -> bool {
        if self.selected.as_deref() == Some(dataset) || !self.datasets.iter().any(|d| d == dataset) {
            return false;
        }
        self.selected = Some(dataset.to_string());
        true
    }

    /// Combo box; returns the newly chosen dataset
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<String> {
        let mut choice = self.selected.clone();
        egui::ComboBox::from_label("Dataset")
            .selected_text(choice.as_deref().unwrap_or("Select a dataset…"))
            .width(220.0)
            .show_ui(ui, |ui| {
                for dataset in &self.datasets {
                    ui.selectable_value(&mut choice, Some(dataset.clone()), dataset);
                }
            });
        if self.datasets.is_empty() {
            ui.weak("No datasets found.");
        }
        match choice {
            Some(d) if self.select(&d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_selection_changes_once() {
        let mut choice = DatasetChoice::new(vec!["PXD1".into(), "PXD2".into()]);
        assert_eq!(choice.selected(), None);
        assert!(choice.select("PXD2"));
        assert!(!choice.select("PXD2"));
        assert!(!choice.select("unknown"));
        assert_eq!(choice.selected(), Some("PXD2"));
    }

    #[test]
    fn test_relisting_drops_vanished_selection() {
        let mut choice = DatasetChoice::new(vec!["PXD1".into()]);
        choice.select("PXD1");
        choice.set_datasets(vec!["PXD1".into(), "PXD3".into()]);
        assert_eq!(choice.selected(), Some("PXD1"));
        choice.set_datasets(vec!["PXD3".into()]);
        assert_eq!(choice.selected(), None);
        assert_eq!(choice.datasets(), &["PXD3".to_string()]);
    }
}
