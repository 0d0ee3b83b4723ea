/// Main application state and eframe::App implementation
///
/// Ties together configuration, the data loader, the report and the GUI
/// panels. Expensive work only happens on explicit events: a dataset change,
/// a widget change, an upload or a reload.

use std::fs;
use std::path::Path;

use eframe::egui;

use crate::config::ReportConfig;
use crate::data::custom_proteins::CustomProteinSet;
use crate::data::loader::DataLoader;
use crate::data::storage::FsObjectStore;
use crate::error::Result;
use crate::figures::FigureEvent;
use crate::gui::dataset_choice::DatasetChoice;
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction};
use crate::gui::uploader::{ProteinUploader, UploadEvent};
use crate::log::session::SessionLog;
use crate::report::downloads::Downloads;
use crate::report::pdf::{self, ExportedReport};
use crate::report::{self, Report};

pub struct ReportApp {
    config: ReportConfig,
    loader: DataLoader,
    datasets: DatasetChoice,
    /// Rebuilt from scratch on every dataset change
    report: Option<Report>,

    custom: CustomProteinSet,
    uploader: ProteinUploader,
    downloads: Option<Downloads>,

    session: SessionLog,

    status_message: String,
    show_log_window: bool,
    show_about: bool,

    current_theme: AppTheme,
    theme_colors: ThemeColors,
}

impl ReportApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ReportConfig) -> Self {
        theme::apply_theme(&cc.egui_ctx, AppTheme::Light);

        let ppi = cc.egui_ctx.pixels_per_point();
        let base_size = if ppi > 1.5 { 14.0 } else { 13.0 };
        let mut style = (*cc.egui_ctx.style()).clone();
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(base_size, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::new(base_size * 1.35, egui::FontFamily::Proportional),
        );
        style.spacing.item_spacing = egui::vec2(8.0, 5.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        cc.egui_ctx.set_style(style);

        Self::with_config(config)
    }

    /// Application state without a window
    pub fn with_config(config: ReportConfig) -> Self {
        let store = FsObjectStore::new(config.storage.root.clone());
        let loader = DataLoader::new(config.clone(), Box::new(store));
        let datasets = DatasetChoice::new(loader.list_datasets());
        let downloads = match Downloads::create(&config.downloads_dir) {
            Ok(d) => Some(d),
            Err(e) => {
                log::error!("Downloads disabled: {}", e);
                None
            }
        };
        let status_message = if datasets.datasets().is_empty() {
            "No datasets found; check the storage configuration".to_string()
        } else {
            format!("{} datasets available; select one to begin", datasets.datasets().len())
        };

        Self {
            config,
            loader,
            datasets,
            report: None,
            custom: CustomProteinSet::default(),
            uploader: ProteinUploader::default(),
            downloads,
            session: SessionLog::new(),
            status_message,
            show_log_window: false,
            show_about: false,
            current_theme: AppTheme::Light,
            theme_colors: ThemeColors::from_theme(AppTheme::Light),
        }
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn session(&self) -> &SessionLog {
        &self.session
    }

    /// Load and assemble the report for `dataset`
    pub fn select_dataset(&mut self, dataset: &str) {
        self.datasets.select(dataset);
        self.session.set_dataset(dataset);
        let report = Report::build(dataset, &mut self.loader, &self.config);
        self.status_message = format!(
            "Dataset '{}': {} figures, {} conditions",
            dataset,
            report.figures().len(),
            report.conditions().len()
        );
        self.report = Some(report);
    }

    fn reload(&mut self) {
        self.loader.invalidate(None);
        self.datasets.set_datasets(self.loader.list_datasets());
        self.session.record("Data reloaded", "");
        match self.report.as_ref().map(|r| r.dataset().to_string()) {
            Some(dataset) => {
                self.report = None;
                self.select_dataset(&dataset);
            }
            None => self.status_message = "Data reloaded".to_string(),
        }
    }

    /// Render the active figures into one PDF
    pub fn export_pdf(&mut self) -> Result<Option<ExportedReport>> {
        let Some(report) = self.report.as_mut() else {
            return Ok(None);
        };
        report.refresh(&self.config.limits, &self.custom);
        let exported = pdf::export(&self.config.report_title, &report.active_figures())?;
        self.session.record("PDF exported", &exported.file_name);
        Ok(Some(exported))
    }

    fn save_log(&mut self, path: &Path) -> Result<()> {
        let is_json = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        self.session.record("Session log exported", &path.display().to_string());
        if is_json {
            self.session.save_json(path)
        } else {
            self.session.save_text(path)
        }
    }

    fn handle_toolbar_action(&mut self, ctx: &egui::Context, action: ToolbarAction) {
        match action {
            ToolbarAction::None => {}
            ToolbarAction::ExportPdf => match self.export_pdf() {
                Ok(Some(exported)) => {
                    if let Some(path) = toolbar::save_pdf_dialog(&exported.file_name) {
                        match fs::write(&path, &exported.bytes) {
                            Ok(()) => {
                                self.status_message = format!("✅ PDF saved: {}", path.display());
                            }
                            Err(e) => {
                                log::error!("Writing {} failed: {}", path.display(), e);
                                self.status_message = format!("❌ PDF save failed: {}", e);
                            }
                        }
                    }
                }
                Ok(None) => self.status_message = "Select a dataset before exporting".to_string(),
                Err(e) => {
                    log::error!("PDF export failed: {}", e);
                    self.status_message = format!("❌ PDF export failed: {}", e);
                }
            },
            ToolbarAction::ExportLog => {
                if let Some(path) = toolbar::save_log_dialog() {
                    match self.save_log(&path) {
                        Ok(()) => self.status_message = format!("Log saved: {}", path.display()),
                        Err(e) => {
                            log::error!("Saving session log failed: {}", e);
                            self.status_message = format!("Error saving log: {}", e);
                        }
                    }
                }
            }
            ToolbarAction::OpenDownloads => {
                self.status_message = match &self.downloads {
                    Some(d) => format!("Downloads are written to {}", d.dir().display()),
                    None => "Downloads are disabled".to_string(),
                };
            }
            ToolbarAction::ReloadData => self.reload(),
            ToolbarAction::ShowAllFigures | ToolbarAction::HideAllFigures => {
                let active = action == ToolbarAction::ShowAllFigures;
                if let Some(report) = self.report.as_mut() {
                    report.set_all_active(active);
                    self.session.record(
                        if active { "All figures shown" } else { "All figures hidden" },
                        "",
                    );
                }
            }
            ToolbarAction::ToggleLogWindow => self.show_log_window = !self.show_log_window,
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
                theme::apply_theme(ctx, self.current_theme);
            }
            ToolbarAction::ShowAbout => self.show_about = true,
        }
    }

    fn handle_upload_events(&mut self, events: Vec<UploadEvent>) {
        for event in events {
            match event {
                UploadEvent::Added(name) => self.session.record("Protein list uploaded", &name),
                UploadEvent::Removed(name) => self.session.record("Protein list removed", &name),
                UploadEvent::ColumnChanged { file, column } => self
                    .session
                    .record("Protein column changed", &format!("{}: {}", file, column)),
                UploadEvent::Failed { file, error } => {
                    self.status_message = format!("❌ Could not read {}: {}", file, error);
                }
            }
        }
    }

    fn handle_figure_events(&mut self, events: Vec<FigureEvent>) {
        for event in events {
            match event {
                FigureEvent::Downloaded { figure, path } => {
                    self.status_message = format!("✅ Downloaded {}", path.display());
                    self.session
                        .record("Download", &format!("{}: {}", figure, path.display()));
                }
                FigureEvent::DownloadFailed { figure, error } => {
                    log::error!("Download for {} failed: {}", figure, error);
                    self.status_message = format!("❌ Download failed: {}", error);
                }
            }
        }
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.add_space(4.0);
                    if let Some(dataset) = self.datasets.show(ui) {
                        self.select_dataset(&dataset);
                    }
                    let Some(report) = self.report.as_mut() else {
                        return;
                    };

                    ui.separator();
                    egui::CollapsingHeader::new("Figures")
                        .default_open(true)
                        .show(ui, |ui| {
                            for (title, active) in report.show_toggles(ui) {
                                self.session.record(
                                    if active { "Figure shown" } else { "Figure hidden" },
                                    &title,
                                );
                            }
                        });

                    ui.separator();
                    let events = self.uploader.show(ui, &mut self.custom);

                    ui.add_space(6.0);
                    ui.label(theme::heading("Figure Settings", &self.theme_colors));
                    report.show_controls(ui, &self.config.limits, &mut self.custom);
                    self.handle_upload_events(events);
                });
            });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        let colors = self.theme_colors.clone();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(egui::Frame::new().fill(colors.status_bar_bg).inner_margin(4.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.5)
                            .color(colors.status_text),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("📋 Log").clicked() {
                            self.show_log_window = !self.show_log_window;
                        }
                        ui.label(
                            egui::RichText::new(format!("{} actions", self.session.len()))
                                .size(11.0)
                                .color(colors.text_muted),
                        );
                        ui.separator();
                        if !self.custom.is_empty() {
                            ui.colored_label(
                                colors.accent,
                                egui::RichText::new(format!("● {} custom proteins", self.custom.len())).size(11.0),
                            );
                            ui.separator();
                        }
                        let mode = if self.config.local_mode { "local files" } else { "object store" };
                        ui.colored_label(colors.success, egui::RichText::new(format!("● {}", mode)).size(11.0));
                    });
                });
            });
    }

    fn show_windows(&mut self, ctx: &egui::Context) {
        if self.show_log_window {
            egui::Window::new("Session Log")
                .open(&mut self.show_log_window)
                .default_size([560.0, 360.0])
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
                        for entry in &self.session.entries {
                            ui.monospace(entry.to_text());
                        }
                    });
                });
        }

        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading(format!("🧪 {}", self.config.report_title));
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("• Dataset loading from an object store or local files");
                    ui.label("• Per-figure toggles, settings and CSV/SVG downloads");
                    ui.label("• Custom protein list filtering");
                    ui.label("• PDF export of the active figures");
                    ui.label("• Session log export");
                });
        }
    }
}

impl eframe::App for ReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let can_export = self.report.is_some();
        let action = toolbar::show_toolbar(
            ctx,
            &self.config.report_title,
            self.current_theme.label(),
            can_export,
        );
        self.handle_toolbar_action(ctx, action);

        self.show_status_bar(ctx);
        self.show_sidebar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(report) = self.report.as_mut() else {
                report::show_no_dataset(ui);
                return;
            };
            let events = egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.label(theme::heading(&self.config.report_title, &self.theme_colors));
                    ui.weak(format!("Dataset: {}", report.dataset()));
                    ui.add_space(8.0);
                    report.show_figures(ui, &self.config.limits, &self.custom, self.downloads.as_ref())
                })
                .inner;
            self.handle_figure_events(events);
        });

        self.show_windows(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(root: &Path) -> ReportConfig {
        let mut config = ReportConfig::default();
        config.storage.root = root.join("store");
        config.downloads_dir = root.join("downloads");
        config
    }

    #[test]
    fn test_starts_without_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = ReportApp::with_config(config(tmp.path()));
        assert!(app.report().is_none());
        assert!(app.session().is_empty());
        assert!(app.export_pdf().unwrap().is_none());
        assert!(tmp.path().join("downloads").is_dir());
    }

    #[test]
    fn test_local_mode_selects_local_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(tmp.path());
        cfg.local_mode = true;
        cfg.local.data_dir = tmp.path().join("data");
        cfg.local.unique_counts = "unique_counts.csv".into();
        fs::create_dir_all(&cfg.local.data_dir).unwrap();
        fs::write(
            cfg.local.data_dir.join(&cfg.local.unique_counts),
            "Run,Unique Proteins,Unique Peptides\nr1.raw,10,40\nr2.raw,12,44\n",
        )
        .unwrap();

        let mut app = ReportApp::with_config(cfg);
        app.select_dataset("local");
        let report = app.report().unwrap();
        assert_eq!(report.dataset(), "local");
        assert_eq!(report.figure_titles(), vec!["# Unique Peptides and Proteins"]);
        assert_eq!(app.session().dataset.as_deref(), Some("local"));

        let exported = app.export_pdf().unwrap().unwrap();
        assert!(exported.bytes.starts_with(b"%PDF"));
        assert_eq!(app.session().entries.last().unwrap().action, "PDF exported");
    }
}
