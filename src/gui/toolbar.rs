/// Toolbar: top menu bar with report-level actions

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    ExportPdf,
    ExportLog,
    OpenDownloads,
    ReloadData,
    ShowAllFigures,
    HideAllFigures,
    ToggleLogWindow,
    ThemeToggle,
    ShowAbout,
}

/// Render the toolbar and return any triggered action
pub fn show_toolbar(ctx: &egui::Context, title: &str, theme_label: &str, can_export: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("📁 File", |ui| {
                if ui
                    .add_enabled(can_export, egui::Button::new("📄 Export to PDF…"))
                    .clicked()
                {
                    action = ToolbarAction::ExportPdf;
                    ui.close_menu();
                }
                if ui.button("📋 Export Session Log…").clicked() {
                    action = ToolbarAction::ExportLog;
                    ui.close_menu();
                }
                if ui.button("📂 Show Downloads Folder").clicked() {
                    action = ToolbarAction::OpenDownloads;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("🔄 Reload Data").clicked() {
                    action = ToolbarAction::ReloadData;
                    ui.close_menu();
                }
            });

            ui.menu_button("🔍 View", |ui| {
                if ui.button("Show All Figures").clicked() {
                    action = ToolbarAction::ShowAllFigures;
                    ui.close_menu();
                }
                if ui.button("Hide All Figures").clicked() {
                    action = ToolbarAction::HideAllFigures;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("📋 Session Log").clicked() {
                    action = ToolbarAction::ToggleLogWindow;
                    ui.close_menu();
                }
                if ui.button(format!("🎨 Theme: {}", theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new(theme_label).size(12.0)).corner_radius(12.0))
                    .clicked()
                {
                    action = ToolbarAction::ThemeToggle;
                }
                if ui
                    .add_enabled(can_export, egui::Button::new("📄 Export to PDF"))
                    .clicked()
                {
                    action = ToolbarAction::ExportPdf;
                }
                ui.separator();
                ui.label(
                    egui::RichText::new(title)
                        .color(egui::Color32::from_rgb(0x70, 0x75, 0x80))
                        .size(12.0),
                );
            });
        });
    });

    action
}

pub fn save_pdf_dialog(file_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Report as PDF")
        .set_file_name(file_name)
        .add_filter("PDF Document", &["pdf"])
        .save_file()
}

pub fn save_log_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Session Log")
        .add_filter("Text File", &["txt"])
        .add_filter("JSON", &["json"])
        .save_file()
}

/// Pick delimited protein lists to upload
pub fn open_protein_lists_dialog() -> Option<Vec<PathBuf>> {
    rfd::FileDialog::new()
        .set_title("Upload Protein Lists")
        .add_filter("Delimited text", &["csv", "tsv", "txt"])
        .add_filter("All Files", &["*"])
        .pick_files()
}
