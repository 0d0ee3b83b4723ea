use egui::{Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::table::DataTable;

/// Scrollable, striped view of a table
pub fn show_table(ui: &mut Ui, id: &str, table: &DataTable, height: f32) {
    if table.is_empty() {
        ui.weak("No rows.");
        return;
    }
    ui.push_id(id, |ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(height)
            .cell_layout(Layout::left_to_right(egui::Align::Center));
        for _ in &table.columns {
            builder = builder.column(Column::auto().resizable(true));
        }
        builder
            .header(20.0, |mut header| {
                for name in &table.columns {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.n_rows(), |mut row| {
                    let cells = &table.rows[row.index()];
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}
