use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::chart::export::download_link;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – uploads and column selection
// ---------------------------------------------------------------------------

/// Render the left panel: one column picker per uploaded file.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Files");
    ui.separator();

    if state.uploads.is_empty() && state.failures.is_empty() {
        ui.label("Please upload at least one CSV file.");
        if ui.button("Open CSV files…").clicked() {
            open_files_dialog(state, false);
        }
        return;
    }

    // Applied after the loop so the uploads are not borrowed while mutating.
    let mut picked: Option<(usize, String)> = None;
    let mut remove: Option<usize> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, upload) in state.uploads.iter().enumerate() {
                ui.horizontal(|ui: &mut Ui| {
                    ui.strong(&upload.name);
                    if ui.small_button("✕").on_hover_text("Remove file").clicked() {
                        remove = Some(i);
                    }
                });
                ui.label(format!(
                    "{} rows, {} columns",
                    upload.dataset.len(),
                    upload.dataset.column_names.len()
                ));

                ui.label(format!("Select a column to plot from File {}:", i + 1));
                egui::ComboBox::from_id_salt(("column", i))
                    .selected_text(&upload.selected_column)
                    .show_ui(ui, |ui: &mut Ui| {
                        for col in &upload.dataset.column_names {
                            if ui
                                .selectable_label(upload.selected_column == *col, col)
                                .clicked()
                            {
                                picked = Some((i, col.clone()));
                            }
                        }
                    });
                ui.separator();
            }

            for failure in &state.failures {
                ui.label(
                    RichText::new(format!("{}: {}", failure.name, failure.message))
                        .color(Color32::RED),
                );
            }
        });

    if let Some((i, col)) = picked {
        state.select_column(i, &col);
    }
    if let Some(i) = remove {
        state.remove_file(i);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open CSV files…").clicked() {
                open_files_dialog(state, false);
                ui.close_menu();
            }
            if ui.button("Add CSV files…").clicked() {
                open_files_dialog(state, true);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Clear").clicked() {
                state.clear();
                ui.close_menu();
            }
        });

        let has_chart = state.chart_spec().is_some();
        ui.menu_button("Export", |ui: &mut Ui| {
            if ui
                .add_enabled(has_chart, egui::Button::new("Save HTML…"))
                .clicked()
            {
                save_html_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_chart, egui::Button::new("Copy download link"))
                .on_hover_text("Copies an <a> element carrying the chart as a data URI")
                .clicked()
            {
                copy_download_link(ui, state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.uploads.is_empty() {
            ui.label(format!("{} file(s) loaded", state.uploads.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Pick CSV files; `append` keeps the current uploads.
pub fn open_files_dialog(state: &mut AppState, append: bool) {
    let files = rfd::FileDialog::new()
        .set_title("Upload CSV files")
        .add_filter("CSV", &["csv"])
        .pick_files();

    if let Some(paths) = files {
        if append {
            state.add_files(&paths);
        } else {
            state.open_files(&paths);
        }
    }
}

fn save_html_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export chart")
        .set_file_name(&state.config.export.file_name)
        .add_filter("HTML", &["html"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_to(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn copy_download_link(ui: &Ui, state: &mut AppState) {
    match state.export_html() {
        Ok(document) => {
            let link = download_link(&document, &state.config.export.file_name);
            log::info!("Copied download link ({} bytes)", link.len());
            ui.ctx().copy_text(link);
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
