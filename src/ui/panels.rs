use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use compview::analysis::overlay::MIN_SATURATION;
use compview::data::model::Classification;
use compview::selection::Direction;
use compview::state::ReviewState;

// ---------------------------------------------------------------------------
// Left side panel – component details
// ---------------------------------------------------------------------------

/// Render the left component panel.
pub fn side_panel(ui: &mut Ui, state: &mut ReviewState) {
    let Some(ctl) = &state.controller else {
        ui.heading("Components");
        ui.separator();
        ui.label("No dataset loaded.");
        return;
    };

    // Snapshot what the widgets need so state can be mutated below.
    let selected = ctl
        .selected()
        .map(|c| (c.id.clone(), c.classification(), c.is_manually_changed(), c.ordinal));
    let counts = ctl.catalog().count_by_classification();
    let total = ctl.catalog().len();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Selection + navigation ----
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("◀").on_hover_text("Previous (←)").clicked() {
                    state.navigate(Direction::Previous);
                }
                match &selected {
                    Some((id, ..)) => ui.heading(id),
                    None => ui.heading("No selection"),
                };
                if ui.button("▶").on_hover_text("Next (→)").clicked() {
                    state.navigate(Direction::Next);
                }
            });
            ui.separator();

            // ---- Classification toggle ----
            ui.strong("Classification");
            ui.horizontal(|ui: &mut Ui| {
                for class in Classification::ALL {
                    let active = selected.as_ref().is_some_and(|(_, c, ..)| *c == class);
                    let text = RichText::new(class.as_str())
                        .color(state.colors.color_for(class, active));
                    let button = ui.add_enabled(
                        selected.is_some(),
                        egui::SelectableLabel::new(active, text),
                    );
                    if button.clicked() {
                        state.classify(class);
                    }
                }
            });
            if let Some((_, _, true, _)) = &selected {
                ui.label(RichText::new("manually changed").italics());
            }
            ui.separator();

            // ---- Legend + counts ----
            ui.strong("Summary");
            for (label, color) in state.colors.legend_entries() {
                let n = label
                    .parse::<Classification>()
                    .ok()
                    .and_then(|class| counts.get(&class).copied())
                    .unwrap_or(0);
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new("■").color(color));
                    ui.label(format!("{label}: {n}"));
                });
            }
            ui.label(format!("{total} components"));
            ui.separator();

            // ---- Stat-map overlay ----
            egui::CollapsingHeader::new(RichText::new("Stat map").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    overlay_section(ui, state, selected.as_ref().map(|s| s.3));
                });

            // ---- Run report ----
            if let Some(report) = &state.attachments.report {
                egui::CollapsingHeader::new(RichText::new("Report").strong())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.label(report.as_str());
                    });
            }
        });
}

fn overlay_section(ui: &mut Ui, state: &mut ReviewState, frame: Option<usize>) {
    match &state.attachments.stat_map {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(name);
        }
        None => {
            ui.label("No stat map in folder.");
        }
    }
    if let Some(mask) = &state.attachments.mask {
        ui.label(format!(
            "mask: {}",
            mask.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        ));
    }
    match frame {
        Some(i) => ui.label(format!("frame {i}")),
        None => ui.label("frame –"),
    };

    let mut saturation = state.config.saturation;
    let slider = egui::Slider::new(&mut saturation, MIN_SATURATION..=1.0).text("saturation");
    if ui.add(slider).changed() {
        state.set_saturation(saturation);
    }
    if let Some(range) = state.overlay_range() {
        ui.label(format!(
            "window [{:.2}, {:.2}]",
            range.negative_min, range.positive_max
        ));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ReviewState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            let loaded = state.controller.is_some();
            if ui
                .add_enabled(loaded, egui::Button::new("Save classification…"))
                .clicked()
            {
                save_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let modified = state
            .controller
            .as_ref()
            .is_some_and(|ctl| ctl.catalog().is_modified());
        if ui
            .add_enabled(modified, egui::Button::new("Reset"))
            .on_hover_text("Restore the loaded classifications")
            .clicked()
        {
            state.reset();
        }

        if let Some(ctl) = &state.controller {
            ui.separator();
            let changed = ctl
                .catalog()
                .components()
                .iter()
                .filter(|c| c.is_manually_changed())
                .count();
            ui.label(format!(
                "{} components, {changed} changed",
                ctl.catalog().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut ReviewState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open tedana results folder")
        .pick_folder();

    if let Some(dir) = folder {
        crate::app::open_folder(state, &dir);
    }
}

pub fn save_dialog(state: &mut ReviewState) {
    let folder = rfd::FileDialog::new()
        .set_title("Save manual classification to")
        .set_directory(&state.attachments.root)
        .pick_folder();

    if let Some(dir) = folder {
        if let Err(e) = state.export_to(&dir) {
            log::error!("Failed to save classification: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
