use std::path::Path;

use eframe::egui;

use compview::config::ReviewConfig;
use compview::data::loader;
use compview::data::model::Classification;
use compview::selection::Direction;
use compview::state::ReviewState;

use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ComponentReviewApp {
    pub state: ReviewState,
    title: String,
}

impl ComponentReviewApp {
    pub fn new(config: ReviewConfig) -> Self {
        let state = ReviewState::new(config);
        let title = state.title();
        Self { state, title }
    }

    /// Load a results folder synchronously and hand it to the state.
    pub fn open_folder(&mut self, dir: &Path) {
        open_folder(&mut self.state, dir);
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Text fields keep their keys.
        if ctx.wants_keyboard_input() {
            return;
        }
        let (prev, next, accept, reject, ignore) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft) || i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowRight) || i.key_pressed(egui::Key::ArrowDown),
                i.key_pressed(egui::Key::A),
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::I),
            )
        });
        if prev {
            self.state.navigate(Direction::Previous);
        }
        if next {
            self.state.navigate(Direction::Next);
        }
        if accept {
            self.state.classify(Classification::Accepted);
        }
        if reject {
            self.state.classify(Classification::Rejected);
        }
        if ignore {
            self.state.classify(Classification::Ignored);
        }
    }
}

impl eframe::App for ComponentReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        let title = self.state.title();
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: classification and component info ----
        egui::SidePanel::left("component_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: metrics table ----
        egui::TopBottomPanel::bottom("table_panel")
            .default_height(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::metrics_table(ui, &mut self.state);
            });

        // ---- Central panel: plots and figures ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::central_views(ui, &mut self.state);
        });
    }
}

// ---------------------------------------------------------------------------
// Folder loading
// ---------------------------------------------------------------------------

pub fn open_folder(state: &mut ReviewState, dir: &Path) {
    match loader::load_folder(dir) {
        Ok(dataset) => state.set_dataset(dataset),
        Err(e) => {
            log::error!("Failed to load folder: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_folder_replaces_state_or_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("desc-tedana_metrics.tsv"),
            "Component\tkappa\trho\tvariance explained\tclassification\n\
ICA_00\t1\t2\t3\taccepted\n",
        )
        .unwrap();

        let mut state = ReviewState::default();
        state.status_message = Some("stale".into());
        open_folder(&mut state, dir.path());
        assert_eq!(state.controller.as_ref().map(|c| c.catalog().len()), Some(1));
        assert!(state.status_message.is_none());

        open_folder(&mut state, &dir.path().join("missing"));
        assert!(state.status_message.unwrap().starts_with("Error"));
        assert_eq!(state.controller.map(|c| c.catalog().len()), Some(1));
    }
}
