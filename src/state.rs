use std::path::Path;

use crate::analysis::overlay::{OverlayRange, OverlayWindow, clamp_saturation};
use crate::analysis::spectrum::{PowerSpectrum, compute_power_spectrum};
use crate::color::ClassColors;
use crate::config::ReviewConfig;
use crate::data::loader::{Attachments, Dataset};
use crate::data::model::Classification;
use crate::error::Result;
use crate::export::{ExportBundle, export, write_bundle};
use crate::selection::{Direction, SelectionController};
use crate::view::{self, ScatterPreset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full review state, independent of rendering.
pub struct ReviewState {
    /// Catalog + selection (None until a folder is loaded).
    pub controller: Option<SelectionController>,

    /// Figures, mixing matrix and report of the loaded folder.
    pub attachments: Attachments,

    /// Colour window of the stat-map overlay, once a volume is attached.
    pub overlay: Option<OverlayWindow>,

    pub config: ReviewConfig,

    /// Scatter view currently shown in the main panel.
    pub scatter_preset: ScatterPreset,

    pub colors: ClassColors,

    /// Carpet plot shown in the figure panel.
    pub carpet_index: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::new(ReviewConfig::default())
    }
}

impl ReviewState {
    pub fn new(config: ReviewConfig) -> Self {
        Self {
            controller: None,
            attachments: Attachments::default(),
            overlay: None,
            scatter_preset: config.scatter_preset,
            config,
            colors: ClassColors::default(),
            carpet_index: 0,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset, replacing everything from the last one.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let Dataset {
            catalog,
            attachments,
        } = dataset;
        match &mut self.controller {
            Some(ctl) => ctl.replace_catalog(catalog),
            None => self.controller = Some(SelectionController::new(catalog)),
        }
        self.attachments = attachments;
        self.overlay = None;
        self.carpet_index = 0;
        self.status_message = None;
    }

    /// Hand over the largest stat-map magnitude of a freshly loaded volume.
    /// Called by the external volume viewer once it has read the stat map;
    /// without it `overlay` stays `None` and only the slider value is kept.
    pub fn attach_volume(&mut self, max_abs: f64) {
        let mut window = OverlayWindow::new(max_abs);
        window.set_saturation(self.config.saturation);
        self.overlay = Some(window);
    }

    /// Slider value is kept in the config so a later volume starts from it.
    pub fn set_saturation(&mut self, fraction: f64) {
        self.config.saturation = clamp_saturation(fraction);
        if let Some(window) = &mut self.overlay {
            window.set_saturation(fraction);
        }
    }

    pub fn overlay_range(&self) -> Option<OverlayRange> {
        self.overlay.as_ref().map(OverlayWindow::range)
    }

    // -- selection --------------------------------------------------------

    pub fn select_ordinal(&mut self, ordinal: usize) {
        let result = match &mut self.controller {
            Some(ctl) => ctl.select_ordinal(ordinal),
            None => return,
        };
        self.report(result);
    }

    pub fn classify(&mut self, classification: Classification) {
        let result = match &mut self.controller {
            Some(ctl) => ctl.classify(classification),
            None => return,
        };
        self.report(result);
    }

    pub fn navigate(&mut self, direction: Direction) {
        if let Some(ctl) = &mut self.controller {
            ctl.navigate(direction);
        }
    }

    /// Drop every manual edit.
    pub fn reset(&mut self) {
        if let Some(ctl) = &mut self.controller {
            ctl.reset();
            self.status_message = Some("Classifications reset".into());
        }
    }

    // -- derived views -----------------------------------------------------

    /// Mixing-matrix series of the selection; `None` without a matrix.
    pub fn time_series(&self) -> Option<&[f64]> {
        let ctl = self.controller.as_ref()?;
        let matrix = self.attachments.mixing.as_ref()?;
        Some(view::time_series(matrix, ctl.state()))
    }

    pub fn spectrum(&self) -> Result<PowerSpectrum> {
        compute_power_spectrum(self.time_series(), self.config.sample_rate)
    }

    /// Stat-map frame for the external volume viewer.
    pub fn volume_frame(&self) -> Option<usize> {
        self.controller
            .as_ref()
            .and_then(|ctl| view::volume_frame(ctl.state()))
    }

    // -- export --------------------------------------------------------------

    /// Reconcile manual edits and write the artifacts into `dir`.
    pub fn export_to(&mut self, dir: &Path) -> anyhow::Result<ExportBundle> {
        let ctl = self
            .controller
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No dataset loaded"))?;
        let bundle = export(ctl.catalog_mut())?;
        write_bundle(dir, &bundle)?;
        self.status_message = Some(format!(
            "Saved to {} ({} accepted, {} rejected manually)",
            dir.display(),
            bundle.accepted.len(),
            bundle.rejected.len()
        ));
        Ok(bundle)
    }

    /// Window title: source directory if known, else the folder name.
    pub fn title(&self) -> String {
        match &self.attachments.source_label {
            Some(label) => format!("compview – {label}"),
            None if self.controller.is_some() => {
                format!("compview – {}", self.attachments.root.display())
            }
            None => "compview – ICA component review".to_string(),
        }
    }

    fn report(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::warn!("{e}");
                self.status_message = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::catalog;
    use crate::data::mixing::MixingMatrix;
    use crate::error::CoreError;

    fn loaded() -> ReviewState {
        let mut state = ReviewState::default();
        state.set_dataset(Dataset {
            catalog: catalog(&[
                ("ICA_00", 1.0, 1.0, 2.0, "accepted"),
                ("ICA_01", 1.0, 1.0, 1.0, "rejected"),
            ]),
            attachments: Attachments {
                mixing: Some(MixingMatrix::parse_tsv("ICA_00\tICA_01\n1\t5\n1\t5\n1\t5\n1\t5\n").unwrap()),
                ..Attachments::default()
            },
        });
        state
    }

    #[test]
    fn spectrum_needs_a_mixing_matrix() {
        let mut state = loaded();
        state.attachments.mixing = None;
        assert_eq!(state.spectrum(), Err(CoreError::EmptySeries));
    }

    #[test]
    fn spectrum_of_unselected_is_empty() {
        let state = loaded();
        assert!(state.spectrum().unwrap().is_empty());
    }

    #[test]
    fn spectrum_follows_navigation() {
        let mut state = loaded();
        state.navigate(Direction::Next);
        assert_eq!(state.volume_frame(), Some(0));
        let s = state.spectrum().unwrap();
        assert!((s.power[0] - 1.0).abs() < 1e-12);

        state.navigate(Direction::Next);
        assert_eq!(state.volume_frame(), Some(1));
        let s = state.spectrum().unwrap();
        assert!((s.power[0] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn classify_without_selection_sets_status() {
        let mut state = loaded();
        state.classify(Classification::Rejected);
        assert_eq!(state.status_message.as_deref(), Some("No component selected"));
    }

    #[test]
    fn overlay_window_tracks_slider() {
        let mut state = loaded();
        assert!(state.overlay_range().is_none());
        state.attach_volume(10.0);
        assert_eq!(state.overlay_range().unwrap().positive_max, 9.0);
        state.set_saturation(0.25);
        assert_eq!(state.overlay_range().unwrap().negative_min, -2.5);
        state.attach_volume(4.0);
        assert_eq!(state.overlay_range().unwrap().positive_max, 1.0);
    }

    #[test]
    fn export_writes_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded();
        state.select_ordinal(1);
        state.classify(Classification::Accepted);
        let bundle = state.export_to(dir.path()).unwrap();
        assert_eq!(bundle.accepted, vec![1]);
        assert!(state.status_message.unwrap().contains("1 accepted"));
    }

    #[test]
    fn reload_clears_selection_and_overlay() {
        let mut state = loaded();
        state.select_ordinal(0);
        state.attach_volume(3.0);
        state.set_dataset(Dataset {
            catalog: catalog(&[("X", 1.0, 1.0, 1.0, "ignored")]),
            attachments: Attachments::default(),
        });
        assert_eq!(state.volume_frame(), None);
        assert!(state.overlay.is_none());
        assert!(state.time_series().is_none());
    }
}
