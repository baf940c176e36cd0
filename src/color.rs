use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Classification;

/// Lightness factor applied to a base colour to mark the selected component.
const HIGHLIGHT_LIGHTNESS: f32 = 0.7;

// ---------------------------------------------------------------------------
// Colour helpers
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Darker variant of `base` with the same hue and saturation.
pub fn highlight_of(base: Color32) -> Color32 {
    let rgb: Srgb = Srgb::new(base.r(), base.g(), base.b()).into_format();
    let hsl: Hsl = rgb.into_color();
    let darker = Hsl::new(hsl.hue, hsl.saturation, hsl.lightness * HIGHLIGHT_LIGHTNESS);
    to_color32(darker.into_color())
}

// ---------------------------------------------------------------------------
// Classification colours
// ---------------------------------------------------------------------------

/// Base and highlight colour per classification, shared by every view.
#[derive(Debug, Clone)]
pub struct ClassColors {
    mapping: BTreeMap<Classification, (Color32, Color32)>,
}

impl Default for ClassColors {
    fn default() -> Self {
        let base = [
            (Classification::Accepted, Color32::from_rgb(0xA8, 0xE3, 0xA5)),
            (Classification::Rejected, Color32::from_rgb(0xE9, 0x94, 0x97)),
            (Classification::Ignored, Color32::from_rgb(0xB5, 0xDE, 0xFF)),
        ];
        let mapping = base
            .into_iter()
            .map(|(class, c)| (class, (c, highlight_of(c))))
            .collect();
        ClassColors { mapping }
    }
}

impl ClassColors {
    /// Colour of a component, highlighted when it is the selected one.
    pub fn color_for(&self, classification: Classification, selected: bool) -> Color32 {
        let (base, highlight) = self.mapping[&classification];
        if selected { highlight } else { base }
    }

    /// Legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(class, (base, _))| (class.to_string(), *base))
            .collect()
    }
}
