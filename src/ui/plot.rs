use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Color32, Pos2, RichText, Sense, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points};

use compview::analysis::spectrum::power_to_decibels;
use compview::data::model::{COL_CLASSIFICATION, Classification};
use compview::error::CoreError;
use compview::state::ReviewState;
use compview::view::{self, PieSlice, ScatterPreset};

/// Click radius, in points, for picking a scatter marker.
const PICK_RADIUS: f32 = 10.0;
/// Arc segments per full turn of the pie.
const PIE_SEGMENTS: usize = 180;

// ---------------------------------------------------------------------------
// Central panel layout
// ---------------------------------------------------------------------------

/// Render scatter, pie, time series, spectrum and figures.
pub fn central_views(ui: &mut Ui, state: &mut ReviewState) {
    if state.controller.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a results folder to review components  (File → Open folder…)");
        });
        return;
    }

    let row_height = (ui.available_height() / 3.0 - 30.0).max(120.0);

    ui.columns(2, |cols| {
        scatter_plot(&mut cols[0], state, row_height);
        variance_pie(&mut cols[1], state, row_height);
    });
    ui.separator();
    ui.columns(2, |cols| {
        time_series_plot(&mut cols[0], state, row_height);
        spectrum_plot(&mut cols[1], state, row_height);
    });
    ui.separator();
    ui.columns(2, |cols| {
        component_figure(&mut cols[0], state, row_height);
        carpet_figure(&mut cols[1], state, row_height);
    });
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

fn scatter_plot(ui: &mut Ui, state: &mut ReviewState, height: f32) {
    egui::ComboBox::from_id_salt("scatter_preset")
        .selected_text(state.scatter_preset.title())
        .show_ui(ui, |ui: &mut Ui| {
            for preset in ScatterPreset::ALL {
                ui.selectable_value(&mut state.scatter_preset, preset, preset.title());
            }
        });

    let Some(ctl) = &state.controller else {
        return;
    };
    let (x_axis, y_axis) = state.scatter_preset.axes();
    let points = view::scatter(ctl.catalog(), ctl.state(), x_axis, y_axis);
    let colors = &state.colors;

    let response = Plot::new(("scatter", state.scatter_preset.title()))
        .height(height)
        .legend(egui_plot::Legend::default())
        .x_axis_label(x_axis.label())
        .y_axis_label(y_axis.label())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for class in Classification::ALL {
                let series: PlotPoints = points
                    .iter()
                    .filter(|p| p.classification == class && !p.selected)
                    .map(|p| [p.x, p.y])
                    .collect();
                plot_ui.points(
                    Points::new(series)
                        .name(class.as_str())
                        .color(colors.color_for(class, false))
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(4.0),
                );
            }
            if let Some(p) = points.iter().find(|p| p.selected) {
                plot_ui.points(
                    Points::new(vec![[p.x, p.y]])
                        .name(&p.id)
                        .color(colors.color_for(p.classification, true))
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(7.0),
                );
            }

            // Nearest marker under the click, in screen space.
            if !plot_ui.response().clicked() {
                return None;
            }
            let pointer = plot_ui.response().interact_pointer_pos()?;
            points
                .iter()
                .map(|p| {
                    let screen = plot_ui.screen_from_plot(PlotPoint::new(p.x, p.y));
                    (p.ordinal, screen.distance(pointer))
                })
                .filter(|&(_, d)| d <= PICK_RADIUS)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(ordinal, _)| ordinal)
        });

    if let Some(ordinal) = response.inner {
        state.select_ordinal(ordinal);
    }
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

fn variance_pie(ui: &mut Ui, state: &mut ReviewState, height: f32) {
    let Some(ctl) = &state.controller else {
        return;
    };
    let slices = view::pie(ctl.catalog(), ctl.state());

    ui.label(RichText::new("Variance explained").strong());
    let side = ui.available_width().min(height);
    let (response, painter) = ui.allocate_painter(egui::vec2(side, side), Sense::click());
    let center = response.rect.center();
    let radius = side * 0.45;

    let mut start = 0.0_f32;
    for slice in &slices {
        let sweep = slice.fraction as f32 * TAU;
        let color = state.colors.color_for(slice.classification, slice.selected);
        painter.add(egui::Shape::mesh(slice_mesh(center, radius, start, sweep, color)));
        start += sweep;
    }
    painter.circle_stroke(center, radius, Stroke::new(1.0, ui.visuals().weak_text_color()));

    let hovered = response
        .hover_pos()
        .and_then(|pos| slice_at(&slices, center, radius, pos));
    if let Some(i) = hovered {
        let s = &slices[i];
        response.clone().on_hover_text_at_pointer(format!(
            "{}: {:.2}% ({})",
            s.id, s.value, s.classification
        ));
    }
    if response.clicked() {
        if let Some(i) = hovered {
            let ordinal = slices[i].ordinal;
            state.select_ordinal(ordinal);
        }
    }
}

/// Screen position at `angle` radians clockwise from twelve o'clock.
fn on_circle(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    let a = angle - FRAC_PI_2;
    Pos2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
}

fn slice_mesh(center: Pos2, radius: f32, start: f32, sweep: f32, color: Color32) -> egui::Mesh {
    let mut mesh = egui::Mesh::default();
    let steps = ((sweep / TAU * PIE_SEGMENTS as f32).ceil() as usize).max(1);
    mesh.colored_vertex(center, color);
    for k in 0..=steps {
        let angle = start + sweep * k as f32 / steps as f32;
        mesh.colored_vertex(on_circle(center, radius, angle), color);
    }
    for k in 1..=steps as u32 {
        mesh.add_triangle(0, k, k + 1);
    }
    mesh
}

/// Index of the slice under `pos`, if any.
fn slice_at(slices: &[PieSlice], center: Pos2, radius: f32, pos: Pos2) -> Option<usize> {
    let d = pos - center;
    if d.length() > radius {
        return None;
    }
    // Clockwise from twelve o'clock, in [0, 1).
    let turn = (d.x.atan2(-d.y) / TAU).rem_euclid(1.0) as f64;
    let mut acc = 0.0;
    slices.iter().position(|s| {
        acc += s.fraction;
        turn < acc
    })
}

// ---------------------------------------------------------------------------
// Time series + spectrum
// ---------------------------------------------------------------------------

fn time_series_plot(ui: &mut Ui, state: &ReviewState, height: f32) {
    ui.label(RichText::new("Time series").strong());
    let Some(series) = state.time_series() else {
        ui.label("No mixing matrix in folder.");
        return;
    };
    let color = selected_color(state);
    let points: PlotPoints = series
        .iter()
        .enumerate()
        .map(|(t, &v)| [t as f64, v])
        .collect();

    Plot::new("time_series")
        .height(height)
        .x_axis_label("Volume")
        .y_axis_label("Signal")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(color).width(1.5));
        });
}

fn spectrum_plot(ui: &mut Ui, state: &ReviewState, height: f32) {
    ui.label(RichText::new("Power spectrum").strong());
    let spectrum = match state.spectrum() {
        Ok(s) => s,
        Err(CoreError::EmptySeries) => {
            ui.label("No mixing matrix in folder.");
            return;
        }
        Err(e) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
            return;
        }
    };

    let skip = usize::from(!state.config.show_dc);
    let power: Vec<f64> = if state.config.decibels {
        power_to_decibels(&spectrum.power, None)
    } else {
        spectrum.power.clone()
    };
    let points: PlotPoints = spectrum
        .frequencies
        .iter()
        .zip(&power)
        .skip(skip)
        .map(|(&f, &p)| [f, p])
        .collect();

    let unit = if state.config.sample_rate == 1.0 {
        "Frequency (cycles / volume)"
    } else {
        "Frequency (Hz)"
    };
    Plot::new("spectrum")
        .height(height)
        .x_axis_label(unit)
        .y_axis_label(if state.config.decibels { "Power (dB)" } else { "Power" })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(selected_color(state)).width(1.5));
        });
}

fn selected_color(state: &ReviewState) -> Color32 {
    state
        .controller
        .as_ref()
        .and_then(|ctl| ctl.selected())
        .map(|c| state.colors.color_for(c.classification(), true))
        .unwrap_or(Color32::LIGHT_BLUE)
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

fn component_figure(ui: &mut Ui, state: &ReviewState, height: f32) {
    ui.label(RichText::new("Component figure").strong());
    let figure = state
        .controller
        .as_ref()
        .and_then(|ctl| ctl.selected_id())
        .and_then(|id| state.attachments.figure_for(id));
    match figure {
        Some(fig) => {
            ui.add(
                egui::Image::from_bytes(format!("bytes://{}", fig.name), fig.bytes.clone())
                    .max_height(height)
                    .shrink_to_fit(),
            );
        }
        None => {
            ui.label("No figure for this component.");
        }
    }
}

fn carpet_figure(ui: &mut Ui, state: &mut ReviewState, height: f32) {
    ui.label(RichText::new("Carpet plots").strong());
    let carpets = &state.attachments.carpets;
    if carpets.is_empty() {
        ui.label("No carpet plots in folder.");
        return;
    }
    let index = state.carpet_index.min(carpets.len() - 1);
    let mut chosen = index;
    egui::ComboBox::from_id_salt("carpet")
        .selected_text(&carpets[index].name)
        .show_ui(ui, |ui: &mut Ui| {
            for (i, fig) in carpets.iter().enumerate() {
                ui.selectable_value(&mut chosen, i, &fig.name);
            }
        });
    let fig = &carpets[chosen];
    ui.add(
        egui::Image::from_bytes(format!("bytes://{}", fig.name), fig.bytes.clone())
            .max_height(height)
            .shrink_to_fit(),
    );
    state.carpet_index = chosen;
}

// ---------------------------------------------------------------------------
// Metrics table (bottom panel)
// ---------------------------------------------------------------------------

/// Render the component table; clicking a row selects it.
pub fn metrics_table(ui: &mut Ui, state: &mut ReviewState) {
    let Some(ctl) = &state.controller else {
        ui.label("No dataset loaded.");
        return;
    };
    let table = view::table(ctl.catalog(), ctl.state());
    let selected = ctl.state().selected();
    let class_col = table.columns.iter().position(|c| c == COL_CLASSIFICATION);

    // Scroll only when the selection changed, so the user can scroll freely.
    let memory_id = ui.id().with("table_last_selected");
    let last: Option<usize> = ui.data(|d| d.get_temp(memory_id)).flatten();

    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .sense(Sense::click())
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(60.0), table.columns.len())
        .min_scrolled_height(0.0);
    if selected != last {
        if let Some(row) = selected {
            builder = builder.scroll_to_row(row, Some(egui::Align::Center));
        }
    }

    let mut clicked = None;
    builder
        .header(20.0, |mut header| {
            for label in &table.labels {
                header.col(|ui| {
                    ui.strong(label);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, table.rows.len(), |mut row| {
                let r = &table.rows[row.index()];
                row.set_selected(r.selected);
                for (c, cell) in r.cells.iter().enumerate() {
                    row.col(|ui| {
                        if Some(c) == class_col {
                            let color = state.colors.color_for(r.classification, false);
                            ui.label(RichText::new(cell).color(color));
                        } else {
                            ui.label(cell);
                        }
                    });
                }
                if row.response().clicked() {
                    clicked = Some(r.ordinal);
                }
            });
        });

    ui.data_mut(|d| d.insert_temp(memory_id, selected));
    if let Some(ordinal) = clicked {
        state.select_ordinal(ordinal);
    }
}
