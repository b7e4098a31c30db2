//! Overlay widgets drawn on top of the toolpath.

use crate::{data::LoadState, renderer::RenderError};
use egui::{Align2, Color32, Context, Id, RichText};
use toolpath::{GeometryMetadata, RevealParameters};

const SLIDER_STEP: f64 = 0.001;
const SLIDER_LENGTH: f32 = 320.0;
const EDGE_MARGIN: f32 = 12.0;

pub fn format_height_label(value: f64) -> String {
    format!("Z < {:.2}", value)
}

pub fn format_distance_label(value: f64) -> String {
    format!("T < {:.0}", value)
}

pub fn format_bound(axis: &str, min: f64, max: f64) -> String {
    format!("{:.2} < {} < {:.2}", min, axis, max)
}

/// Travel is measured in machine millimetres and shown in metres.
pub fn format_travel_m(travel_mm: f64) -> String {
    format!("{:.2} m", travel_mm / 1000.0)
}

/// Spinner while a request is pending, a generic error if it failed.
pub fn draw_load_state(ctx: &Context, state: &LoadState) {
    match state {
        LoadState::Loading { path, .. } => {
            egui::Area::new(Id::new("load_state"))
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add(egui::Spinner::new().size(32.0));
                        ui.label(format!("Loading {}", path));
                    });
                });
        }
        LoadState::Failed { path, message } => {
            egui::Area::new(Id::new("load_state"))
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new("Failed to load toolpath")
                                .color(Color32::LIGHT_RED)
                                .heading(),
                        );
                        ui.label(format!("{}: {}", path, message));
                    });
                });
        }
        LoadState::Idle | LoadState::Loaded(_) => {}
    }
}

pub fn draw_render_failure(ctx: &Context, err: &RenderError) {
    egui::Window::new("Renderer unavailable")
        .anchor(Align2::CENTER_TOP, [0.0, EDGE_MARGIN])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(RichText::new(err.to_string()).monospace().color(Color32::LIGHT_RED));
        });
}

/// Vertical Z and T sliders on the left edge. Returns `true` if either moved.
pub fn draw_reveal_sliders(
    ctx: &Context,
    reveal: &mut RevealParameters,
    meta: &GeometryMetadata,
) -> bool {
    let mut height = reveal.height_value(meta);
    let mut distance = reveal.distance_value(meta);

    let (height_changed, distance_changed) = egui::Area::new(Id::new("reveal_sliders"))
        .anchor(Align2::LEFT_CENTER, [EDGE_MARGIN, 0.0])
        .show(ctx, |ui| {
            ui.spacing_mut().slider_width = SLIDER_LENGTH;
            ui.horizontal(|ui| {
                let height = ui.add(
                    egui::Slider::new(&mut height, RevealParameters::height_range(meta))
                        .vertical()
                        .step_by(SLIDER_STEP)
                        .custom_formatter(|v, _| format_height_label(v)),
                );
                let distance = ui.add(
                    egui::Slider::new(&mut distance, RevealParameters::distance_range(meta))
                        .vertical()
                        .step_by(SLIDER_STEP)
                        .custom_formatter(|v, _| format_distance_label(v)),
                );
                (height.changed(), distance.changed())
            })
            .inner
        })
        .inner;

    if height_changed {
        reveal.set_height(height, meta);
    }
    if distance_changed {
        reveal.set_distance(distance, meta);
    }
    height_changed || distance_changed
}

/// Top-right buttons. Returns `true` when "Reset view" was clicked.
pub fn draw_toolbar(ctx: &Context, info_open: &mut bool) -> bool {
    egui::Area::new(Id::new("toolbar"))
        .anchor(Align2::RIGHT_TOP, [-EDGE_MARGIN, EDGE_MARGIN])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.toggle_value(info_open, "Job info");
                ui.button("Reset view").clicked()
            })
            .inner
        })
        .inner
}

pub fn draw_job_info(ctx: &Context, meta: &GeometryMetadata, open: &mut bool) {
    let bounds = &meta.bounds;
    egui::Window::new("Job info")
        .open(open)
        .anchor(Align2::RIGHT_BOTTOM, [-EDGE_MARGIN, -EDGE_MARGIN])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("job_info_grid")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Bounds (mm)");
                    ui.vertical(|ui| {
                        ui.label(format_bound("X", bounds.min.x, bounds.max.x));
                        ui.label(format_bound("Y", bounds.min.y, bounds.max.y));
                        ui.label(format_bound("Z", bounds.min.z, bounds.max.z));
                    });
                    ui.end_row();

                    ui.label("Travel");
                    ui.label(format_travel_m(meta.total_travel));
                    ui.end_row();

                    ui.label("Points");
                    ui.label(meta.len().to_string());
                    ui.end_row();
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_labels() {
        assert_eq!(format_height_label(12.3456), "Z < 12.35");
        assert_eq!(format_height_label(-0.002), "Z < -0.00");
        assert_eq!(format_distance_label(1234.6), "T < 1235");
    }

    #[test]
    fn bounds_use_two_decimals() {
        assert_eq!(format_bound("X", -1.0, 25.456), "-1.00 < X < 25.46");
    }

    #[test]
    fn travel_is_shown_in_metres() {
        assert_eq!(format_travel_m(12_345.0), "12.35 m");
        assert_eq!(format_travel_m(0.0), "0.00 m");
    }
}
