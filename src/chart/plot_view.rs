//! Interactive chart views
//!
//! Axis-based charts go through egui_plot; matrix-like charts (heatmaps,
//! clustergram, Venn, scatter matrix) paint the same scene used for export.

use std::f32::consts::FRAC_PI_2;

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, Vec2};
use egui_plot::{
    AxisHints, Bar, BarChart as PlotBars, BoxElem, BoxPlot, BoxSpread, HPlacement, Legend, Plot,
    PlotPoints, Points,
};

use super::scene::{self, Anchor, Prim};
use super::{format_tick, BarChart, BoxChart, Chart, Histogram, Rgb, ScatterChart};

pub fn color(c: Rgb) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

/// Draw `chart` at up to `size` (width, height) points
pub fn show_chart(ui: &mut Ui, id: &str, chart: &Chart, size: [f32; 2]) {
    let width = ui.available_width().min(size[0]).max(200.0);
    let height = size[1];
    match chart {
        Chart::Bar(c) => show_bar(ui, id, c, width, height),
        Chart::Histogram(c) => show_histogram(ui, id, c, width, height),
        Chart::Box(c) => show_box(ui, id, c, width, height),
        Chart::Scatter(c) => show_scatter(ui, id, c, width, height),
        _ => paint_scene(ui, &scene::layout(chart, width, height)),
    }
}

fn category_formatter(names: Vec<String>) -> impl Fn(egui_plot::GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        names.get(i as usize).cloned().unwrap_or_default()
    }
}

fn show_bar(ui: &mut Ui, id: &str, c: &BarChart, width: f32, height: f32) {
    ui.label(egui::RichText::new(&c.title).strong());
    let max1 = c.axis_max(false).max(1.0);
    let max2 = c.axis_max(true).max(1.0);
    // secondary series are drawn in primary units and relabeled on the right axis
    let ratio = max2 / max1;
    let n_series = c.series.len().max(1) as f64;
    let bar_w = 0.8 / n_series;

    let mut axes = vec![AxisHints::new_y().label(c.y_label.clone())];
    if c.has_secondary() {
        axes.push(
            AxisHints::new_y()
                .label(c.y2_label.clone().unwrap_or_default())
                .placement(HPlacement::Right)
                .formatter(move |mark, _range| format_tick(mark.value * ratio)),
        );
    }

    Plot::new(id)
        .width(width)
        .height(height)
        .x_axis_label(c.x_label.clone())
        .x_axis_formatter(category_formatter(c.categories.clone()))
        .custom_y_axes(axes)
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for (s, series) in c.series.iter().enumerate() {
                let scale = if series.secondary { 1.0 / ratio } else { 1.0 };
                let offset = (s as f64 - (n_series - 1.0) / 2.0) * bar_w;
                let bars: Vec<Bar> = series
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, v)| {
                        Bar::new(i as f64 + offset, v * scale)
                            .width(bar_w * 0.95)
                            .name(format!("{}: {}", c.categories.get(i).map_or("", |n| n), format_tick(*v)))
                    })
                    .collect();
                plot_ui.bar_chart(PlotBars::new(bars).name(&series.name).color(color(series.color)));
            }
        });
}

fn show_histogram(ui: &mut Ui, id: &str, c: &Histogram, width: f32, height: f32) {
    ui.label(egui::RichText::new(&c.title).strong());
    let bars: Vec<Bar> = c
        .bins
        .iter()
        .map(|b| {
            Bar::new((b.lo + b.hi) / 2.0, b.count as f64)
                .width((b.hi - b.lo) * 0.95)
                .name(format!("{} to {}", format_tick(b.lo), format_tick(b.hi)))
        })
        .collect();
    Plot::new(id)
        .width(width)
        .height(height)
        .x_axis_label(c.x_label.clone())
        .y_axis_label(c.y_label.clone())
        .include_y(0.0)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(PlotBars::new(bars).color(color(c.color)));
        });
}

fn show_box(ui: &mut Ui, id: &str, c: &BoxChart, width: f32, height: f32) {
    ui.label(egui::RichText::new(&c.title).strong());
    let names: Vec<String> = c.boxes.iter().map(|b| b.name.clone()).collect();
    let elems: Vec<BoxElem> = c
        .boxes
        .iter()
        .enumerate()
        .map(|(i, b)| {
            BoxElem::new(
                i as f64,
                BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
            )
            .name(&b.name)
            .box_width(0.6)
        })
        .collect();
    let outliers: Vec<[f64; 2]> = c
        .boxes
        .iter()
        .enumerate()
        .flat_map(|(i, b)| b.outliers.iter().map(move |o| [i as f64, *o]))
        .collect();
    Plot::new(id)
        .width(width)
        .height(height)
        .y_axis_label(c.y_label.clone())
        .x_axis_formatter(category_formatter(names))
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(elems).color(color(c.color)));
            if !outliers.is_empty() {
                plot_ui.points(
                    Points::new(PlotPoints::from(outliers))
                        .color(color(c.color))
                        .radius(1.5),
                );
            }
        });
}

fn show_scatter(ui: &mut Ui, id: &str, c: &ScatterChart, width: f32, height: f32) {
    ui.label(egui::RichText::new(&c.title).strong());
    Plot::new(id)
        .width(width)
        .height(height)
        .x_axis_label(c.x_label.clone())
        .y_axis_label(c.y_label.clone())
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for g in &c.groups {
                plot_ui.points(
                    Points::new(PlotPoints::from(g.points.clone()))
                        .name(&g.name)
                        .color(color(g.color))
                        .radius(5.0),
                );
            }
        });
}

/// Paint a laid-out scene with the egui painter
pub fn paint_scene(ui: &mut Ui, scene: &scene::Scene) {
    let (response, painter) = ui.allocate_painter(Vec2::new(scene.width, scene.height), Sense::hover());
    let origin = response.rect.min;
    let at = |p: [f32; 2]| Pos2::new(origin.x + p[0], origin.y + p[1]);

    for prim in &scene.prims {
        match prim {
            Prim::Line {
                from,
                to,
                color: c,
                width,
            } => {
                painter.line_segment([at(*from), at(*to)], Stroke::new(*width, color(*c)));
            }
            Prim::Rect {
                min,
                max,
                fill,
                stroke,
            } => {
                let rect = Rect::from_two_pos(at(*min), at(*max));
                if let Some(fill) = fill {
                    painter.rect_filled(rect, 0.0, color(*fill));
                }
                if let Some(stroke) = stroke {
                    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, color(*stroke)), StrokeKind::Inside);
                }
            }
            Prim::Circle {
                center,
                radius,
                fill,
                alpha,
            } => {
                let a = (alpha.clamp(0.0, 1.0) * 255.0) as u8;
                painter.circle_filled(
                    at(*center),
                    *radius,
                    Color32::from_rgba_unmultiplied(fill[0], fill[1], fill[2], a),
                );
            }
            Prim::Text {
                pos,
                text,
                size,
                color: c,
                anchor,
                rotated,
            } => {
                let font = FontId::proportional(*size);
                if *rotated {
                    let galley = painter.layout_no_wrap(text.clone(), font, color(*c));
                    let (w, h) = (galley.size().x, galley.size().y);
                    let p = at(*pos);
                    let start = Pos2::new(p.x - h / 2.0, p.y + w / 2.0);
                    painter.add(egui::epaint::TextShape::new(start, galley, color(*c)).with_angle(-FRAC_PI_2));
                } else {
                    let align = match anchor {
                        Anchor::Start => Align2::LEFT_TOP,
                        Anchor::Middle => Align2::CENTER_TOP,
                        Anchor::End => Align2::RIGHT_TOP,
                    };
                    painter.text(at(*pos), align, text, font, color(*c));
                }
            }
        }
    }
}
