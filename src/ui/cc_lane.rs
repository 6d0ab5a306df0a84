use egui::{Painter, Pos2, Rect, Stroke, StrokeKind};

use crate::coords::CoordinateSystem;
use crate::model::cc::ControlLane;
use crate::ui::theme::Theme;

/// Resolve the lane band height against the canvas: a configured height of
/// zero or one dominating the canvas falls back to a quarter of it.
pub fn resolve_lane_height(configured: f32, total_height: f32) -> f32 {
    if configured <= 0.0 || configured > total_height * 0.8 {
        total_height * 0.25
    } else {
        configured
    }
}

fn value_to_y(value: i32, lane_top: f32, lane_bottom: f32) -> f32 {
    let t = 1.0 - (value.clamp(0, 127) as f32) / 127.0;
    lane_top + t * (lane_bottom - lane_top)
}

/// Draw the active CC lane band at the bottom of the canvas: background,
/// connecting curve, then the points.
pub fn render_cc_lane(
    painter: &Painter,
    canvas: Rect,
    coords: &CoordinateSystem,
    lane: &ControlLane,
    lane_height: f32,
    theme: &Theme,
) {
    let lane_height = resolve_lane_height(lane_height, canvas.height());
    let lane_bottom = canvas.max.y;
    let lane_top = lane_bottom - lane_height;

    let left = canvas.min.x + coords.piano_key_width() as f32;
    let right = canvas.max.x;

    let band = Rect::from_min_max(Pos2::new(left, lane_top), Pos2::new(right, lane_bottom));
    painter.rect_filled(band, 0.0, theme.cc_lane_background_color);
    painter.rect_stroke(
        band,
        0.0,
        Stroke::new(1.0, theme.cc_lane_border_color),
        StrokeKind::Inside,
    );

    let point_pos = |tick, value| {
        let (sx, _) = coords.world_to_screen(coords.tick_to_world(tick), 0.0);
        Pos2::new(
            canvas.min.x + sx as f32,
            value_to_y(value, lane_top, lane_bottom),
        )
    };

    let points = lane.points();
    for pair in points.windows(2) {
        painter.line_segment(
            [
                point_pos(pair[0].tick, pair[0].value),
                point_pos(pair[1].tick, pair[1].value),
            ],
            Stroke::new(2.0, theme.cc_curve_color),
        );
    }

    for p in points {
        painter.circle_filled(point_pos(p.tick, p.value), 4.0, theme.cc_point_color);
    }
}
