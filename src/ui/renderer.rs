use egui::{Align2, FontId, Painter, Pos2, Rect, Stroke, StrokeKind};

use crate::coords::CoordinateSystem;
use crate::grid::{GridLineKind, GridSnap};
use crate::model::note::{MidiKey, Note, Tick};
use crate::model::store::NoteStore;
use crate::ui::theme::Theme;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn note_name(key: MidiKey) -> String {
    let name = NOTE_NAMES[(key.rem_euclid(12)) as usize];
    let octave = key / 12 - 2;
    format!("{}{}", name, octave)
}

/// Draw the piano roll in its four z-ordered layers: background (keys,
/// zebra rows, selection spotlight), notes, grid and ruler, playhead.
/// Painter call order supplies the layering.
pub fn render(
    painter: &Painter,
    canvas: Rect,
    coords: &CoordinateSystem,
    notes: &NoteStore,
    grid: &GridSnap,
    theme: &Theme,
    playhead: Option<Tick>,
) {
    background_layer(painter, canvas, coords, notes, theme);
    notes_layer(painter, canvas, coords, notes, theme);
    grid_ruler_layer(painter, canvas, coords, grid, theme);
    playhead_layer(painter, canvas, coords, theme, playhead);
}

fn key_row_screen_y(coords: &CoordinateSystem, canvas: Rect, key: MidiKey) -> (f32, f32) {
    let world_y = coords.key_to_world_y(key);
    let (_, sy1) = coords.world_to_screen(0.0, world_y);
    let (_, sy2) = coords.world_to_screen(0.0, world_y + coords.key_height());
    (canvas.min.y + sy1 as f32, canvas.min.y + sy2 as f32)
}

fn background_layer(
    painter: &Painter,
    canvas: Rect,
    coords: &CoordinateSystem,
    notes: &NoteStore,
    theme: &Theme,
) {
    painter.rect_filled(canvas, 0.0, theme.background_color);

    let keys_left = canvas.min.x;
    let keys_right = canvas.min.x + coords.piano_key_width() as f32;
    let grid_left = keys_right;
    let grid_right = canvas.min.x + (coords.piano_key_width() + coords.viewport().width) as f32;

    let (min_key, max_key) = coords.visible_key_range();
    let row_light = scale_gray(theme.background_color, 1.15);
    let row_dark = scale_gray(theme.background_color, 0.95);

    for key in min_key..=max_key {
        let is_black = matches!(key.rem_euclid(12), 1 | 3 | 6 | 8 | 10);
        let (mut y1, mut y2) = key_row_screen_y(coords, canvas, key);
        if y2 < canvas.min.y || y1 > canvas.max.y {
            continue;
        }
        y1 = y1.max(canvas.min.y);
        y2 = y2.min(canvas.max.y);

        // Key strip on the left.
        painter.rect_filled(
            Rect::from_min_max(Pos2::new(keys_left, y1), Pos2::new(keys_right, y2)),
            0.0,
            if is_black {
                theme.black_key_color
            } else {
                theme.white_key_color
            },
        );

        // Zebra rows across the grid.
        painter.rect_filled(
            Rect::from_min_max(Pos2::new(grid_left, y1), Pos2::new(grid_right, y2)),
            0.0,
            if is_black { row_dark } else { row_light },
        );
    }

    // Spotlight band behind the selection's world-X span.
    let mut span: Option<(f64, f64)> = None;
    for note in notes.notes().iter().filter(|n| n.selected) {
        let x1 = coords.tick_to_world(note.tick);
        let x2 = coords.tick_to_world(note.end_tick());
        span = Some(match span {
            None => (x1, x2),
            Some((lo, hi)) => (lo.min(x1), hi.max(x2)),
        });
    }
    if let Some((lo, hi)) = span {
        if hi > lo {
            let (sx1, _) = coords.world_to_screen(lo, 0.0);
            let (sx2, _) = coords.world_to_screen(hi, 0.0);
            let x1 = (canvas.min.x + sx1 as f32).max(grid_left);
            let x2 = (canvas.min.x + sx2 as f32).min(grid_right);
            if x2 > x1 {
                painter.rect_filled(
                    Rect::from_min_max(Pos2::new(x1, canvas.min.y), Pos2::new(x2, canvas.max.y)),
                    0.0,
                    theme.spotlight_fill_color,
                );
                let edge = Stroke::new(1.0, theme.spotlight_edge_color);
                painter.line_segment(
                    [Pos2::new(x1, canvas.min.y), Pos2::new(x1, canvas.max.y)],
                    edge,
                );
                painter.line_segment(
                    [Pos2::new(x2, canvas.min.y), Pos2::new(x2, canvas.max.y)],
                    edge,
                );
            }
        }
    }
}

fn notes_layer(
    painter: &Painter,
    canvas: Rect,
    coords: &CoordinateSystem,
    notes: &NoteStore,
    theme: &Theme,
) {
    let left_limit = canvas.min.x + coords.piano_key_width() as f32;
    let right_limit = canvas.min.x + (coords.piano_key_width() + coords.viewport().width) as f32;

    let note_rect = |note: &Note| -> Option<Rect> {
        let (sx1, sy1) = coords.world_to_screen(
            coords.tick_to_world(note.tick),
            coords.key_to_world_y(note.key),
        );
        let (sx2, sy2) = coords.world_to_screen(
            coords.tick_to_world(note.end_tick()),
            coords.key_to_world_y(note.key) + coords.key_height(),
        );
        let x1 = (canvas.min.x + sx1 as f32).max(left_limit);
        let x2 = (canvas.min.x + sx2 as f32).min(right_limit);
        if x2 <= x1 {
            return None;
        }
        Some(Rect::from_min_max(
            Pos2::new(x1, canvas.min.y + sy1 as f32),
            Pos2::new(x2, canvas.min.y + sy2 as f32),
        ))
    };

    let draw_note = |note: &Note| {
        let Some(rect) = note_rect(note) else {
            return;
        };
        let (fill, border) = if note.selected {
            (theme.selected_note_fill_color, theme.selected_note_border_color)
        } else {
            (theme.note_fill_color, theme.note_border_color)
        };

        if !note.selected {
            painter.rect_filled(
                rect.translate(egui::vec2(1.0, 1.0)),
                theme.note_corner_radius,
                theme.note_shadow_color,
            );
        }

        painter.rect_filled(rect, theme.note_corner_radius, fill);
        painter.rect_stroke(
            rect,
            theme.note_corner_radius,
            Stroke::new(theme.note_border_thickness, border),
            StrokeKind::Inside,
        );

        if note.selected {
            painter.rect_stroke(
                rect.shrink(2.0),
                theme.note_corner_radius,
                Stroke::new(1.0, theme.selected_note_inner_border_color),
                StrokeKind::Inside,
            );
        }
    };

    // Unselected first so selected notes and their borders sit on top.
    for note in notes.notes().iter().filter(|n| !n.selected) {
        draw_note(note);
    }
    for note in notes.notes().iter().filter(|n| n.selected) {
        draw_note(note);
    }

    // In-note pitch labels once rows are tall and notes wide enough.
    if coords.key_height() >= 16.0 {
        for note in notes.notes() {
            let Some(rect) = note_rect(note) else {
                continue;
            };
            if rect.width() < 30.0 {
                continue;
            }
            painter.text(
                Pos2::new(rect.min.x + 4.0, rect.center().y),
                Align2::LEFT_CENTER,
                note_name(note.key),
                FontId::default(),
                theme.note_label_text_color,
            );
        }
    }
}

fn grid_ruler_layer(
    painter: &Painter,
    canvas: Rect,
    coords: &CoordinateSystem,
    grid: &GridSnap,
    theme: &Theme,
) {
    let (start_tick, end_tick) = coords.visible_tick_range();
    let ppb = coords.pixels_per_beat();

    // Vertical grid lines.
    for line in grid.grid_lines(start_tick, end_tick, ppb) {
        let (sx, _) = coords.world_to_screen(coords.tick_to_world(line.tick), 0.0);
        let x = canvas.min.x + sx as f32;
        let (color, thickness) = match line.kind {
            GridLineKind::Measure => (theme.bar_line_color, theme.bar_line_thickness),
            GridLineKind::Beat => (theme.beat_line_color, theme.beat_line_thickness),
            GridLineKind::Subdivision => (
                theme.subdivision_line_color,
                theme.grid_line_thickness * 0.8,
            ),
        };
        painter.line_segment(
            [Pos2::new(x, canvas.min.y), Pos2::new(x, canvas.max.y)],
            Stroke::new(thickness, color),
        );
    }

    // Horizontal key separators across the grid area.
    let left = canvas.min.x + coords.piano_key_width() as f32;
    let right = canvas.min.x + (coords.piano_key_width() + coords.viewport().width) as f32;
    let (min_key, max_key) = coords.visible_key_range();
    for key in min_key..=max_key {
        let (y, _) = key_row_screen_y(coords, canvas, key);
        painter.line_segment(
            [Pos2::new(left, y), Pos2::new(right, y)],
            Stroke::new(theme.grid_line_thickness, theme.grid_line_color),
        );
    }

    // Ruler band with labels.
    let ruler_height = 24.0;
    painter.rect_filled(
        Rect::from_min_max(
            Pos2::new(left, canvas.min.y),
            Pos2::new(right, canvas.min.y + ruler_height),
        ),
        0.0,
        theme.ruler_background_color,
    );
    for label in grid.ruler_labels(start_tick, end_tick, ppb) {
        let (sx, _) = coords.world_to_screen(coords.tick_to_world(label.tick), 0.0);
        painter.text(
            Pos2::new(canvas.min.x + sx as f32 + 2.0, canvas.min.y + 4.0),
            Align2::LEFT_TOP,
            label.text,
            FontId::default(),
            theme.ruler_text_color,
        );
    }
}

fn playhead_layer(
    painter: &Painter,
    canvas: Rect,
    coords: &CoordinateSystem,
    theme: &Theme,
    playhead: Option<Tick>,
) {
    let Some(tick) = playhead else {
        return;
    };
    let (sx, _) = coords.world_to_screen(coords.tick_to_world(tick), 0.0);
    let x = canvas.min.x + sx as f32;

    painter.line_segment(
        [Pos2::new(x, canvas.min.y), Pos2::new(x, canvas.max.y)],
        Stroke::new(2.0, theme.playhead_color),
    );

    // Triangle handle at the top.
    let half = 5.0;
    painter.add(egui::Shape::convex_polygon(
        vec![
            Pos2::new(x, canvas.min.y),
            Pos2::new(x - half, canvas.min.y - half),
            Pos2::new(x + half, canvas.min.y - half),
        ],
        theme.playhead_color,
        Stroke::NONE,
    ));
}

fn scale_gray(color: egui::Color32, factor: f32) -> egui::Color32 {
    let c = |v: u8| ((f32::from(v) * factor).clamp(0.0, 255.0)) as u8;
    egui::Color32::from_rgb(c(color.r()), c(color.g()), c(color.b()))
}
