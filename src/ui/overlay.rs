use egui::{Painter, Pos2, Rect, Stroke, StrokeKind};

use crate::coords::CoordinateSystem;
use crate::input::pointer::{HoverEdge, PointerController};
use crate::model::store::NoteStore;
use crate::ui::theme::Theme;

/// The single overlay pass: selection rectangle, hovered-edge highlight,
/// then drag/duplicate ghosts, in that order.
pub fn render_overlay(
    painter: &Painter,
    canvas: Rect,
    notes: &NoteStore,
    pointer: &PointerController,
    coords: &CoordinateSystem,
    theme: &Theme,
) {
    selection_rectangle(painter, canvas, pointer, coords, theme);
    hover_highlight(painter, canvas, notes, pointer, coords, theme);
    drag_ghosts(painter, canvas, notes, pointer, coords, theme);
}

fn selection_rectangle(
    painter: &Painter,
    canvas: Rect,
    pointer: &PointerController,
    coords: &CoordinateSystem,
    theme: &Theme,
) {
    let Some((wx1, wy1, wx2, wy2)) = pointer.selection_rectangle_world() else {
        return;
    };

    let (sx1, sy1) = coords.world_to_screen(wx1, wy1);
    let (sx2, sy2) = coords.world_to_screen(wx2, wy2);

    // Clip to the grid area; world Y already accounts for scroll.
    let grid_left = coords.piano_key_width();
    let grid_right = grid_left + coords.viewport().width;
    let grid_bottom = coords.viewport().height;

    let x1 = sx1.max(grid_left);
    let x2 = sx2.min(grid_right);
    let y1 = sy1.max(0.0);
    let y2 = sy2.min(grid_bottom);
    if x2 <= x1 || y2 <= y1 {
        return;
    }

    let rect = Rect::from_min_max(
        Pos2::new(canvas.min.x + x1 as f32, canvas.min.y + y1 as f32),
        Pos2::new(canvas.min.x + x2 as f32, canvas.min.y + y2 as f32),
    );
    painter.rect_filled(rect, 0.0, theme.selection_rect_fill_color);
    painter.rect_stroke(
        rect,
        0.0,
        Stroke::new(1.0, theme.selection_rect_border_color),
        StrokeKind::Inside,
    );
}

fn hover_highlight(
    painter: &Painter,
    canvas: Rect,
    notes: &NoteStore,
    pointer: &PointerController,
    coords: &CoordinateSystem,
    theme: &Theme,
) {
    let Some((wx1, wy1, wx2, wy2, edge)) = pointer.hovered_note_world(notes, coords) else {
        return;
    };

    let (sx1, sy1) = coords.world_to_screen(wx1, wy1);
    let (sx2, sy2) = coords.world_to_screen(wx2, wy2);
    if sx2 <= sx1 || sy2 <= sy1 {
        return;
    }

    let edge_thickness = 8.0;
    let (ex1, ex2) = match edge {
        HoverEdge::Left => (sx1, (sx1 + edge_thickness).min(sx2)),
        HoverEdge::Right => ((sx2 - edge_thickness).max(sx1), sx2),
        HoverEdge::Body => (sx1, sx2),
    };

    let base = theme.selected_note_border_color;
    let color = egui::Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), 178);
    painter.rect_filled(
        Rect::from_min_max(
            Pos2::new(canvas.min.x + ex1 as f32, canvas.min.y + sy1 as f32),
            Pos2::new(canvas.min.x + ex2 as f32, canvas.min.y + sy2 as f32),
        ),
        0.0,
        color,
    );
}

fn drag_ghosts(
    painter: &Painter,
    canvas: Rect,
    notes: &NoteStore,
    pointer: &PointerController,
    coords: &CoordinateSystem,
    theme: &Theme,
) {
    if !pointer.is_dragging_note() && !pointer.is_resizing_note() {
        return;
    }
    let color = if pointer.is_duplicating() {
        theme.drag_preview_duplicate_color
    } else {
        theme.drag_preview_move_color
    };

    for note in notes.notes().iter().filter(|n| n.selected) {
        let (sx1, sy1) = coords.world_to_screen(
            coords.tick_to_world(note.tick),
            coords.key_to_world_y(note.key),
        );
        let (sx2, sy2) = coords.world_to_screen(
            coords.tick_to_world(note.end_tick()),
            coords.key_to_world_y(note.key) + coords.key_height(),
        );
        if sx2 <= sx1 || sy2 <= sy1 {
            continue;
        }
        painter.rect_filled(
            Rect::from_min_max(
                Pos2::new(canvas.min.x + sx1 as f32, canvas.min.y + sy1 as f32),
                Pos2::new(canvas.min.x + sx2 as f32, canvas.min.y + sy2 as f32),
            ),
            0.0,
            color,
        );
    }
}
