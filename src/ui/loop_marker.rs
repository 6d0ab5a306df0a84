use crate::coords::CoordinateSystem;
use crate::model::note::Tick;
use crate::ui::drag_rect::{DragRect, DragState, RectBounds, RectSpace};
use crate::ui::theme::Theme;

/// Mixed coordinate space for the loop region: X is world (scrolls and zooms
/// with the grid), Y is widget-local pixels (the ruler band does not scroll).
struct LoopSpace<'a> {
    coords: &'a CoordinateSystem,
}

impl RectSpace for LoopSpace<'_> {
    fn screen_to_world(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let world_x = x - self.coords.piano_key_width() + self.coords.viewport().x;
        Some((world_x, y))
    }

    fn world_to_screen(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let screen_x = x - self.coords.viewport().x + self.coords.piano_key_width();
        Some((screen_x, y))
    }
}

/// Bitwig-style loop region living in a fixed band of the ruler. The tick
/// range is authoritative; rectangle bounds are resynced from it before
/// interactions and snapped back to quarter beats on release.
#[derive(Debug)]
pub struct LoopMarker {
    rect: DragRect,
    start_tick: Tick,
    end_tick: Tick,

    pub enabled: bool,
    pub visible: bool,

    top_padding: f32,
    ruler_height: f32,
}

impl LoopMarker {
    pub fn new(start_tick: Tick, end_tick: Tick) -> Self {
        let mut rect = DragRect::new();
        rect.edge_threshold = 20.0;
        rect.show_drag_preview = true;
        Self {
            rect,
            start_tick,
            end_tick: end_tick.max(start_tick),
            enabled: false,
            visible: false,
            top_padding: 0.0,
            ruler_height: 24.0,
        }
    }

    pub fn set_layout(&mut self, top_padding: f32, ruler_height: f32) {
        self.top_padding = top_padding;
        self.ruler_height = ruler_height;
    }

    pub fn set_tick_range(&mut self, start: Tick, end: Tick) {
        self.start_tick = start;
        self.end_tick = end.max(start);
    }

    pub fn tick_range(&self) -> (Tick, Tick) {
        (self.start_tick, self.end_tick)
    }

    pub fn state(&self) -> DragState {
        self.rect.state
    }

    pub fn is_active(&self) -> bool {
        self.rect.state.is_active()
    }

    pub fn reset_hover(&mut self) {
        if self.rect.state.is_hovering() {
            self.rect.state = DragState::Idle;
        }
    }

    /// Snap step: a quarter beat in world pixels, which is also the minimum
    /// region width.
    fn update_snap(&mut self, coords: &CoordinateSystem) {
        let quarter_beat = Tick::from(coords.ticks_per_beat()) / 4;
        let snap_world = coords.tick_to_world(quarter_beat).abs().max(1.0);
        self.rect.snap_enabled = true;
        self.rect.snap_size = snap_world;
        self.rect.min_width = snap_world;
    }

    /// Resync rectangle bounds from the tick range and current view. The
    /// vertical band sits at 40-65% of the ruler height.
    pub fn update_bounds_from_ticks(&mut self, coords: &CoordinateSystem) {
        self.update_snap(coords);
        let top = f64::from(self.top_padding) + f64::from(self.ruler_height) * 0.40;
        let bottom = f64::from(self.top_padding) + f64::from(self.ruler_height) * 0.65;
        self.rect.bounds = RectBounds::new(
            coords.tick_to_world(self.start_tick),
            coords.tick_to_world(self.end_tick),
            top,
            bottom,
        );
    }

    /// Resync ticks from the rectangle, rounding to quarter beats and
    /// keeping at least one quarter beat of width.
    pub fn update_ticks_from_bounds(&mut self, coords: &CoordinateSystem) {
        let raw_start = coords.world_to_tick(self.rect.bounds.left);
        let raw_end = coords.world_to_tick(self.rect.bounds.right);

        let quarter = Tick::from(coords.ticks_per_beat()) / 4;
        if quarter <= 0 {
            self.start_tick = raw_start;
            self.end_tick = raw_end.max(raw_start);
            return;
        }

        let round = |v: Tick| (v as f64 / quarter as f64).round() as Tick * quarter;
        self.start_tick = round(raw_start);
        self.end_tick = round(raw_end);
        if self.end_tick <= self.start_tick {
            self.end_tick = self.start_tick + quarter;
        }
    }

    // Interaction forwarding ---------------------------------------------

    pub fn hover(&mut self, coords: &CoordinateSystem, x: f64, y: f64) -> DragState {
        self.rect.hover(&LoopSpace { coords }, x, y)
    }

    pub fn mouse_down(&mut self, coords: &CoordinateSystem, x: f64, y: f64) -> bool {
        self.rect.mouse_down(&LoopSpace { coords }, x, y)
    }

    pub fn drag(&mut self, coords: &CoordinateSystem, x: f64, y: f64) -> bool {
        self.rect.drag(&LoopSpace { coords }, x, y)
    }

    /// Finish an interaction: commit the preview, snap ticks, and resync the
    /// bounds. Returns true if a drag or resize ended.
    pub fn mouse_up(&mut self, coords: &CoordinateSystem) -> bool {
        if !self.rect.mouse_up() {
            return false;
        }
        self.update_ticks_from_bounds(coords);
        self.update_bounds_from_ticks(coords);
        true
    }

    /// Draw the loop region into the ruler band, clipped to the grid area.
    pub fn render_themed(
        &self,
        painter: &egui::Painter,
        origin: egui::Pos2,
        coords: &CoordinateSystem,
        theme: &Theme,
    ) {
        if !self.visible {
            return;
        }
        let space = LoopSpace { coords };
        let Some(screen) = space.world_to_screen_bounds(&self.rect.bounds) else {
            return;
        };

        let local_min_x = coords.piano_key_width();
        let local_max_x = coords.piano_key_width() + coords.viewport().width;

        let to_rect = |b: &RectBounds| {
            let x1 = b.left.max(local_min_x);
            let x2 = b.right.min(local_max_x);
            if x2 <= x1 {
                return None;
            }
            Some(egui::Rect::from_min_max(
                egui::pos2(origin.x + x1 as f32, origin.y + b.top as f32),
                egui::pos2(origin.x + x2 as f32, origin.y + b.bottom as f32),
            ))
        };

        let has_preview = self.rect.show_drag_preview
            && self.rect.preview_bounds().is_some()
            && self.rect.state.is_active();

        if has_preview {
            // Ghost of the original position, then the bright preview.
            if let Some(original) = self.rect.original_bounds() {
                if let Some(orig_screen) = space.world_to_screen_bounds(&original) {
                    if let Some(rect) = to_rect(&orig_screen) {
                        painter.rect_filled(rect, 0.0, theme.loop_ghost_color);
                    }
                }
            }
            if let Some(preview) = self.rect.preview_bounds() {
                if let Some(preview_screen) = space.world_to_screen_bounds(&preview) {
                    if let Some(rect) = to_rect(&preview_screen) {
                        painter.rect_filled(rect, 0.0, theme.loop_preview_fill_color);
                        painter.rect_stroke(
                            rect,
                            0.0,
                            egui::Stroke::new(1.0, theme.loop_preview_border_color),
                            egui::StrokeKind::Inside,
                        );
                    }
                }
            }
            return;
        }

        let Some(rect) = to_rect(&screen) else {
            return;
        };

        let fill = if self.rect.state == DragState::HoveringBody {
            theme.loop_region_hover_fill_color
        } else {
            theme.loop_region_fill_color
        };
        painter.rect_filled(rect, 0.0, fill);

        // Edge handle highlight on hover.
        let handle_width = 60.0_f32.min(rect.width() * 0.5);
        if handle_width > 0.0 {
            match self.rect.state {
                DragState::HoveringLeftEdge => {
                    let handle = egui::Rect::from_min_size(
                        rect.min,
                        egui::vec2(handle_width, rect.height()),
                    );
                    painter.rect_filled(handle, 0.0, theme.loop_region_handle_hover_color);
                }
                DragState::HoveringRightEdge => {
                    let handle = egui::Rect::from_min_size(
                        egui::pos2(rect.max.x - handle_width, rect.min.y),
                        egui::vec2(handle_width, rect.height()),
                    );
                    painter.rect_filled(handle, 0.0, theme.loop_region_handle_hover_color);
                }
                _ => {}
            }
        }

        if self.rect.state == DragState::HoveringBody {
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(1.0, theme.loop_hover_border_color),
                egui::StrokeKind::Inside,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> CoordinateSystem {
        let mut c = CoordinateSystem::new(180.0);
        c.set_pixels_per_beat(60.0);
        c
    }

    #[test]
    fn bounds_follow_tick_range_and_view() {
        let coords = coords();
        let mut marker = LoopMarker::new(1920, 3840);
        marker.set_layout(0.0, 24.0);
        marker.update_bounds_from_ticks(&coords);

        // 1920 ticks = 4 beats = 240 world px.
        assert_eq!(marker.rect.bounds.left, 240.0);
        assert_eq!(marker.rect.bounds.right, 480.0);
        assert!((marker.rect.bounds.top - 24.0 * 0.40).abs() < 1e-9);
        assert!((marker.rect.bounds.bottom - 24.0 * 0.65).abs() < 1e-9);
    }

    #[test]
    fn drag_snaps_to_quarter_beats_on_release() {
        let coords = coords();
        let mut marker = LoopMarker::new(1920, 3840);
        marker.enabled = true;
        marker.visible = true;
        marker.set_layout(0.0, 24.0);
        marker.update_bounds_from_ticks(&coords);

        // Screen X of the region body at world 300: 300 + 180 = 480.
        let y = 12.0;
        assert!(marker.hover(&coords, 480.0, y).is_hovering());
        assert!(marker.mouse_down(&coords, 480.0, y));
        // Drag right by 23 px: under half of the 15 px quarter-beat step
        // after snapping the left edge lands on a grid multiple.
        marker.drag(&coords, 503.0, y);
        assert!(marker.mouse_up(&coords));

        let (start, end) = marker.tick_range();
        assert_eq!(start % 120, 0);
        assert_eq!(end % 120, 0);
        assert_eq!(end - start, 1920);
    }

    #[test]
    fn resize_keeps_minimum_quarter_beat() {
        let coords = coords();
        let mut marker = LoopMarker::new(1920, 3840);
        marker.enabled = true;
        marker.visible = true;
        marker.set_layout(0.0, 24.0);
        marker.update_bounds_from_ticks(&coords);

        // Drag the right edge well past the left one; the region keeps a
        // quarter beat of width.
        let y = 12.0;
        let right_screen = marker.rect.bounds.right + 180.0;
        assert_eq!(
            marker.hover(&coords, right_screen, y),
            DragState::HoveringRightEdge
        );
        marker.mouse_down(&coords, right_screen, y);
        marker.drag(&coords, right_screen - 1000.0, y);
        marker.mouse_up(&coords);

        let (start, end) = marker.tick_range();
        assert_eq!(start, 1920);
        assert_eq!(end - start, 120);
    }

    #[test]
    fn edge_threshold_is_wide() {
        let coords = coords();
        let mut marker = LoopMarker::new(1920, 3840);
        marker.set_layout(0.0, 24.0);
        marker.update_bounds_from_ticks(&coords);

        // World 240 -> screen 420; 15 px inside still grabs the left edge.
        assert_eq!(
            marker.hover(&coords, 435.0, 12.0),
            DragState::HoveringLeftEdge
        );
    }
}
