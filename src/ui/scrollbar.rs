use std::time::Instant;

use crate::constants::{
    SCROLLBAR_DOUBLE_CLICK_SECS, SCROLLBAR_DRAG_THRESHOLD, SCROLLBAR_MIN_THUMB,
    SCROLLBAR_PAGE_FRACTION, SCROLLBAR_TRACK_SIZE,
};
use crate::ui::drag_rect::{DragRect, DragState, IdentitySpace, RectBounds};
use crate::ui::theme::Theme;

/// What a scrollbar interaction asks the host widget to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollbarEvent {
    /// Apply a new scroll position (world X) to the viewport, unclamped.
    Scroll(f64),
    /// An edge is being dragged; the widget turns this into a zoom using the
    /// manual thumb geometry accessors.
    EdgeResize { left_edge: bool },
    /// Thumb double-clicked (fit view to clip).
    DoubleClick,
    /// A thumb drag finished.
    DragEnd,
}

/// Horizontal scrollbar over the explored world range. Thumb geometry is
/// derived from the viewport size, explored span, and scroll position. Body
/// clicks become drags only after a small movement threshold; thumb edge
/// drags report as zoom; clicks in the track page-scroll. All coordinates
/// are widget-local pixels.
#[derive(Debug)]
pub struct HScrollbar {
    rect: DragRect,
    pub track_size: f32,

    track_pos: (f64, f64),
    track_px: (f64, f64),

    viewport_size: f64,
    scroll_position: f64,
    explored_min: f64,
    explored_max: f64,

    drag_intent: bool,
    drag_start_mouse: Option<(f64, f64)>,
    last_mouse: (f64, f64),
    suppress_hover: bool,

    edge_resize_mode: bool,
    manual_thumb_pos: Option<(f64, f64)>,
    manual_thumb_size: Option<(f64, f64)>,

    last_click_time: Option<Instant>,
}

impl Default for HScrollbar {
    fn default() -> Self {
        Self::new()
    }
}

impl HScrollbar {
    pub fn new() -> Self {
        let mut rect = DragRect::new();
        // Thumb interaction works directly in screen space.
        rect.snap_enabled = false;
        rect.show_drag_preview = false;
        Self {
            rect,
            track_size: SCROLLBAR_TRACK_SIZE,
            track_pos: (0.0, 0.0),
            track_px: (0.0, 0.0),
            viewport_size: 100.0,
            scroll_position: 0.0,
            explored_min: 0.0,
            explored_max: 100.0,
            drag_intent: false,
            drag_start_mouse: None,
            last_mouse: (0.0, 0.0),
            suppress_hover: false,
            edge_resize_mode: false,
            manual_thumb_pos: None,
            manual_thumb_size: None,
            last_click_time: None,
        }
    }

    // Geometry and state -------------------------------------------------

    pub fn update_geometry(&mut self, x: f64, y: f64, length: f64) {
        self.track_pos = (x, y);
        self.track_px = (length, f64::from(self.track_size));
        self.update_thumb();
    }

    pub fn set_viewport_size(&mut self, size: f64) {
        self.viewport_size = size.max(1.0);
        if !self.edge_resize_mode {
            self.update_thumb();
        }
    }

    /// Horizontal scroll may run beyond the explored area; the explored
    /// bounds are managed separately by the widget.
    pub fn set_scroll_position(&mut self, position: f64) {
        self.scroll_position = position;
        if !self.edge_resize_mode {
            self.update_thumb();
        }
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll_position
    }

    pub fn set_explored_area(&mut self, min_pos: f64, max_pos: f64) {
        let changed = self.explored_min != min_pos || self.explored_max != max_pos;
        self.explored_min = min_pos;
        self.explored_max = max_pos;
        if changed && !self.edge_resize_mode {
            self.update_thumb();
        }
    }

    pub fn expand_explored_area(&mut self, position: f64) {
        self.explored_min = self.explored_min.min(position);
        self.explored_max = self.explored_max.max(position + self.viewport_size);
        self.update_thumb();
    }

    pub fn explored_min(&self) -> f64 {
        self.explored_min
    }

    pub fn explored_max(&self) -> f64 {
        self.explored_max
    }

    pub fn viewport_size(&self) -> f64 {
        self.viewport_size
    }

    pub fn track_pos(&self) -> (f64, f64) {
        self.track_pos
    }

    pub fn track_px(&self) -> (f64, f64) {
        self.track_px
    }

    pub fn thumb_bounds(&self) -> RectBounds {
        self.rect.bounds
    }

    pub fn manual_thumb_pos(&self) -> Option<(f64, f64)> {
        self.manual_thumb_pos
    }

    pub fn manual_thumb_size(&self) -> Option<(f64, f64)> {
        self.manual_thumb_size
    }

    pub fn is_active(&self) -> bool {
        self.drag_intent || self.rect.state.is_active()
    }

    // Events -------------------------------------------------------------

    pub fn on_mouse_move(&mut self, x: f64, y: f64) -> Option<ScrollbarEvent> {
        // Promote a pending body click to a real drag after the threshold.
        if self.drag_intent {
            if let Some((sx, sy)) = self.drag_start_mouse {
                if (x - sx).abs() > SCROLLBAR_DRAG_THRESHOLD
                    || (y - sy).abs() > SCROLLBAR_DRAG_THRESHOLD
                {
                    self.drag_intent = false;
                    self.drag_start_mouse = None;
                    self.rect.state = DragState::HoveringBody;
                    self.rect.start_drag(&IdentitySpace, sx, sy);
                    self.rect.state = DragState::Dragging;
                }
            }
        }

        // After an edge release, wait for some movement before hovering
        // again so the rebuilt thumb does not instantly re-highlight.
        if self.suppress_hover {
            if (x - self.last_mouse.0).abs() > 5.0 || (y - self.last_mouse.1).abs() > 5.0 {
                self.suppress_hover = false;
            } else {
                return None;
            }
        }

        if self.rect.state == DragState::ResizingLeft || self.rect.state == DragState::ResizingRight
        {
            let left_edge = self.rect.state == DragState::ResizingLeft;
            let delta_x = x - self.last_mouse.0;
            self.edge_resize_mode = true;

            let current = self.rect.bounds;
            let (mut new_x1, mut new_x2) = (current.left, current.right);
            let min_width = SCROLLBAR_MIN_THUMB;
            if left_edge {
                new_x1 = (current.left + delta_x).max(self.track_pos.0);
                if new_x2 - new_x1 < min_width {
                    new_x1 = new_x2 - min_width;
                }
            } else {
                new_x2 = (current.right + delta_x).min(self.track_pos.0 + self.track_px.0);
                if new_x2 - new_x1 < min_width {
                    new_x2 = new_x1 + min_width;
                }
            }

            self.manual_thumb_pos = Some((new_x1, current.top));
            self.manual_thumb_size = Some((new_x2 - new_x1, f64::from(self.track_size)));
            self.rect.bounds = RectBounds::new(
                new_x1,
                new_x2,
                current.top,
                current.top + f64::from(self.track_size),
            );

            self.last_mouse = (x, y);
            return Some(ScrollbarEvent::EdgeResize { left_edge });
        }

        if self.rect.state == DragState::Dragging {
            self.rect.update_drag(&IdentitySpace, x, y);
            self.last_mouse = (x, y);
            return self.scroll_from_thumb().map(ScrollbarEvent::Scroll);
        }

        self.rect.hover(&IdentitySpace, x, y);
        self.last_mouse = (x, y);
        None
    }

    pub fn on_mouse_down(&mut self, x: f64, y: f64) -> Option<ScrollbarEvent> {
        self.last_mouse = (x, y);

        let on_thumb = self.rect.bounds.contains(x, y);

        // Double-click detection on the thumb.
        if on_thumb {
            let now = Instant::now();
            if let Some(last) = self.last_click_time {
                let elapsed = now.duration_since(last).as_secs_f64();
                if elapsed < SCROLLBAR_DOUBLE_CLICK_SECS && elapsed > 0.05 {
                    self.last_click_time = None;
                    return Some(ScrollbarEvent::DoubleClick);
                }
            }
            self.last_click_time = Some(now);
        }

        let in_track = self.track_pos.0 <= x
            && x <= self.track_pos.0 + self.track_px.0
            && self.track_pos.1 <= y
            && y <= self.track_pos.1 + self.track_px.1;

        // Track clicks outside the thumb page-scroll by most of a viewport.
        if in_track && !on_thumb {
            let max_scroll = (self.explored_max - self.explored_min - self.viewport_size).max(0.0);
            let page = self.viewport_size * SCROLLBAR_PAGE_FRACTION;
            self.scroll_position = if x < self.rect.bounds.left {
                (self.scroll_position - page).max(self.explored_min)
            } else {
                (self.scroll_position + page).min(self.explored_min + max_scroll)
            };
            self.update_thumb();
            return Some(ScrollbarEvent::Scroll(self.scroll_position));
        }

        if on_thumb {
            if (x - self.rect.bounds.left).abs() <= self.rect.edge_threshold {
                self.rect.state = DragState::ResizingLeft;
                self.begin_edge_resize();
                return None;
            }
            if (x - self.rect.bounds.right).abs() <= self.rect.edge_threshold {
                self.rect.state = DragState::ResizingRight;
                self.begin_edge_resize();
                return None;
            }
            // Body press: drag starts only after the movement threshold.
            self.drag_intent = true;
            self.drag_start_mouse = Some((x, y));
        }

        None
    }

    pub fn on_mouse_up(&mut self, _x: f64, _y: f64) -> Option<ScrollbarEvent> {
        if self.drag_intent {
            self.drag_intent = false;
            self.drag_start_mouse = None;
            return None;
        }

        let was_resizing = self.rect.state == DragState::ResizingLeft
            || self.rect.state == DragState::ResizingRight;
        let was_dragging = self.rect.state == DragState::Dragging;

        self.rect.mouse_up();

        if was_resizing {
            self.edge_resize_mode = false;
            self.manual_thumb_pos = None;
            self.manual_thumb_size = None;
            self.suppress_hover = true;
            self.update_thumb();
        }

        if was_dragging {
            return Some(ScrollbarEvent::DragEnd);
        }
        None
    }

    /// Draw the track and thumb. Geometry is widget-local, so the canvas
    /// origin is added here.
    pub fn render_at(&self, painter: &egui::Painter, origin: egui::Pos2, theme: &Theme) {
        let track = egui::Rect::from_min_size(
            egui::pos2(
                origin.x + self.track_pos.0 as f32,
                origin.y + self.track_pos.1 as f32,
            ),
            egui::vec2(self.track_px.0 as f32, self.track_px.1 as f32),
        );
        painter.rect_filled(track, 0.0, theme.scrollbar_track_color);

        let b = self.rect.bounds;
        let thumb = egui::Rect::from_min_max(
            egui::pos2(origin.x + b.left as f32, origin.y + b.top as f32),
            egui::pos2(origin.x + b.right as f32, origin.y + b.bottom as f32),
        );
        painter.rect_filled(thumb, 4.0, theme.scrollbar_thumb_color);
    }

    // Internals ----------------------------------------------------------

    fn begin_edge_resize(&mut self) {
        self.edge_resize_mode = true;
        self.manual_thumb_pos = Some((self.rect.bounds.left, self.rect.bounds.top));
        self.manual_thumb_size = Some((self.rect.bounds.width(), self.rect.bounds.height()));
    }

    fn update_thumb(&mut self) {
        if self.edge_resize_mode {
            if let (Some(pos), Some(size)) = (self.manual_thumb_pos, self.manual_thumb_size) {
                self.rect.bounds = RectBounds::new(pos.0, pos.0 + size.0, pos.1, pos.1 + size.1);
                return;
            }
        }

        let explored_range = self.explored_max - self.explored_min;
        if self.viewport_size >= explored_range {
            // Everything explored is visible: the thumb fills the track.
            self.rect.bounds = RectBounds::new(
                self.track_pos.0,
                self.track_pos.0 + self.track_px.0,
                self.track_pos.1,
                self.track_pos.1 + f64::from(self.track_size),
            );
            return;
        }

        let thumb_ratio = self.viewport_size / explored_range;
        let thumb_length = (self.track_px.0 * thumb_ratio).max(SCROLLBAR_MIN_THUMB);
        let available = self.track_px.0 - thumb_length;

        let mut offset = 0.0;
        if available > 0.0 && explored_range > self.viewport_size {
            let normalized = (self.scroll_position - self.explored_min)
                / (explored_range - self.viewport_size);
            offset = normalized.clamp(0.0, 1.0) * available;
        }

        self.rect.bounds = RectBounds::new(
            self.track_pos.0 + offset,
            self.track_pos.0 + offset + thumb_length,
            self.track_pos.1,
            self.track_pos.1 + f64::from(self.track_size),
        );
    }

    /// Map the dragged thumb position back to a world scroll position.
    fn scroll_from_thumb(&mut self) -> Option<f64> {
        let thumb_rel = self.rect.bounds.left - self.track_pos.0;
        let available = self.track_px.0 - self.rect.bounds.width();
        let explored_range = self.explored_max - self.explored_min;
        if available <= 0.0 || explored_range <= self.viewport_size {
            return None;
        }
        let fraction = (thumb_rel / available).clamp(0.0, 1.0);
        self.scroll_position = self.explored_min + fraction * (explored_range - self.viewport_size);
        Some(self.scroll_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> HScrollbar {
        let mut s = HScrollbar::new();
        s.update_geometry(0.0, 100.0, 400.0);
        s.set_viewport_size(800.0);
        s.set_explored_area(0.0, 3200.0);
        s.set_scroll_position(0.0);
        s
    }

    #[test]
    fn thumb_geometry_tracks_explored_area() {
        let s = bar();
        // viewport/explored = 1/4 of a 400 px track.
        let b = s.thumb_bounds();
        assert_eq!(b.left, 0.0);
        assert_eq!(b.width(), 100.0);

        let mut s = bar();
        s.set_scroll_position(2400.0); // at the far right
        let b = s.thumb_bounds();
        assert_eq!(b.left, 300.0);
    }

    #[test]
    fn full_view_fills_track() {
        let mut s = bar();
        s.set_explored_area(0.0, 500.0);
        let b = s.thumb_bounds();
        assert_eq!(b.left, 0.0);
        assert_eq!(b.width(), 400.0);
    }

    #[test]
    fn track_click_pages_by_most_of_a_viewport() {
        let mut s = bar();
        let event = s.on_mouse_down(300.0, 105.0);
        assert_eq!(event, Some(ScrollbarEvent::Scroll(720.0)));

        // Page back left of the thumb.
        let event = s.on_mouse_down(10.0, 105.0);
        // Thumb moved right; x=10 is now left of it.
        assert_eq!(event, Some(ScrollbarEvent::Scroll(0.0)));
    }

    #[test]
    fn body_drag_needs_threshold_then_scrolls() {
        let mut s = bar();
        assert_eq!(s.on_mouse_down(50.0, 105.0), None);
        assert!(s.is_active());

        // Below the threshold nothing happens.
        assert_eq!(s.on_mouse_move(51.0, 105.0), None);

        // Crossing the threshold starts the drag; thumb center maps back to
        // a world scroll position.
        let event = s.on_mouse_move(150.0, 105.0);
        let Some(ScrollbarEvent::Scroll(pos)) = event else {
            panic!("expected scroll, got {:?}", event);
        };
        // Thumb moved +100 px of 300 available: a third of the scrollable
        // span (3200 - 800).
        assert!((pos - 800.0).abs() < 1e-6);

        assert_eq!(s.on_mouse_up(150.0, 105.0), Some(ScrollbarEvent::DragEnd));
    }

    #[test]
    fn quick_release_cancels_drag_intent() {
        let mut s = bar();
        s.on_mouse_down(50.0, 105.0);
        assert_eq!(s.on_mouse_up(50.0, 105.0), None);
        assert!(!s.is_active());
    }

    #[test]
    fn edge_press_enters_resize_mode() {
        let mut s = bar();
        s.on_mouse_down(2.0, 105.0);
        assert_eq!(
            s.on_mouse_move(10.0, 105.0),
            Some(ScrollbarEvent::EdgeResize { left_edge: true })
        );
        // Manual thumb geometry is live during the resize.
        assert!(s.manual_thumb_pos().is_some());
        let (w, _) = s.manual_thumb_size().unwrap();
        assert!((w - 92.0).abs() < 1e-6);

        s.on_mouse_up(10.0, 105.0);
        assert!(s.manual_thumb_pos().is_none());
    }

    #[test]
    fn edge_resize_enforces_min_thumb_width() {
        let mut s = bar();
        s.on_mouse_down(98.0, 105.0);
        s.on_mouse_move(400.0, 105.0);
        assert!(s.manual_thumb_size().unwrap().0 >= SCROLLBAR_MIN_THUMB);
    }

    #[test]
    fn expand_explored_area_grows_both_ends() {
        let mut s = bar();
        s.expand_explored_area(-400.0);
        assert_eq!(s.explored_min(), -400.0);
        s.expand_explored_area(4000.0);
        assert_eq!(s.explored_max(), 4800.0);
    }
}
