use crate::constants::{
    DEFAULT_KEY_HEIGHT, DEFAULT_PIXELS_PER_BEAT, DEFAULT_TICKS_PER_BEAT, MAX_PIXELS_PER_BEAT,
    MIN_PIXELS_PER_BEAT, TOTAL_KEYS,
};
use crate::model::note::{MidiKey, Tick};

/// Visible area in world coordinates. `x` may go negative (the timeline
/// extends left of bar 1); `y` is clamped by the coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1200.0,
            height: 700.0,
        }
    }
}

/// Bi-directional mapping between musical time (ticks), pitch (keys), and
/// pixels. World space is anchored at tick 0 (X = 0) and the top of the
/// highest key (Y = 0); keys are stacked bottom-up so key 0 sits at maximum
/// world Y.
#[derive(Debug, Clone)]
pub struct CoordinateSystem {
    piano_key_width: f64,
    viewport: Viewport,

    ticks_per_beat: i32,
    pixels_per_beat: f64,
    min_pixels_per_beat: f64,
    max_pixels_per_beat: f64,

    key_height: f64,
    total_keys: i32,
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::new(180.0)
    }
}

impl CoordinateSystem {
    pub fn new(piano_key_width: f64) -> Self {
        Self {
            piano_key_width,
            viewport: Viewport::default(),
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            pixels_per_beat: DEFAULT_PIXELS_PER_BEAT,
            min_pixels_per_beat: MIN_PIXELS_PER_BEAT,
            max_pixels_per_beat: MAX_PIXELS_PER_BEAT,
            key_height: DEFAULT_KEY_HEIGHT,
            total_keys: TOTAL_KEYS,
        }
    }

    pub fn piano_key_width(&self) -> f64 {
        self.piano_key_width
    }

    pub fn set_piano_key_width(&mut self, width: f64) {
        self.piano_key_width = width;
    }

    pub fn ticks_per_beat(&self) -> i32 {
        self.ticks_per_beat
    }

    pub fn set_ticks_per_beat(&mut self, ticks: i32) {
        if ticks > 0 {
            self.ticks_per_beat = ticks;
        }
    }

    pub fn pixels_per_beat(&self) -> f64 {
        self.pixels_per_beat
    }

    pub fn set_pixels_per_beat(&mut self, value: f64) {
        if value > 0.0 {
            self.pixels_per_beat = value.clamp(self.min_pixels_per_beat, self.max_pixels_per_beat);
        }
    }

    pub fn min_pixels_per_beat(&self) -> f64 {
        self.min_pixels_per_beat
    }

    pub fn max_pixels_per_beat(&self) -> f64 {
        self.max_pixels_per_beat
    }

    pub fn key_height(&self) -> f64 {
        self.key_height
    }

    pub fn set_key_height(&mut self, height: f64) {
        if height > 0.0 {
            self.key_height = height;
        }
    }

    pub fn total_keys(&self) -> i32 {
        self.total_keys
    }

    pub fn set_total_keys(&mut self, count: i32) {
        if count > 0 {
            self.total_keys = count;
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Maximum vertical scroll that keeps the last key visible.
    pub fn max_scroll_y(&self) -> f64 {
        let content_height = f64::from(self.total_keys) * self.key_height;
        (content_height - self.viewport.height).max(0.0)
    }

    // Transforms --------------------------------------------------------

    pub fn screen_to_world(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        (
            screen_x - self.piano_key_width + self.viewport.x,
            screen_y + self.viewport.y,
        )
    }

    pub fn world_to_screen(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        (
            world_x - self.viewport.x + self.piano_key_width,
            world_y - self.viewport.y,
        )
    }

    pub fn world_to_tick(&self, world_x: f64) -> Tick {
        let beats = world_x / self.pixels_per_beat;
        let tick = beats * f64::from(self.ticks_per_beat);
        tick.max(0.0) as Tick
    }

    pub fn tick_to_world(&self, tick: Tick) -> f64 {
        tick as f64 / f64::from(self.ticks_per_beat) * self.pixels_per_beat
    }

    pub fn key_to_world_y(&self, key: MidiKey) -> f64 {
        let key = key.clamp(0, self.total_keys - 1);
        f64::from(self.total_keys - 1 - key) * self.key_height
    }

    pub fn world_y_to_key(&self, world_y: f64) -> MidiKey {
        if self.key_height <= 0.0 || self.total_keys <= 0 {
            return 0;
        }
        let index_from_top = (world_y / self.key_height) as i32;
        (self.total_keys - 1 - index_from_top).clamp(0, self.total_keys - 1)
    }

    // Zoom and scroll ---------------------------------------------------

    pub fn set_zoom(&mut self, pixels_per_beat: f64) {
        self.set_pixels_per_beat(pixels_per_beat);
    }

    pub fn zoom_in(&mut self, factor: f64) {
        self.set_pixels_per_beat(self.pixels_per_beat * factor);
    }

    pub fn zoom_out(&mut self, factor: f64) {
        self.set_pixels_per_beat(self.pixels_per_beat / factor);
    }

    /// Zoom around a world-X anchor, shifting the viewport so the anchor
    /// keeps its screen column. When clamping limits the zoom, the shift
    /// uses the effective factor. The viewport X is never clamped.
    pub fn zoom_at(&mut self, factor: f64, world_x_anchor: f64) {
        if factor <= 0.0 || self.pixels_per_beat <= 0.0 {
            return;
        }
        let old_ppb = self.pixels_per_beat;
        let new_ppb =
            (old_ppb * factor).clamp(self.min_pixels_per_beat, self.max_pixels_per_beat);
        let effective_factor = new_ppb / old_ppb;

        self.pixels_per_beat = new_ppb;
        self.viewport.x += world_x_anchor * (effective_factor - 1.0);
    }

    /// Any world X is allowed; Y is clamped to [0, max_scroll_y].
    pub fn set_scroll(&mut self, world_x: f64, world_y: f64) {
        self.viewport.x = world_x;
        self.viewport.y = world_y.clamp(0.0, self.max_scroll_y());
    }

    pub fn pan(&mut self, delta_x: f64, delta_y: f64) {
        self.set_scroll(self.viewport.x + delta_x, self.viewport.y + delta_y);
    }

    // Visible ranges ----------------------------------------------------

    pub fn visible_tick_range(&self) -> (Tick, Tick) {
        let start = self.world_to_tick(self.viewport.x);
        let end = self.world_to_tick(self.viewport.x + self.viewport.width);
        (start, end.max(start))
    }

    pub fn visible_key_range(&self) -> (MidiKey, MidiKey) {
        let highest = self.world_y_to_key(self.viewport.y);
        let lowest = self.world_y_to_key(self.viewport.y + self.viewport.height);
        (lowest.min(highest), highest.max(lowest))
    }

    pub fn center_on_tick(&mut self, tick: Tick) {
        let world_x = self.tick_to_world(tick);
        self.viewport.x = (world_x - self.viewport.width / 2.0).max(0.0);
    }

    pub fn center_on_key(&mut self, key: MidiKey) {
        let world_y = self.key_to_world_y(key);
        let new_y = world_y - self.viewport.height / 2.0 + self.key_height / 2.0;
        self.set_scroll(self.viewport.x, new_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn screen_world_round_trip() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_scroll(-250.0, 400.0);

        for &(wx, wy) in &[(0.0, 0.0), (-300.5, 123.25), (5000.0, 2000.0)] {
            let (sx, sy) = coords.world_to_screen(wx, wy);
            let (rx, ry) = coords.screen_to_world(sx, sy);
            assert!((rx - wx).abs() < EPS);
            assert!((ry - wy).abs() < EPS);
        }
    }

    #[test]
    fn tick_world_round_trip() {
        let coords = CoordinateSystem::new(180.0);
        for tick in [0, 1, 120, 480, 481, 7680, 1_000_000] {
            assert_eq!(coords.world_to_tick(coords.tick_to_world(tick)), tick);
        }
    }

    #[test]
    fn world_to_tick_clamps_negative_x() {
        let coords = CoordinateSystem::new(180.0);
        assert_eq!(coords.world_to_tick(-100.0), 0);
    }

    #[test]
    fn keys_stack_bottom_up() {
        let coords = CoordinateSystem::new(180.0);
        // Key 127 is at world Y 0; key 0 at the bottom.
        assert_eq!(coords.key_to_world_y(127), 0.0);
        assert_eq!(coords.key_to_world_y(0), 127.0 * 20.0);
        assert_eq!(coords.world_y_to_key(0.0), 127);
        assert_eq!(coords.world_y_to_key(127.0 * 20.0), 0);
        assert_eq!(coords.world_y_to_key(10.0), 127);
        assert_eq!(coords.world_y_to_key(20.0), 126);
    }

    #[test]
    fn anchored_zoom_keeps_anchor_screen_x() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_pixels_per_beat(60.0);
        coords.set_scroll(0.0, 0.0);

        let anchor = 300.0; // beat 5
        let (before_x, _) = coords.world_to_screen(anchor, 0.0);
        coords.zoom_at(2.0, anchor);

        assert!((coords.pixels_per_beat() - 120.0).abs() < EPS);
        assert!((coords.viewport().x - 300.0).abs() < EPS);
        // The anchor's musical position now sits at world X = anchor * 2.
        let (after_x, _) = coords.world_to_screen(anchor * 2.0, 0.0);
        assert!((after_x - before_x).abs() < EPS);
    }

    #[test]
    fn clamped_zoom_uses_effective_factor() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_pixels_per_beat(60.0);
        coords.set_scroll(0.0, 0.0);

        // Factor far past the max: effective factor is max_ppb / 60.
        coords.zoom_at(1000.0, 300.0);
        let effective = coords.max_pixels_per_beat() / 60.0;
        assert!((coords.pixels_per_beat() - coords.max_pixels_per_beat()).abs() < EPS);
        assert!((coords.viewport().x - 300.0 * (effective - 1.0)).abs() < EPS);
    }

    #[test]
    fn zoom_at_does_not_clamp_viewport_x() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_pixels_per_beat(60.0);
        coords.set_scroll(-100.0, 0.0);
        coords.zoom_at(0.5, -200.0);
        // Anchor left of zero shifts the viewport further negative.
        assert!(coords.viewport().x < -100.0);
    }

    #[test]
    fn scroll_allows_negative_x_and_clamps_y() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_scroll(-500.0, -50.0);
        assert_eq!(coords.viewport().x, -500.0);
        assert_eq!(coords.viewport().y, 0.0);

        coords.set_scroll(0.0, 1e9);
        assert_eq!(coords.viewport().y, coords.max_scroll_y());
    }

    #[test]
    fn visible_ranges_are_ordered() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_scroll(120.0, 300.0);
        let (start, end) = coords.visible_tick_range();
        assert!(start <= end);
        let (low, high) = coords.visible_key_range();
        assert!(low <= high);
    }

    #[test]
    fn pixels_per_beat_is_clamped() {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_pixels_per_beat(1.0);
        assert_eq!(coords.pixels_per_beat(), coords.min_pixels_per_beat());
        coords.set_pixels_per_beat(1e9);
        assert_eq!(coords.pixels_per_beat(), coords.max_pixels_per_beat());
        coords.set_pixels_per_beat(-5.0);
        assert_eq!(coords.pixels_per_beat(), coords.max_pixels_per_beat());
    }
}
