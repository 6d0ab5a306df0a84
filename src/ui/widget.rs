use std::io::{self, BufRead, Write};

use egui::{Align2, FontId, Painter, Pos2, Rect, Stroke};

use crate::config::PianoRollConfig;
use crate::constants::{
    BASE_KEY_HEIGHT, EDGE_SCROLL_BASE_SPEED, EDGE_SCROLL_MARGIN, EDGE_SCROLL_MAX_SPEED,
    EDGE_ZOOM_MAX_PPB, EDGE_ZOOM_MIN_PPB, FIT_MAX_PPB, FIT_MIN_PPB, GESTURE_AXIS_RATIO,
    GESTURE_START_THRESHOLD, MARKER_HIT_PX, MAX_PIXELS_PER_BEAT, MIN_PIXELS_PER_BEAT,
    VERTICAL_ZOOM_MAX_PERCENT, VERTICAL_ZOOM_MIN_PERCENT, WHEEL_SCROLL_SPEED,
};
use crate::coords::CoordinateSystem;
use crate::grid::GridSnap;
use crate::input::keyboard::{EditorKey, KeyboardController};
use crate::input::pointer::{HoverEdge, ModifierKeys, PointerController};
use crate::model::cc::ControlLane;
use crate::model::note::{MidiKey, NoteId, Tick};
use crate::model::store::NoteStore;
use crate::playback::advance_playback_ticks;
use crate::serialization;
use crate::ui::cc_lane::{self, resolve_lane_height};
use crate::ui::loop_marker::LoopMarker;
use crate::ui::overlay;
use crate::ui::renderer::{self, note_name};
use crate::ui::scrollbar::{HScrollbar, ScrollbarEvent};
use crate::ui::theme::Theme;

/// Notifications the widget produced during a frame, returned from `ui`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PianoRollEvent {
    PlayheadChanged(Tick),
    PlaybackMarkersChanged {
        start: Tick,
        cue_left: Tick,
        cue_right: Tick,
    },
    PianoKeyPressed(MidiKey),
    PianoKeyReleased(MidiKey),
}

/// One frame of pointer state in widget-local coordinates. `ui` builds this
/// from egui input; tests construct it directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerInput {
    pub x: f32,
    pub y: f32,
    pub inside: bool,
    pub pressed: bool,
    pub down: bool,
    pub released: bool,
    pub double_clicked: bool,
    /// Wheel movement in notches; positive scrolls the view up.
    pub wheel_notches: f32,
    pub mods: ModifierKeys,
}

#[derive(Debug, Default)]
struct RulerGesture {
    active: bool,
    pan: bool,
    zoom: bool,
    start_x: f64,
    start_viewport_x: f64,
    initial_x: f64,
    initial_y: f64,
    zoom_start_ppb: f64,
    zoom_start_y: f64,
    zoom_anchor_x: f64,
}

#[derive(Debug, Default)]
struct NoteNamesGesture {
    active: bool,
    pan: bool,
    zoom: bool,
    start_y: f64,
    start_viewport_y: f64,
    initial_x: f64,
    initial_y: f64,
    zoom_start_x: f64,
    zoom_start_ppk: f64,
    anchor_y: f64,
}

/// The piano roll widget: owns the model, view transforms, and interaction
/// controllers, arbitrates gesture priority per frame, and issues draw
/// commands to the egui painter. Single-threaded, driven by the host's
/// immediate-mode frame loop.
pub struct PianoRollWidget {
    store: NoteStore,
    coords: CoordinateSystem,
    grid: GridSnap,
    config: PianoRollConfig,
    theme: Theme,

    pointer: PointerController,
    keyboard: KeyboardController,
    loop_marker: LoopMarker,
    scrollbar: HScrollbar,

    cc_lanes: Vec<ControlLane>,
    active_cc_lane: Option<usize>,
    cc_dragging: bool,
    cc_drag_index: Option<usize>,

    explored_min_x: f64,
    explored_max_x: f64,

    clip_start_tick: Tick,
    clip_end_tick: Tick,

    playback_start_tick: Tick,
    show_playback_start_marker: bool,
    cue_left_tick: Tick,
    cue_right_tick: Tick,
    show_cue_markers: bool,

    dragging_playback_start: bool,
    dragging_cue_left: bool,
    dragging_cue_right: bool,

    playhead: Option<Tick>,

    ruler_gesture: RulerGesture,
    note_names_gesture: NoteNamesGesture,

    hovered_piano_key: Option<MidiKey>,
    pressed_piano_key: Option<MidiKey>,
    piano_key_pressed_active: bool,

    show_debug_crosshair: bool,
    debug_mouse: Option<(f32, f32)>,
    last_clicked_cell: Option<(Tick, Tick, MidiKey)>,

    events: Vec<PianoRollEvent>,
}

impl Default for PianoRollWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoRollWidget {
    pub fn new() -> Self {
        Self::with_config(PianoRollConfig::default())
    }

    pub fn with_config(config: PianoRollConfig) -> Self {
        let mut coords = CoordinateSystem::new(config.piano_key_width);
        coords.set_ticks_per_beat(config.ticks_per_beat);
        {
            let vp = coords.viewport_mut();
            vp.width = 800.0;
            vp.height = 400.0;
        }
        coords.center_on_key(config.initial_center_key);

        let mut grid = GridSnap::new(config.ticks_per_beat);
        grid.set_beats_per_measure(config.beats_per_measure);

        let tpb = Tick::from(config.ticks_per_beat);
        let mut loop_marker = LoopMarker::new(4 * tpb, 8 * tpb);
        loop_marker.set_layout(config.top_padding, config.ruler_height);

        let mut pointer = PointerController::new();
        pointer.set_default_note_duration(tpb);

        let clip_end =
            Tick::from(config.default_clip_bars) * Tick::from(config.beats_per_measure) * tpb;

        let explored_min = coords.viewport().x;
        let explored_max = coords.viewport().x + coords.viewport().width;

        let mut widget = Self {
            store: NoteStore::new(),
            coords,
            grid,
            config,
            theme: Theme::default(),
            pointer,
            keyboard: KeyboardController::new(),
            loop_marker,
            scrollbar: HScrollbar::new(),
            cc_lanes: vec![ControlLane::new(1)],
            active_cc_lane: Some(0),
            cc_dragging: false,
            cc_drag_index: None,
            explored_min_x: explored_min,
            explored_max_x: explored_max,
            clip_start_tick: 0,
            clip_end_tick: clip_end,
            playback_start_tick: 0,
            show_playback_start_marker: false,
            cue_left_tick: 0,
            cue_right_tick: 0,
            show_cue_markers: false,
            dragging_playback_start: false,
            dragging_cue_left: false,
            dragging_cue_right: false,
            playhead: None,
            ruler_gesture: RulerGesture::default(),
            note_names_gesture: NoteNamesGesture::default(),
            hovered_piano_key: None,
            pressed_piano_key: None,
            piano_key_pressed_active: false,
            show_debug_crosshair: false,
            debug_mouse: None,
            last_clicked_cell: None,
            events: Vec::new(),
        };
        widget.scrollbar.set_explored_area(explored_min, explored_max);
        widget.sync_scrollbar();
        widget
    }

    // Component access ---------------------------------------------------

    pub fn notes(&self) -> &NoteStore {
        &self.store
    }

    pub fn notes_mut(&mut self) -> &mut NoteStore {
        &mut self.store
    }

    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    pub fn coords_mut(&mut self) -> &mut CoordinateSystem {
        &mut self.coords
    }

    pub fn snap(&self) -> &GridSnap {
        &self.grid
    }

    pub fn snap_mut(&mut self) -> &mut GridSnap {
        &mut self.grid
    }

    pub fn config(&self) -> &PianoRollConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PianoRollConfig {
        &mut self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    pub fn set_clip_color(&mut self, color: egui::Color32) {
        self.theme.apply_clip_color(color);
    }

    pub fn apply_light_theme_from_clip_color(&mut self, color: egui::Color32) {
        self.theme = Theme::light_from_clip_color(color);
    }

    pub fn cc_lanes(&self) -> &[ControlLane] {
        &self.cc_lanes
    }

    pub fn cc_lanes_mut(&mut self) -> &mut Vec<ControlLane> {
        &mut self.cc_lanes
    }

    pub fn active_cc_lane_index(&self) -> Option<usize> {
        self.active_cc_lane
    }

    pub fn set_active_cc_lane_index(&mut self, index: Option<usize>) {
        self.active_cc_lane = index.filter(|&i| i < self.cc_lanes.len());
    }

    // Playback markers and playhead --------------------------------------

    pub fn set_playback_start_tick(&mut self, tick: Tick) {
        self.playback_start_tick = tick;
        self.show_playback_start_marker = true;
        self.push_markers_changed();
    }

    pub fn playback_start_tick(&self) -> Tick {
        self.playback_start_tick
    }

    pub fn set_cue_markers(&mut self, left: Tick, right: Tick) {
        let (left, right) = if left <= right { (left, right) } else { (right, left) };
        self.cue_left_tick = left;
        self.cue_right_tick = right;
        self.show_cue_markers = true;
        self.push_markers_changed();
    }

    pub fn cue_markers(&self) -> (Tick, Tick) {
        (self.cue_left_tick, self.cue_right_tick)
    }

    pub fn set_playhead(&mut self, tick: Tick) {
        let tick = tick.max(0);
        self.playhead = Some(tick);
        self.events.push(PianoRollEvent::PlayheadChanged(tick));
    }

    pub fn clear_playhead(&mut self) {
        self.playhead = None;
    }

    pub fn has_playhead(&self) -> bool {
        self.playhead.is_some()
    }

    pub fn playhead_tick(&self) -> Tick {
        self.playhead.unwrap_or(0)
    }

    /// Advance a host-held playback position, applying the widget's loop
    /// region when enabled, and move the playhead to the result.
    pub fn update_playback(&mut self, current_tick: Tick, tempo_bpm: f64, delta_seconds: f64) -> Tick {
        let (loop_start, loop_end) = self.loop_marker.tick_range();
        let loop_on = self.loop_marker.enabled && loop_end > loop_start;
        let new_tick = advance_playback_ticks(
            current_tick,
            tempo_bpm,
            self.coords.ticks_per_beat(),
            delta_seconds,
            loop_on,
            loop_start,
            loop_end,
        );
        self.set_playhead(new_tick);
        new_tick
    }

    // Loop region ---------------------------------------------------------

    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.loop_marker.enabled = enabled;
        self.loop_marker.visible = enabled;
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_marker.enabled
    }

    pub fn set_loop_range(&mut self, start: Tick, end: Tick) {
        self.loop_marker.set_tick_range(start, end);
    }

    pub fn loop_range(&self) -> (Tick, Tick) {
        self.loop_marker.tick_range()
    }

    // Clip bounds ---------------------------------------------------------

    pub fn set_clip_bounds(&mut self, start: Tick, end: Tick) {
        let (mut start, mut end) = if end < start { (end, start) } else { (start, end) };
        let min_length = Tick::from(self.coords.ticks_per_beat());
        if end < start + min_length {
            end = start + min_length;
        }
        self.clip_start_tick = start;
        self.clip_end_tick = end;
    }

    pub fn clip_bounds(&self) -> (Tick, Tick) {
        (self.clip_start_tick, self.clip_end_tick)
    }

    /// Keep ticks-per-beat consistent across the coordinate system, snap
    /// engine, and bar-relative defaults.
    pub fn set_ticks_per_beat(&mut self, ticks: i32) {
        if ticks <= 0 {
            return;
        }
        self.coords.set_ticks_per_beat(ticks);
        self.grid.set_ticks_per_beat(ticks);
        self.clip_end_tick = Tick::from(self.config.default_clip_bars)
            * Tick::from(self.config.beats_per_measure)
            * Tick::from(ticks);
    }

    // Queries --------------------------------------------------------------

    pub fn hovered_note(&self) -> Option<(NoteId, HoverEdge)> {
        self.pointer.hover_state()
    }

    pub fn hovered_note_world(&self) -> Option<(f64, f64, f64, f64, HoverEdge)> {
        self.pointer.hovered_note_world(&self.store, &self.coords)
    }

    pub fn is_dragging_note(&self) -> bool {
        self.pointer.is_dragging_note()
    }

    pub fn is_resizing_note(&self) -> bool {
        self.pointer.is_resizing_note()
    }

    pub fn is_duplicating_notes(&self) -> bool {
        self.pointer.is_duplicating()
    }

    pub fn snap_info(&self) -> String {
        self.grid.snap_info()
    }

    pub fn visible_ticks(&self) -> (Tick, Tick) {
        self.coords.visible_tick_range()
    }

    pub fn visible_keys(&self) -> (MidiKey, MidiKey) {
        self.coords.visible_key_range()
    }

    pub fn set_show_debug_crosshair(&mut self, enabled: bool) {
        self.show_debug_crosshair = enabled;
    }

    /// Min/max tick and key of the selection, or None when nothing is
    /// selected.
    pub fn selection_bounds(&self) -> Option<(Tick, Tick, MidiKey, MidiKey)> {
        let mut bounds: Option<(Tick, Tick, MidiKey, MidiKey)> = None;
        for n in self.store.notes().iter().filter(|n| n.selected) {
            bounds = Some(match bounds {
                None => (n.tick, n.end_tick(), n.key, n.key),
                Some((min_t, max_t, min_k, max_k)) => (
                    min_t.min(n.tick),
                    max_t.max(n.end_tick()),
                    min_k.min(n.key),
                    max_k.max(n.key),
                ),
            });
        }
        bounds
    }

    // Persistence ----------------------------------------------------------

    pub fn save_to(&self, out: &mut impl Write) -> io::Result<()> {
        serialization::serialize(&self.store, &self.cc_lanes, out)
    }

    pub fn load_from(&mut self, input: impl BufRead) -> io::Result<()> {
        serialization::deserialize(&mut self.store, &mut self.cc_lanes, input)?;
        self.active_cc_lane = if self.cc_lanes.is_empty() { None } else { Some(0) };
        Ok(())
    }

    // View fitting ----------------------------------------------------------

    /// Fit the horizontal view to the clip bounds (also the scrollbar
    /// double-click behaviour).
    pub fn fit_view_to_clip(&mut self) {
        let view_width = self.coords.viewport().width;
        let tpb = f64::from(self.coords.ticks_per_beat());

        if self.clip_end_tick > self.clip_start_tick {
            let clip_beats = (self.clip_end_tick - self.clip_start_tick) as f64 / tpb;
            let new_ppb = (view_width / clip_beats).clamp(FIT_MIN_PPB, FIT_MAX_PPB);
            self.coords.set_pixels_per_beat(new_ppb);
            self.coords.viewport_mut().x = self.coords.tick_to_world(self.clip_start_tick);
            self.explored_min_x = self.coords.tick_to_world(self.clip_start_tick);
            self.explored_max_x = self.coords.tick_to_world(self.clip_end_tick);
        } else {
            self.coords.set_pixels_per_beat(60.0);
            self.coords.viewport_mut().x = 0.0;
            self.explored_min_x = 0.0;
            self.explored_max_x = view_width;
        }

        self.scrollbar
            .set_explored_area(self.explored_min_x, self.explored_max_x);
        self.sync_scrollbar();
    }

    /// Zoom and scroll so the selection fits with a little padding.
    pub fn fit_view_to_selection(&mut self) {
        let Some((min_tick, max_tick, min_key, max_key)) = self.selection_bounds() else {
            return;
        };

        let view_width = self.coords.viewport().width;
        let view_height = self.coords.viewport().height;
        if view_width <= 0.0 || view_height <= 0.0 {
            return;
        }
        let horizontal_padding = view_width * 0.05;

        let min_x = self.coords.tick_to_world(min_tick);
        let max_x = self.coords.tick_to_world(max_tick);
        let span = (max_x - min_x + 2.0 * horizontal_padding).max(1.0);
        self.coords.set_pixels_per_beat(
            (self.coords.pixels_per_beat() * view_width / span)
                .clamp(MIN_PIXELS_PER_BEAT, MAX_PIXELS_PER_BEAT),
        );

        // Recompute with the new zoom.
        let target_left = self.coords.tick_to_world(min_tick) - horizontal_padding;

        let top_y = self.coords.key_to_world_y(max_key);
        let bottom_y = self.coords.key_to_world_y(min_key) + self.coords.key_height();
        let center_y = (top_y + bottom_y) * 0.5;

        self.coords.set_scroll(target_left, center_y - view_height * 0.5);
        self.expand_explored_area(target_left);
        self.sync_scrollbar();
    }

    // Frame entry ----------------------------------------------------------

    /// Draw one frame and process input. Returns the events produced this
    /// frame (ruler playhead clicks, marker drags, piano key presses).
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Vec<PianoRollEvent> {
        let avail = ui.available_rect_before_wrap();
        if avail.width() <= 0.0 || avail.height() <= 0.0 {
            return std::mem::take(&mut self.events);
        }

        // Fit the viewport to the canvas.
        let grid_width = (f64::from(avail.width()) - self.coords.piano_key_width()).max(100.0);
        {
            let vp = self.coords.viewport_mut();
            vp.width = grid_width;
            vp.height = f64::from(avail.height());
        }
        let canvas = Rect::from_min_size(
            avail.min,
            egui::vec2(
                (self.coords.piano_key_width() + grid_width) as f32,
                avail.height(),
            ),
        );
        let response = ui.allocate_rect(canvas, egui::Sense::click_and_drag());

        self.update_explored_area_for_notes();
        self.sync_scrollbar();

        let painter = ui.painter_at(canvas);
        renderer::render(
            &painter,
            canvas,
            &self.coords,
            &self.store,
            &self.grid,
            &self.theme,
            self.playhead,
        );

        self.auto_scroll_playhead();

        self.draw_note_name_column(&painter, canvas);

        self.loop_marker
            .set_layout(self.config.top_padding, self.config.ruler_height);
        self.loop_marker.update_bounds_from_ticks(&self.coords);
        self.loop_marker
            .render_themed(&painter, canvas.min, &self.coords, &self.theme);

        self.draw_ruler_decorations(&painter, canvas);
        self.scrollbar.render_at(&painter, canvas.min, &self.theme);

        // Input: pointer first, then keyboard.
        let input = Self::gather_pointer_input(ui, &response, canvas);
        self.route_pointer(&input);
        self.handle_keyboard(ui);

        overlay::render_overlay(
            &painter,
            canvas,
            &self.store,
            &self.pointer,
            &self.coords,
            &self.theme,
        );

        if self.config.show_cc_lane {
            if let Some(index) = self.active_cc_lane {
                if let Some(lane) = self.cc_lanes.get(index) {
                    cc_lane::render_cc_lane(
                        &painter,
                        canvas,
                        &self.coords,
                        lane,
                        self.config.cc_lane_height,
                        &self.theme,
                    );
                }
            }
        }

        self.draw_debug_overlays(&painter, canvas);

        std::mem::take(&mut self.events)
    }

    fn gather_pointer_input(ui: &egui::Ui, response: &egui::Response, canvas: Rect) -> PointerInput {
        let hover_pos = response
            .hover_pos()
            .or_else(|| ui.input(|i| i.pointer.latest_pos()));
        let inside = hover_pos.is_some_and(|p| canvas.contains(p));
        let (x, y) = hover_pos
            .map(|p| (p.x - canvas.min.x, p.y - canvas.min.y))
            .unwrap_or((0.0, 0.0));

        let (pressed, down, released, mods, scroll_y) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.modifiers,
                i.raw_scroll_delta.y,
            )
        });

        PointerInput {
            x,
            y,
            inside,
            pressed,
            down,
            released,
            double_clicked: response.double_clicked(),
            wheel_notches: scroll_y / WHEEL_SCROLL_SPEED as f32,
            mods: ModifierKeys {
                shift: mods.shift,
                ctrl: mods.ctrl || mods.command,
                alt: mods.alt,
            },
        }
    }

    /// Gesture arbitration for one frame of pointer state. Priority order:
    /// active marker drag, active loop drag, ruler press (markers, loop,
    /// then latent pan/zoom), note-name press, scrollbar, active ruler and
    /// note-name gestures, CC lane, grid pointer with edge scrolling.
    pub(crate) fn route_pointer(&mut self, input: &PointerInput) {
        if !input.inside {
            return;
        }
        let local_x = f64::from(input.x);
        let local_y = f64::from(input.y);
        let mods = input.mods;

        let total_height = self.coords.viewport().height;
        let lane_height = f64::from(resolve_lane_height(
            self.config.cc_lane_height,
            total_height as f32,
        ));
        let lane_top_local = total_height - lane_height;
        let in_cc_lane =
            self.config.show_cc_lane && local_y >= lane_top_local && local_y <= total_height;

        // Mouse wheel scrolls vertically only.
        if input.wheel_notches != 0.0 {
            let new_y =
                self.coords.viewport().y - f64::from(input.wheel_notches) * WHEEL_SCROLL_SPEED;
            self.coords.set_scroll(self.coords.viewport().x, new_y);
        }

        self.debug_mouse = Some((input.x, input.y));

        // 1. An active playback-marker drag consumes the frame.
        if self.dragging_playback_start || self.dragging_cue_left || self.dragging_cue_right {
            self.drag_playback_markers(input, local_x, mods);
            return;
        }

        let ruler_top = f64::from(self.config.top_padding);
        let ruler_bottom = ruler_top + f64::from(self.config.ruler_height);
        let in_ruler = local_x >= self.coords.piano_key_width()
            && local_y >= ruler_top
            && local_y <= ruler_bottom;

        // Loop marker hover bookkeeping.
        if in_ruler && self.loop_marker.enabled && self.loop_marker.visible {
            self.loop_marker.hover(&self.coords, local_x, local_y);
        } else {
            self.loop_marker.reset_hover();
        }

        // 2. An active loop drag/resize consumes the frame.
        if self.loop_marker.is_active() {
            if input.down {
                self.loop_marker.drag(&self.coords, local_x, local_y);
            }
            if input.released {
                self.loop_marker.mouse_up(&self.coords);
            }
            return;
        }

        // 3. Ruler press: playback markers first, then the loop region, then
        // a latent pan-or-zoom gesture.
        if input.pressed && in_ruler {
            if self.try_capture_marker(local_x) {
                return;
            }
            if self.loop_marker.mouse_down(&self.coords, local_x, local_y) {
                return;
            }
            self.ruler_gesture = RulerGesture {
                active: true,
                start_x: local_x,
                start_viewport_x: self.coords.viewport().x,
                initial_x: local_x,
                initial_y: local_y,
                zoom_start_ppb: self.coords.pixels_per_beat(),
                ..RulerGesture::default()
            };
        }

        // 4. Note-name column press: latent vertical pan-or-zoom.
        if input.pressed
            && local_x >= 0.0
            && local_x <= f64::from(self.config.note_label_width)
            && local_y >= ruler_bottom
        {
            self.note_names_gesture = NoteNamesGesture {
                active: true,
                start_y: local_y,
                start_viewport_y: self.coords.viewport().y,
                initial_x: local_x,
                initial_y: local_y,
                zoom_start_x: local_x,
                zoom_start_ppk: self.coords.key_height(),
                anchor_y: local_y,
                ..NoteNamesGesture::default()
            };
        }

        // 5. Scrollbar events, forwarded unconditionally. When the scrollbar
        // takes the press or is mid-interaction it consumes grid routing.
        let mut scrollbar_consumed = self.scrollbar.is_active();
        if let Some(event) = self.scrollbar.on_mouse_move(local_x, local_y) {
            self.apply_scrollbar_event(event);
            scrollbar_consumed = true;
        }
        if input.pressed {
            if let Some(event) = self.scrollbar.on_mouse_down(local_x, local_y) {
                self.apply_scrollbar_event(event);
                scrollbar_consumed = true;
            }
            scrollbar_consumed |= self.scrollbar.is_active();
        }
        if input.released {
            if let Some(event) = self.scrollbar.on_mouse_up(local_x, local_y) {
                self.apply_scrollbar_event(event);
            }
        }

        // 6. Active ruler gesture: pan if the motion is mostly horizontal,
        // zoom (anchored at the initial beat) if mostly vertical.
        if self.ruler_gesture.active {
            if input.down {
                self.update_ruler_gesture(local_x, local_y);
            }
            if input.released {
                if !self.ruler_gesture.pan && !self.ruler_gesture.zoom && in_ruler {
                    // A plain ruler click moves the playhead.
                    let (world_x, _) = self.coords.screen_to_world(local_x, 0.0);
                    let tick = self.coords.world_to_tick(world_x);
                    self.set_playhead(tick);
                }
                self.ruler_gesture = RulerGesture::default();
            }
        }

        // 7. Active note-name gesture: vertical pan (inverted) or key zoom.
        if self.note_names_gesture.active {
            if input.down {
                self.update_note_names_gesture(local_x, local_y);
            }
            if input.released {
                self.note_names_gesture = NoteNamesGesture::default();
            }
        }

        self.update_piano_key_state(input, local_x, local_y, ruler_bottom, lane_top_local);
        if input.pressed {
            self.update_last_clicked_cell(local_x, local_y, ruler_bottom, lane_top_local);
        }

        if self.ruler_gesture.active || self.note_names_gesture.active || scrollbar_consumed {
            return;
        }

        // 8 and 9. CC lane, then the grid pointer controller with edge
        // scrolling during rectangle selection. Releases are forwarded
        // regardless of area so in-flight gestures always terminate.
        let in_grid =
            local_x >= self.coords.piano_key_width() && local_y >= ruler_bottom && !in_cc_lane;
        if input.pressed && in_grid {
            self.pointer
                .on_mouse_down(&mut self.store, &self.coords, local_x, local_y, mods);
        }
        if input.released {
            self.pointer
                .on_mouse_up(&mut self.store, &self.coords, local_x, local_y, mods);
            if !in_cc_lane {
                self.cc_dragging = false;
                self.cc_drag_index = None;
            }
        }

        if in_cc_lane {
            if self.active_cc_lane.is_some() {
                self.handle_cc_pointer(input, local_x, local_y, lane_top_local, total_height, mods);
            }
            return;
        }

        if input.down {
            if self.pointer.has_selection_rectangle() {
                self.check_rectangle_edge_scrolling(local_x, local_y);
            }
            self.pointer.on_mouse_move(
                &mut self.store,
                &self.coords,
                &self.grid,
                local_x,
                local_y,
                mods,
            );
        }
        if input.double_clicked && in_grid {
            self.pointer.on_double_click(
                &mut self.store,
                &self.coords,
                &self.grid,
                local_x,
                local_y,
                mods,
            );
        }
    }

    // Gesture helpers ------------------------------------------------------

    fn drag_playback_markers(&mut self, input: &PointerInput, local_x: f64, mods: ModifierKeys) {
        if input.down {
            let (world_x, _) = self.coords.screen_to_world(local_x, 0.0);
            let raw = self.coords.world_to_tick(world_x);
            let tick = if mods.shift {
                raw
            } else {
                self.grid.snap_tick(raw, None)
            };

            if self.dragging_playback_start {
                self.playback_start_tick = tick.max(0);
            } else if self.dragging_cue_left {
                self.cue_left_tick = tick;
                if self.cue_right_tick < self.cue_left_tick {
                    self.cue_right_tick = self.cue_left_tick;
                }
            } else if self.dragging_cue_right {
                self.cue_right_tick = tick;
                if self.cue_right_tick < self.cue_left_tick {
                    self.cue_left_tick = self.cue_right_tick;
                }
            }
        }
        if input.released {
            self.dragging_playback_start = false;
            self.dragging_cue_left = false;
            self.dragging_cue_right = false;
            self.push_markers_changed();
        }
    }

    fn try_capture_marker(&mut self, local_x: f64) -> bool {
        if self.show_playback_start_marker {
            if let Some(x) = self.marker_local_x(self.playback_start_tick) {
                if (local_x - x).abs() <= MARKER_HIT_PX {
                    self.dragging_playback_start = true;
                    return true;
                }
            }
        }
        if self.show_cue_markers {
            if let Some(x) = self.marker_local_x(self.cue_left_tick) {
                if (local_x - x).abs() <= MARKER_HIT_PX {
                    self.dragging_cue_left = true;
                    return true;
                }
            }
            if let Some(x) = self.marker_local_x(self.cue_right_tick) {
                if (local_x - x).abs() <= MARKER_HIT_PX {
                    self.dragging_cue_right = true;
                    return true;
                }
            }
        }
        false
    }

    fn update_ruler_gesture(&mut self, local_x: f64, local_y: f64) {
        let g = &mut self.ruler_gesture;
        if !g.pan && !g.zoom {
            let dx = (local_x - g.initial_x).abs();
            let dy = (local_y - g.initial_y).abs();
            if dx > GESTURE_START_THRESHOLD || dy > GESTURE_START_THRESHOLD {
                if dx > dy * GESTURE_AXIS_RATIO {
                    g.pan = true;
                } else {
                    g.zoom = true;
                    g.zoom_anchor_x = g.initial_x;
                    g.zoom_start_y = g.initial_y;
                }
            }
        }

        if self.ruler_gesture.pan {
            // Dragging left moves the view right.
            let delta_x = -(local_x - self.ruler_gesture.start_x);
            let new_viewport_x = self.ruler_gesture.start_viewport_x + delta_x;
            self.coords.set_scroll(new_viewport_x, self.coords.viewport().y);
            self.expand_explored_area(new_viewport_x);
            self.ruler_gesture.start_x = local_x;
            self.ruler_gesture.start_viewport_x = self.coords.viewport().x;
        } else if self.ruler_gesture.zoom {
            // Vertical motion maps to horizontal zoom, anchored so the beat
            // under the initial press stays under the pointer.
            let delta_y = local_y - self.ruler_gesture.zoom_start_y;
            let factor = 1.0 + delta_y * crate::constants::ZOOM_DRAG_SENSITIVITY;
            let new_ppb = (self.ruler_gesture.zoom_start_ppb * factor)
                .clamp(MIN_PIXELS_PER_BEAT, MAX_PIXELS_PER_BEAT);

            let old_ppb = self.coords.pixels_per_beat();
            let old_viewport_x = self.coords.viewport().x;
            let mouse_x_in_view = self.ruler_gesture.zoom_anchor_x - self.coords.piano_key_width();
            let beats_under_mouse = (old_viewport_x + mouse_x_in_view) / old_ppb;

            self.coords.set_pixels_per_beat(new_ppb);
            let new_viewport_x = beats_under_mouse * new_ppb - mouse_x_in_view;
            self.coords.set_scroll(new_viewport_x, self.coords.viewport().y);
            self.expand_explored_area(new_viewport_x);
        }
    }

    fn update_note_names_gesture(&mut self, local_x: f64, local_y: f64) {
        let g = &mut self.note_names_gesture;
        if !g.pan && !g.zoom {
            let dx = (local_x - g.initial_x).abs();
            let dy = (local_y - g.initial_y).abs();
            if dx > GESTURE_START_THRESHOLD || dy > GESTURE_START_THRESHOLD {
                if dy > dx * GESTURE_AXIS_RATIO {
                    g.pan = true;
                } else {
                    g.zoom = true;
                    g.zoom_start_x = g.initial_x;
                    g.zoom_start_ppk = self.coords.key_height();
                }
            }
        }

        if self.note_names_gesture.pan {
            // Inverted: dragging down scrolls the view up.
            let delta_y = -(local_y - self.note_names_gesture.start_y);
            let new_viewport_y = self.note_names_gesture.start_viewport_y + delta_y;
            self.coords.set_scroll(self.coords.viewport().x, new_viewport_y);
            self.note_names_gesture.start_y = local_y;
            self.note_names_gesture.start_viewport_y = self.coords.viewport().y;
        } else if self.note_names_gesture.zoom {
            let delta_x = local_x - self.note_names_gesture.zoom_start_x;
            let factor = 1.0 + delta_x * crate::constants::ZOOM_DRAG_SENSITIVITY;
            let new_ppk = (self.note_names_gesture.zoom_start_ppk * factor).clamp(
                BASE_KEY_HEIGHT * VERTICAL_ZOOM_MIN_PERCENT,
                BASE_KEY_HEIGHT * VERTICAL_ZOOM_MAX_PERCENT,
            );

            // Keep the key under the initial press at its screen Y.
            let old_ppk = self.coords.key_height();
            let old_viewport_y = self.coords.viewport().y;

            let content_top =
                f64::from(self.config.top_padding) + f64::from(self.config.ruler_height);
            let mut view_height = self.coords.viewport().height
                - content_top
                - f64::from(self.config.footer_height);
            if view_height <= 0.0 {
                view_height = self.coords.viewport().height;
            }

            let anchor_fraction =
                ((self.note_names_gesture.anchor_y - content_top) / view_height).clamp(0.0, 1.0);

            let old_visible_keys = view_height / old_ppk;
            let total_keys = f64::from(self.coords.total_keys());
            let old_top_key = total_keys - 1.0 - old_viewport_y / old_ppk;
            let anchor_key = old_top_key - anchor_fraction * old_visible_keys;

            self.coords.set_key_height(new_ppk);

            let new_visible_keys = view_height / new_ppk;
            let new_top_key = anchor_key + anchor_fraction * new_visible_keys;
            let new_viewport_y = (total_keys - 1.0 - new_top_key) * new_ppk;
            self.coords.set_scroll(self.coords.viewport().x, new_viewport_y);
        }
    }

    fn handle_cc_pointer(
        &mut self,
        input: &PointerInput,
        local_x: f64,
        local_y: f64,
        lane_top: f64,
        lane_bottom: f64,
        mods: ModifierKeys,
    ) {
        let lane_height = lane_bottom - lane_top;
        if lane_height <= 0.0 {
            return;
        }
        let Some(index) = self.active_cc_lane else {
            return;
        };
        if index >= self.cc_lanes.len() {
            return;
        }

        // Vertical position maps to the CC value, 127 at the top.
        let t = ((local_y - lane_top) / lane_height).clamp(0.0, 1.0);
        let cc_value = ((1.0 - t) * 127.0 + 0.5) as i32;

        let (world_x, _) = self.coords.screen_to_world(local_x, 0.0);
        let raw = self.coords.world_to_tick(world_x);
        let tick = if mods.shift {
            raw
        } else {
            self.grid.magnetic_snap(raw, self.coords.pixels_per_beat()).0
        };

        let threshold = Tick::from(self.coords.ticks_per_beat()) / 16;
        let lane = &mut self.cc_lanes[index];

        if input.pressed {
            // Ctrl-click near a point deletes it.
            if mods.ctrl && lane.remove_near(tick, threshold) {
                return;
            }
            if let Some(i) = lane.index_near(tick, threshold) {
                self.cc_dragging = true;
                lane.set_value(i, cc_value);
                self.cc_drag_index = Some(i);
                return;
            }
            lane.add_point(tick, cc_value);
            self.cc_dragging = false;
            self.cc_drag_index = None;
            return;
        }

        if input.down && self.cc_dragging {
            if let Some(i) = self.cc_drag_index {
                lane.set_value(i, cc_value);
                lane.set_tick(i, tick);
                // Re-sorting may have moved the point; follow it.
                self.cc_drag_index = lane.index_near(tick, 0);
            }
        }

        if input.released {
            self.cc_dragging = false;
            self.cc_drag_index = None;
        }
    }

    fn update_piano_key_state(
        &mut self,
        input: &PointerInput,
        local_x: f64,
        local_y: f64,
        ruler_bottom: f64,
        lane_top_local: f64,
    ) {
        let in_keys_x = local_x >= f64::from(self.config.note_label_width)
            && local_x < self.coords.piano_key_width();
        let in_keys_y =
            local_y >= ruler_bottom && (!self.config.show_cc_lane || local_y < lane_top_local);
        let in_keys = in_keys_x && in_keys_y;

        if in_keys {
            let (_, world_y) = self.coords.screen_to_world(local_x, local_y);
            self.hovered_piano_key = Some(self.coords.world_y_to_key(world_y));
        } else {
            self.hovered_piano_key = None;
        }

        if input.pressed {
            if in_keys {
                let key = self.hovered_piano_key.unwrap_or(0);
                self.pressed_piano_key = Some(key);
                self.piano_key_pressed_active = true;
                self.events.push(PianoRollEvent::PianoKeyPressed(key));
            } else {
                self.pressed_piano_key = None;
                self.piano_key_pressed_active = false;
            }
        }

        if input.released && self.piano_key_pressed_active {
            self.piano_key_pressed_active = false;
            if let Some(key) = self.pressed_piano_key.take() {
                self.events.push(PianoRollEvent::PianoKeyReleased(key));
            }
        }
    }

    fn update_last_clicked_cell(
        &mut self,
        local_x: f64,
        local_y: f64,
        ruler_bottom: f64,
        lane_top_local: f64,
    ) {
        let in_grid_x = local_x >= self.coords.piano_key_width();
        let in_grid_y =
            local_y >= ruler_bottom && (!self.config.show_cc_lane || local_y < lane_top_local);
        if !(in_grid_x && in_grid_y) {
            self.last_clicked_cell = None;
            return;
        }

        let (world_x, world_y) = self.coords.screen_to_world(local_x, local_y);
        let beat_number = world_x / self.coords.pixels_per_beat();
        let beat = if beat_number >= 0.0 { beat_number as i64 } else { 0 };
        let tick_start = beat * Tick::from(self.coords.ticks_per_beat());
        let tick_end = tick_start + Tick::from(self.coords.ticks_per_beat());
        let key = self.coords.world_y_to_key(world_y);
        self.last_clicked_cell = Some((tick_start, tick_end, key));
    }

    fn check_rectangle_edge_scrolling(&mut self, local_x: f64, local_y: f64) -> bool {
        let vp = self.coords.viewport();
        let widget_width = self.coords.piano_key_width() + vp.width;
        let widget_height = vp.height;

        let left_edge = self.coords.piano_key_width() + EDGE_SCROLL_MARGIN;
        let right_edge = widget_width - EDGE_SCROLL_MARGIN;
        let top_edge = f64::from(self.config.top_padding)
            + f64::from(self.config.ruler_height)
            + EDGE_SCROLL_MARGIN;
        let bottom_edge = widget_height
            - f64::from(self.config.footer_height)
            - f64::from(self.scrollbar.track_size)
            - EDGE_SCROLL_MARGIN;

        let speed = |distance: f64| {
            (EDGE_SCROLL_BASE_SPEED + distance / 20.0 * 30.0).min(EDGE_SCROLL_MAX_SPEED)
        };

        let mut h_scroll = 0.0;
        let mut v_scroll = 0.0;
        if local_x < left_edge {
            h_scroll = -speed(left_edge - local_x);
        } else if local_x > right_edge {
            h_scroll = speed(local_x - right_edge);
        }
        if local_y < top_edge {
            v_scroll = -speed(top_edge - local_y);
        } else if local_y > bottom_edge {
            v_scroll = speed(local_y - bottom_edge);
        }

        if h_scroll == 0.0 && v_scroll == 0.0 {
            return false;
        }
        let new_x = self.coords.viewport().x + h_scroll;
        let new_y = self.coords.viewport().y + v_scroll;
        self.coords.set_scroll(new_x, new_y);
        self.expand_explored_area(new_x);
        self.sync_scrollbar();
        true
    }

    // Scrollbar plumbing ---------------------------------------------------

    fn apply_scrollbar_event(&mut self, event: ScrollbarEvent) {
        match event {
            ScrollbarEvent::Scroll(position) => {
                // Unclamped on purpose: negative world X is legal.
                self.coords.viewport_mut().x = position;
                self.expand_explored_area(position);
            }
            ScrollbarEvent::EdgeResize { left_edge } => {
                self.handle_scrollbar_edge_resize(left_edge);
            }
            ScrollbarEvent::DoubleClick => self.fit_view_to_clip(),
            ScrollbarEvent::DragEnd => self.sync_scrollbar(),
        }
    }

    /// Thumb edge drags re-zoom so the viewport-to-explored ratio matches
    /// the new thumb ratio, anchored at the thumb's opposite edge, and then
    /// re-derive the explored area from the new geometry.
    fn handle_scrollbar_edge_resize(&mut self, left_edge: bool) {
        let (Some(manual_pos), Some(manual_size)) = (
            self.scrollbar.manual_thumb_pos(),
            self.scrollbar.manual_thumb_size(),
        ) else {
            return;
        };
        let (track_x, _) = self.scrollbar.track_pos();
        let (track_width, _) = self.scrollbar.track_px();
        let thumb_x_relative = manual_pos.0 - track_x;
        let thumb_width = manual_size.0;
        if track_width <= 0.0 || thumb_width <= 0.0 {
            return;
        }

        let thumb_ratio = thumb_width / track_width;
        let screen_width = self.coords.viewport().width;
        let old_scroll_x = self.coords.viewport().x;
        let old_ppb = self.coords.pixels_per_beat().max(1e-6);
        let tpb = f64::from(self.coords.ticks_per_beat());

        let explored_min_tick = self.explored_min_x / old_ppb * tpb;
        let explored_max_tick = self.explored_max_x / old_ppb * tpb;
        let explored_tick_span = (explored_max_tick - explored_min_tick).max(1e-6);

        let new_viewport_tick_span = (thumb_ratio * explored_tick_span).max(1e-6);
        let new_ppb = (screen_width * tpb / new_viewport_tick_span)
            .clamp(EDGE_ZOOM_MIN_PPB, EDGE_ZOOM_MAX_PPB);

        // Dragging the left edge anchors the right side of the view and
        // vice versa.
        let anchor_screen_x = if left_edge { screen_width } else { 0.0 };
        let anchor_tick = (old_scroll_x + anchor_screen_x) / old_ppb * tpb;

        self.coords.set_pixels_per_beat(new_ppb);
        let new_scroll_x = anchor_tick / tpb * new_ppb - anchor_screen_x;

        // No clamping here; the explored area expands instead.
        self.expand_explored_area(new_scroll_x);
        self.coords.viewport_mut().x = new_scroll_x;

        let explored_range_new = screen_width / thumb_ratio.max(1e-6);
        let available = (track_width - thumb_width).max(1.0);
        let scroll_norm = (thumb_x_relative / available).clamp(0.0, 1.0);
        self.explored_min_x = new_scroll_x - scroll_norm * (explored_range_new - screen_width);
        self.explored_max_x = self.explored_min_x + explored_range_new;
        self.scrollbar
            .set_explored_area(self.explored_min_x, self.explored_max_x);
    }

    fn sync_scrollbar(&mut self) {
        let vp = *self.coords.viewport();
        let x = self.coords.piano_key_width();
        let y = vp.height - f64::from(self.scrollbar.track_size);
        self.scrollbar.update_geometry(x, y, vp.width);
        self.scrollbar.set_viewport_size(vp.width);
        self.scrollbar.set_scroll_position(vp.x);
    }

    fn expand_explored_area(&mut self, new_x: f64) {
        let viewport_right = new_x + self.coords.viewport().width;
        if new_x < self.explored_min_x {
            self.explored_min_x = new_x;
        }
        if viewport_right > self.explored_max_x {
            self.explored_max_x = viewport_right;
        }
        self.scrollbar
            .set_explored_area(self.explored_min_x, self.explored_max_x);
    }

    fn update_explored_area_for_notes(&mut self) {
        let mut bounds: Option<(Tick, Tick)> = None;
        for n in self.store.notes() {
            bounds = Some(match bounds {
                None => (n.tick, n.end_tick()),
                Some((lo, hi)) => (lo.min(n.tick), hi.max(n.end_tick())),
            });
        }
        let Some((leftmost, rightmost)) = bounds else {
            return;
        };

        let leftmost_x = self.coords.tick_to_world(leftmost);
        let rightmost_x = self.coords.tick_to_world(rightmost);
        let mut changed = false;
        if leftmost_x < self.explored_min_x {
            self.explored_min_x = leftmost_x;
            changed = true;
        }
        if rightmost_x > self.explored_max_x {
            self.explored_max_x = rightmost_x;
            changed = true;
        }
        if changed {
            self.scrollbar
                .set_explored_area(self.explored_min_x, self.explored_max_x);
        }
    }

    // Keyboard -------------------------------------------------------------

    fn handle_keyboard(&mut self, ui: &mut egui::Ui) {
        use egui::{Key, Modifiers};

        let ctrl = ModifierKeys {
            ctrl: true,
            ..ModifierKeys::default()
        };
        let shift = ModifierKeys {
            shift: true,
            ..ModifierKeys::default()
        };
        let plain = ModifierKeys::default();

        let mut presses: Vec<(EditorKey, ModifierKeys)> = Vec::new();
        ui.input_mut(|i| {
            for (key, logical) in [
                (Key::A, EditorKey::A),
                (Key::C, EditorKey::C),
                (Key::V, EditorKey::V),
                (Key::Z, EditorKey::Z),
                (Key::Y, EditorKey::Y),
            ] {
                if i.consume_key(Modifiers::COMMAND, key) {
                    presses.push((logical, ctrl));
                }
            }
            if i.consume_key(Modifiers::NONE, Key::Delete) {
                presses.push((EditorKey::Delete, plain));
            }
            if i.consume_key(Modifiers::NONE, Key::Backspace) {
                presses.push((EditorKey::Backspace, plain));
            }
            for (key, logical) in [
                (Key::ArrowUp, EditorKey::Up),
                (Key::ArrowDown, EditorKey::Down),
                (Key::ArrowLeft, EditorKey::Left),
                (Key::ArrowRight, EditorKey::Right),
            ] {
                if i.consume_key(Modifiers::SHIFT, key) {
                    presses.push((logical, shift));
                }
                if i.consume_key(Modifiers::NONE, key) {
                    presses.push((logical, plain));
                }
            }
        });

        let mut moved = false;
        for (key, mods) in presses {
            let consumed =
                self.keyboard
                    .on_key_press(&mut self.store, &self.grid, &self.coords, key, mods);
            if consumed
                && matches!(
                    key,
                    EditorKey::Up | EditorKey::Down | EditorKey::Left | EditorKey::Right
                )
            {
                moved = true;
            }
        }
        if moved {
            self.ensure_selected_notes_visible();
        }
    }

    fn ensure_selected_notes_visible(&mut self) {
        let Some((min_tick, max_tick, min_key, max_key)) = self.selection_bounds() else {
            return;
        };

        let min_x = self.coords.tick_to_world(min_tick);
        let max_x = self.coords.tick_to_world(max_tick);
        let top_y = self.coords.key_to_world_y(max_key);
        let bottom_y = self.coords.key_to_world_y(min_key) + self.coords.key_height();

        let vp = *self.coords.viewport();
        let mut new_x = vp.x;
        let mut new_y = vp.y;

        if min_x < vp.x {
            new_x = min_x;
        } else if max_x > vp.x + vp.width {
            new_x = max_x - vp.width;
        }

        if top_y < vp.y {
            new_y = top_y.max(0.0);
        } else if bottom_y > vp.y + vp.height {
            new_y = bottom_y - vp.height;
        }

        if new_x != vp.x || new_y != vp.y {
            self.coords.set_scroll(new_x, new_y);
            self.expand_explored_area(new_x);
            self.sync_scrollbar();
        }
    }

    fn auto_scroll_playhead(&mut self) {
        if !self.config.playhead_auto_scroll {
            return;
        }
        let Some(tick) = self.playhead else {
            return;
        };
        let playhead_x = self.coords.tick_to_world(tick);
        let vp = *self.coords.viewport();
        let margin = f64::from(self.config.playhead_auto_scroll_margin);

        if playhead_x < vp.x + margin {
            let new_x = playhead_x - margin;
            self.coords.set_scroll(new_x, vp.y);
            self.expand_explored_area(new_x);
            self.sync_scrollbar();
        } else if playhead_x > vp.x + vp.width - margin {
            let new_x = playhead_x - vp.width + margin;
            self.coords.set_scroll(new_x, vp.y);
            self.expand_explored_area(new_x);
            self.sync_scrollbar();
        }
    }

    fn marker_local_x(&self, tick: Tick) -> Option<f64> {
        let (sx, _) = self
            .coords
            .world_to_screen(self.coords.tick_to_world(tick), 0.0);
        let grid_left = self.coords.piano_key_width();
        let grid_right = grid_left + self.coords.viewport().width;
        (sx >= grid_left && sx <= grid_right).then_some(sx)
    }

    fn push_markers_changed(&mut self) {
        self.events.push(PianoRollEvent::PlaybackMarkersChanged {
            start: self.playback_start_tick,
            cue_left: self.cue_left_tick,
            cue_right: self.cue_right_tick,
        });
    }

    // Decorations ----------------------------------------------------------

    fn draw_note_name_column(&self, painter: &Painter, canvas: Rect) {
        let view_top =
            canvas.min.y + self.config.top_padding + self.config.ruler_height;
        let view_bottom = canvas.max.y;
        let ppk = self.coords.key_height();

        // Darken the column while a note-name gesture is active.
        if self.note_names_gesture.active {
            let col = Rect::from_min_max(
                Pos2::new(canvas.min.x, view_top),
                Pos2::new(canvas.min.x + self.coords.piano_key_width() as f32, view_bottom),
            );
            painter.rect_filled(col, 0.0, self.theme.black_key_color);
        }

        // Hovered or pressed key highlight across the strip.
        if let Some(key) = self.pressed_piano_key.or(self.hovered_piano_key) {
            let (_, sy1) = self.coords.world_to_screen(0.0, self.coords.key_to_world_y(key));
            let (_, sy2) = self
                .coords
                .world_to_screen(0.0, self.coords.key_to_world_y(key) + ppk);
            let color = if self.pressed_piano_key.is_some() {
                self.theme.piano_key_pressed_color
            } else {
                self.theme.piano_key_hover_color
            };
            painter.rect_filled(
                Rect::from_min_max(
                    Pos2::new(canvas.min.x, canvas.min.y + sy1 as f32),
                    Pos2::new(
                        canvas.min.x + self.coords.piano_key_width() as f32,
                        canvas.min.y + sy2 as f32,
                    ),
                ),
                0.0,
                color,
            );
        }

        let (min_key, max_key) = self.coords.visible_key_range();
        for key in min_key..=max_key {
            let (_, sy1) = self.coords.world_to_screen(0.0, self.coords.key_to_world_y(key));
            let (_, sy2) = self
                .coords
                .world_to_screen(0.0, self.coords.key_to_world_y(key) + ppk);
            let y1 = canvas.min.y + sy1 as f32;
            let y2 = canvas.min.y + sy2 as f32;
            if y2 < view_top || y1 > view_bottom {
                continue;
            }
            let y1 = y1.max(view_top);
            let y2 = y2.min(view_bottom);

            let note_index = key.rem_euclid(12);
            // Label density by row height: everything, C and F, or C only.
            let show = if ppk >= 20.0 {
                true
            } else if ppk >= 12.0 {
                note_index == 0 || note_index == 5
            } else {
                note_index == 0
            };
            if !show {
                continue;
            }

            let padding = 10.0;
            let text_pos = Pos2::new(
                canvas.min.x + self.config.note_label_width - padding,
                (y1 + y2) * 0.5,
            );
            painter.text(
                text_pos,
                Align2::RIGHT_CENTER,
                note_name(key),
                FontId::default(),
                self.theme.note_label_text_color,
            );

            // Octave separator under each C.
            if note_index == 0 {
                let line_y = y2 - 0.5;
                painter.line_segment(
                    [
                        Pos2::new(canvas.min.x, line_y),
                        Pos2::new(canvas.min.x + self.config.note_label_width, line_y),
                    ],
                    Stroke::new(1.0, self.theme.grid_line_color),
                );
            }
        }
    }

    fn draw_ruler_decorations(&self, painter: &Painter, canvas: Rect) {
        let piano_key_width = self.coords.piano_key_width() as f32;
        let ruler_top = canvas.min.y + self.config.top_padding;

        // Highlight the ruler while a pan/zoom gesture is active.
        if self.ruler_gesture.active {
            painter.rect_filled(
                Rect::from_min_max(
                    Pos2::new(canvas.min.x + piano_key_width, ruler_top),
                    Pos2::new(
                        canvas.min.x + piano_key_width + self.coords.viewport().width as f32,
                        ruler_top + self.config.ruler_height,
                    ),
                ),
                0.0,
                self.theme.ruler_background_color.gamma_multiply(1.3),
            );
        }

        // Playback start marker: triangle plus a line through the ruler.
        if self.show_playback_start_marker {
            if let Some(x) = self.marker_local_x(self.playback_start_tick) {
                let x = canvas.min.x + x as f32;
                let marker_y = ruler_top + 8.0;
                let size = 10.0;
                painter.add(egui::Shape::convex_polygon(
                    vec![
                        Pos2::new(x, marker_y - size * 1.5),
                        Pos2::new(x, marker_y - size * 0.5),
                        Pos2::new(x + size * 0.866, marker_y - size),
                    ],
                    self.theme.playback_start_marker_color,
                    Stroke::NONE,
                ));
                painter.line_segment(
                    [
                        Pos2::new(x, ruler_top),
                        Pos2::new(x, ruler_top + self.config.ruler_height),
                    ],
                    Stroke::new(1.0, self.theme.playback_start_marker_color),
                );
            }
        }

        // Cue markers: inward-pointing triangles in the lower ruler band.
        if self.show_cue_markers && self.cue_right_tick > self.cue_left_tick {
            let marker_y = ruler_top + self.config.ruler_height * 0.65 + 8.0;
            let size = 14.0;
            for (tick, inward) in [(self.cue_left_tick, 1.0), (self.cue_right_tick, -1.0)] {
                if let Some(x) = self.marker_local_x(tick) {
                    let x = canvas.min.x + x as f32;
                    painter.add(egui::Shape::convex_polygon(
                        vec![
                            Pos2::new(x, marker_y - size * 0.5),
                            Pos2::new(x, marker_y + size * 0.5),
                            Pos2::new(x + inward * size, marker_y),
                        ],
                        self.theme.cue_marker_color,
                        Stroke::NONE,
                    ));
                }
            }
        }

        // Clip boundary brackets.
        if self.clip_end_tick > self.clip_start_tick {
            for (tick, is_start) in [(self.clip_start_tick, true), (self.clip_end_tick, false)] {
                if let Some(x) = self.marker_local_x(tick) {
                    let x = canvas.min.x + x as f32;
                    let stroke = Stroke::new(2.0, self.theme.ruler_clip_boundary_color);
                    painter.line_segment(
                        [Pos2::new(x, ruler_top), Pos2::new(x, ruler_top + 8.0)],
                        stroke,
                    );
                    let foot = if is_start { x + 5.0 } else { x - 5.0 };
                    painter.line_segment(
                        [Pos2::new(x, ruler_top), Pos2::new(foot, ruler_top)],
                        stroke,
                    );
                }
            }
        }
    }

    fn draw_debug_overlays(&self, painter: &Painter, canvas: Rect) {
        if let Some((t1, t2, key)) = self.last_clicked_cell {
            let (sx1, sy1) = self.coords.world_to_screen(
                self.coords.tick_to_world(t1),
                self.coords.key_to_world_y(key),
            );
            let (sx2, sy2) = self.coords.world_to_screen(
                self.coords.tick_to_world(t2),
                self.coords.key_to_world_y(key) + self.coords.key_height(),
            );

            let grid_left = canvas.min.x + self.coords.piano_key_width() as f32;
            let grid_top = canvas.min.y + self.config.top_padding + self.config.ruler_height;
            let x1 = (canvas.min.x + sx1 as f32).max(grid_left);
            let x2 = (canvas.min.x + sx2 as f32).min(canvas.max.x);
            let y1 = (canvas.min.y + sy1 as f32).max(grid_top);
            let y2 = (canvas.min.y + sy2 as f32).min(canvas.max.y);
            if x2 > x1 && y2 > y1 {
                painter.rect_filled(
                    Rect::from_min_max(Pos2::new(x1, y1), Pos2::new(x2, y2)),
                    0.0,
                    egui::Color32::from_rgba_unmultiplied(255, 255, 255, 51),
                );
            }
        }

        if self.show_debug_crosshair {
            if let Some((mx, _)) = self.debug_mouse {
                let x = canvas.min.x + mx;
                painter.line_segment(
                    [Pos2::new(x, canvas.min.y), Pos2::new(x, canvas.max.y)],
                    Stroke::new(1.0, egui::Color32::WHITE),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SnapMode;

    fn widget() -> PianoRollWidget {
        let mut w = PianoRollWidget::new();
        // A predictable view: 800x400 grid, origin at tick 0, top row key 127.
        w.coords.set_scroll(0.0, 0.0);
        w.sync_scrollbar();
        w.events.clear();
        w
    }

    fn frame(x: f64, y: f64) -> PointerInput {
        PointerInput {
            x: x as f32,
            y: y as f32,
            inside: true,
            ..PointerInput::default()
        }
    }

    fn press(x: f64, y: f64) -> PointerInput {
        PointerInput {
            pressed: true,
            down: true,
            ..frame(x, y)
        }
    }

    fn drag(x: f64, y: f64) -> PointerInput {
        PointerInput {
            down: true,
            ..frame(x, y)
        }
    }

    fn release(x: f64, y: f64) -> PointerInput {
        PointerInput {
            released: true,
            ..frame(x, y)
        }
    }

    #[test]
    fn playback_marker_drag_beats_ruler_pan() {
        let mut w = widget();
        w.set_playback_start_tick(960); // world x 120, screen x 300
        w.events.clear();

        w.route_pointer(&press(300.0, 10.0));
        assert!(w.dragging_playback_start);
        assert!(!w.ruler_gesture.active);

        // Dragging moves only the marker; the viewport stays put.
        w.route_pointer(&drag(350.0, 12.0));
        assert_eq!(w.coords.viewport().x, 0.0);
        // World 170 is tick 1360, snapped to the quarter grid at 1440.
        assert_eq!(w.playback_start_tick(), 1440);

        w.route_pointer(&release(350.0, 12.0));
        assert!(!w.dragging_playback_start);
        assert!(w
            .events
            .iter()
            .any(|e| matches!(e, PianoRollEvent::PlaybackMarkersChanged { start: 1440, .. })));
    }

    #[test]
    fn shift_disables_marker_snap() {
        let mut w = widget();
        w.set_playback_start_tick(960);
        w.route_pointer(&press(300.0, 10.0));

        let mut move_input = drag(350.0, 12.0);
        move_input.mods.shift = true;
        w.route_pointer(&move_input);
        assert_eq!(w.playback_start_tick(), 1360);
    }

    #[test]
    fn ruler_click_sets_playhead() {
        let mut w = widget();
        w.route_pointer(&press(400.0, 10.0));
        assert!(w.ruler_gesture.active);
        w.route_pointer(&release(400.0, 10.0));

        // World 220 at 60 ppb is tick 1760.
        assert_eq!(w.playhead_tick(), 1760);
        assert!(w
            .events
            .iter()
            .any(|e| matches!(e, PianoRollEvent::PlayheadChanged(1760))));
        assert!(!w.ruler_gesture.active);
    }

    #[test]
    fn ruler_pan_moves_view_right_when_dragging_left() {
        let mut w = widget();
        w.route_pointer(&press(400.0, 10.0));
        w.route_pointer(&drag(350.0, 11.0));

        assert!(w.ruler_gesture.pan);
        assert_eq!(w.coords.viewport().x, 50.0);
        // The explored area grew to cover the shifted viewport.
        assert!(w.explored_max_x >= 50.0 + w.coords.viewport().width);

        w.route_pointer(&release(350.0, 11.0));
        // No playhead change from a recognized pan.
        assert!(w.playhead.is_none());
    }

    #[test]
    fn ruler_zoom_anchors_initial_beat() {
        let mut w = widget();
        w.route_pointer(&press(400.0, 10.0));
        w.route_pointer(&drag(401.0, 50.0));

        assert!(w.ruler_gesture.zoom);
        let ppb = w.coords.pixels_per_beat();
        assert!((ppb - 84.0).abs() < 1e-9);

        // The beat under the initial press keeps its screen column.
        let beats_under_mouse = 220.0 / 60.0;
        let screen_x = beats_under_mouse * ppb - w.coords.viewport().x + w.coords.piano_key_width();
        assert!((screen_x - 400.0).abs() < 1e-6);
    }

    #[test]
    fn note_names_pan_is_inverted() {
        let mut w = widget();
        w.coords.set_scroll(0.0, 500.0);
        w.route_pointer(&press(50.0, 100.0));
        assert!(w.note_names_gesture.active);

        w.route_pointer(&drag(52.0, 160.0));
        assert!(w.note_names_gesture.pan);
        assert_eq!(w.coords.viewport().y, 440.0);

        w.route_pointer(&release(52.0, 160.0));
        assert!(!w.note_names_gesture.active);
    }

    #[test]
    fn note_names_zoom_clamps_key_height() {
        let mut w = widget();
        w.route_pointer(&press(50.0, 100.0));
        // Mostly horizontal motion: vertical zoom.
        w.route_pointer(&drag(150.0, 101.0));
        assert!(w.note_names_gesture.zoom);
        let ppk = w.coords.key_height();
        assert!(ppk <= BASE_KEY_HEIGHT * VERTICAL_ZOOM_MAX_PERCENT + 1e-9);
        assert!(ppk >= BASE_KEY_HEIGHT * VERTICAL_ZOOM_MIN_PERCENT - 1e-9);
    }

    #[test]
    fn wheel_scrolls_vertically_only() {
        let mut w = widget();
        w.coords.set_scroll(120.0, 500.0);
        let mut input = frame(400.0, 200.0);
        input.wheel_notches = -2.0;
        w.route_pointer(&input);
        assert_eq!(w.coords.viewport().y, 560.0);
        assert_eq!(w.coords.viewport().x, 120.0);
    }

    #[test]
    fn grid_press_reaches_pointer_controller() {
        let mut w = widget();
        w.route_pointer(&press(400.0, 200.0));
        assert!(w.pointer.has_selection_rectangle());
        w.route_pointer(&release(400.0, 200.0));
        assert!(!w.pointer.has_selection_rectangle());
    }

    #[test]
    fn ruler_press_does_not_reach_grid() {
        let mut w = widget();
        w.route_pointer(&press(400.0, 10.0));
        assert!(!w.pointer.has_selection_rectangle());
    }

    #[test]
    fn double_click_in_grid_creates_note() {
        let mut w = widget();
        w.snap_mut().set_snap_mode(SnapMode::Off);
        let mut input = frame(400.0, 100.0);
        input.double_clicked = true;
        w.route_pointer(&input);
        assert_eq!(w.notes().len(), 1);
    }

    #[test]
    fn cc_click_adds_point_and_drag_moves_it() {
        let mut w = widget();
        // CC lane occupies the bottom 120 px of the 400 px canvas.
        w.route_pointer(&press(300.0, 340.0));
        assert_eq!(w.cc_lanes()[0].points().len(), 1);
        let p = w.cc_lanes()[0].points()[0];
        // World 120 is tick 960 (already on the adaptive 1/16 grid).
        assert_eq!(p.tick, 960);
        assert_eq!(p.value, 64);

        // Click near the same point starts a drag; moving raises the value.
        w.route_pointer(&release(300.0, 340.0));
        w.route_pointer(&press(300.0, 341.0));
        w.route_pointer(&drag(300.0, 290.0));
        let p = w.cc_lanes()[0].points()[0];
        assert_eq!(w.cc_lanes()[0].points().len(), 1);
        assert!(p.value > 64);
    }

    #[test]
    fn cc_ctrl_click_deletes_point() {
        let mut w = widget();
        w.cc_lanes_mut()[0].add_point(960, 64);
        let mut input = press(300.0, 340.0);
        input.mods.ctrl = true;
        w.route_pointer(&input);
        assert!(w.cc_lanes()[0].points().is_empty());
    }

    #[test]
    fn scrollbar_track_click_consumes_event() {
        let mut w = widget();
        w.set_clip_bounds(0, 4 * 4 * 480);
        // Explore far right so the thumb does not fill the track.
        w.expand_explored_area(3200.0);
        w.sync_scrollbar();
        let thumb = w.scrollbar.thumb_bounds();

        // Click in the track to the right of the thumb, on the track row.
        let y = w.coords.viewport().height - 7.0;
        let x = (thumb.right + 20.0).min(w.coords.piano_key_width() + 790.0);
        // The track lives inside the CC lane band; the scrollbar must win.
        w.route_pointer(&press(x, y));
        assert!(w.coords.viewport().x > 0.0);
        assert!(w.cc_lanes()[0].points().is_empty());
    }

    #[test]
    fn edge_scroll_during_rectangle_selection() {
        let mut w = widget();
        w.snap_mut().set_snap_mode(SnapMode::Off);
        // Start a rectangle in the middle of the grid.
        w.route_pointer(&press(400.0, 150.0));
        assert!(w.pointer.has_selection_rectangle());

        // Drag to the far right edge: the viewport scrolls right.
        let before = w.coords.viewport().x;
        w.route_pointer(&drag(975.0, 150.0));
        assert!(w.coords.viewport().x > before);
        assert!(w.explored_max_x > 800.0);
    }

    #[test]
    fn update_playback_respects_loop_region() {
        let mut w = widget();
        w.set_loop_enabled(true);
        w.set_loop_range(0, 1000);
        let tick = w.update_playback(900, 120.0, 1.0);
        assert_eq!(tick, 860);
        assert_eq!(w.playhead_tick(), 860);
    }

    #[test]
    fn fit_view_to_clip_matches_double_click_policy() {
        let mut w = widget();
        w.set_clip_bounds(0, 4 * 4 * 480); // 16 beats
        w.coords.set_scroll(-500.0, 0.0);
        w.fit_view_to_clip();

        // 800 px / 16 beats = 50 px per beat.
        assert!((w.coords.pixels_per_beat() - 50.0).abs() < 1e-9);
        assert_eq!(w.coords.viewport().x, 0.0);
        assert_eq!(w.explored_min_x, 0.0);
        assert!((w.explored_max_x - 800.0).abs() < 1e-9);
    }

    #[test]
    fn set_ticks_per_beat_keeps_components_in_sync() {
        let mut w = widget();
        w.set_ticks_per_beat(960);
        assert_eq!(w.coords().ticks_per_beat(), 960);
        assert_eq!(w.snap().ticks_per_beat(), 960);
        assert_eq!(w.clip_bounds().1, 4 * 4 * 960);
    }

    #[test]
    fn selection_bounds_cover_extremes() {
        let mut w = widget();
        let a = w.notes_mut().create_note(0, 240, 60, 100, 0, false, false, false);
        let b = w.notes_mut().create_note(960, 480, 72, 100, 0, false, false, false);
        assert!(w.selection_bounds().is_none());

        w.notes_mut().select(a, true);
        w.notes_mut().select(b, true);
        assert_eq!(w.selection_bounds(), Some((0, 1440, 60, 72)));
    }

    #[test]
    fn save_and_load_round_trip_through_widget() {
        let mut w = widget();
        w.notes_mut().create_note(0, 240, 60, 100, 0, false, false, false);
        w.cc_lanes_mut()[0].add_point(480, 90);

        let mut buffer = Vec::new();
        w.save_to(&mut buffer).unwrap();

        let mut restored = widget();
        restored.load_from(std::io::Cursor::new(buffer)).unwrap();
        assert_eq!(restored.notes().len(), 1);
        assert_eq!(restored.cc_lanes().len(), 1);
        assert_eq!(restored.active_cc_lane_index(), Some(0));
    }

    #[test]
    fn marker_setters_normalize_and_notify() {
        let mut w = widget();
        w.set_cue_markers(960, 480);
        assert_eq!(w.cue_markers(), (480, 960));
        assert!(w
            .events
            .iter()
            .any(|e| matches!(e, PianoRollEvent::PlaybackMarkersChanged { .. })));
    }
}
