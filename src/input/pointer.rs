use std::collections::HashSet;

use crate::constants::{DRAG_THRESHOLD_PIXELS, MIN_NOTE_LENGTH_TICKS, NOTE_EDGE_THRESHOLD};
use crate::coords::CoordinateSystem;
use crate::grid::GridSnap;
use crate::model::note::{Duration, MidiKey, NoteId, Tick};
use crate::model::store::NoteStore;

/// Modifier key state for an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierKeys {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Edge classification for hover feedback and resize entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEdge {
    Body,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    DraggingNote,
    ResizingLeft,
    ResizingRight,
    RectangleSelection,
}

/// Pointer state machine for the grid area: hit-test and select, group drag,
/// edge resize, rectangle selection with modifier set algebra, Ctrl-drag
/// duplication, and double-click create/delete. Coordinates are widget-local
/// (the same space `CoordinateSystem::screen_to_world` expects).
#[derive(Debug)]
pub struct PointerController {
    action: Action,
    active_note_id: NoteId,

    // Anchor note state at gesture start.
    initial_tick: Tick,
    initial_duration: Duration,

    // Pointer offset from the anchor's top-left corner, world space.
    drag_offset_world_x: f64,
    drag_offset_world_y: f64,

    // Rectangle selection, world space.
    rect_active: bool,
    rect_start_world: (f64, f64),
    rect_end_world: (f64, f64),
    initial_selection: Vec<NoteId>,

    edge_threshold: f64,
    default_note_duration: Duration,

    enable_ctrl_drag_duplicate: bool,
    is_duplicating: bool,

    // Click-vs-drag disambiguation.
    drag_threshold_pixels: f64,
    pending_click: bool,
    click_start_screen: (f64, f64),
    pending_toggle_on_release: bool,

    hover: Option<(NoteId, HoverEdge)>,
}

impl Default for PointerController {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerController {
    pub fn new() -> Self {
        Self {
            action: Action::None,
            active_note_id: 0,
            initial_tick: 0,
            initial_duration: 0,
            drag_offset_world_x: 0.0,
            drag_offset_world_y: 0.0,
            rect_active: false,
            rect_start_world: (0.0, 0.0),
            rect_end_world: (0.0, 0.0),
            initial_selection: Vec::new(),
            edge_threshold: NOTE_EDGE_THRESHOLD,
            default_note_duration: 480,
            enable_ctrl_drag_duplicate: true,
            is_duplicating: false,
            drag_threshold_pixels: DRAG_THRESHOLD_PIXELS,
            pending_click: false,
            click_start_screen: (0.0, 0.0),
            pending_toggle_on_release: false,
            hover: None,
        }
    }

    pub fn set_edge_threshold_pixels(&mut self, value: f64) {
        self.edge_threshold = value;
    }

    pub fn set_drag_threshold_pixels(&mut self, value: f64) {
        self.drag_threshold_pixels = value;
    }

    pub fn set_default_note_duration(&mut self, duration: Duration) {
        if duration > 0 {
            self.default_note_duration = duration;
        }
    }

    pub fn default_note_duration(&self) -> Duration {
        self.default_note_duration
    }

    /// When enabled, Ctrl-dragging a note duplicates the selection and drags
    /// the duplicates. Disabling it re-arms Ctrl-click toggle on release.
    pub fn set_enable_ctrl_drag_duplicate(&mut self, enabled: bool) {
        self.enable_ctrl_drag_duplicate = enabled;
    }

    pub fn is_dragging_note(&self) -> bool {
        self.action == Action::DraggingNote && !self.pending_click
    }

    pub fn is_resizing_note(&self) -> bool {
        (self.action == Action::ResizingLeft || self.action == Action::ResizingRight)
            && !self.pending_click
    }

    pub fn is_duplicating(&self) -> bool {
        self.is_duplicating
    }

    pub fn hover_state(&self) -> Option<(NoteId, HoverEdge)> {
        self.hover
    }

    pub fn has_selection_rectangle(&self) -> bool {
        self.rect_active
    }

    /// Normalized selection rectangle in world coordinates, if active.
    pub fn selection_rectangle_world(&self) -> Option<(f64, f64, f64, f64)> {
        if !self.rect_active {
            return None;
        }
        let (sx, sy) = self.rect_start_world;
        let (ex, ey) = self.rect_end_world;
        Some((sx.min(ex), sy.min(ey), sx.max(ex), sy.max(ey)))
    }

    /// World-space bounds of the hovered note plus its edge classification.
    pub fn hovered_note_world(
        &self,
        notes: &NoteStore,
        coords: &CoordinateSystem,
    ) -> Option<(f64, f64, f64, f64, HoverEdge)> {
        let (id, edge) = self.hover?;
        let note = notes.find_by_id(id)?;
        let x1 = coords.tick_to_world(note.tick);
        let x2 = coords.tick_to_world(note.end_tick());
        let y1 = coords.key_to_world_y(note.key);
        Some((x1, y1, x2, y1 + coords.key_height(), edge))
    }

    fn apply_snap(
        &self,
        snap: &GridSnap,
        coords: &CoordinateSystem,
        raw_tick: Tick,
        mods: ModifierKeys,
    ) -> Tick {
        // Shift temporarily disables snapping.
        if mods.shift {
            return raw_tick;
        }
        snap.magnetic_snap(raw_tick, coords.pixels_per_beat()).0
    }

    fn classify_edge(&self, coords: &CoordinateSystem, world_x: f64, tick: Tick, end_tick: Tick) -> HoverEdge {
        let x1 = coords.tick_to_world(tick);
        let x2 = coords.tick_to_world(end_tick);
        if (world_x - x1).abs() <= self.edge_threshold {
            HoverEdge::Left
        } else if (world_x - x2).abs() <= self.edge_threshold {
            HoverEdge::Right
        } else {
            HoverEdge::Body
        }
    }

    pub fn on_mouse_down(
        &mut self,
        notes: &mut NoteStore,
        coords: &CoordinateSystem,
        screen_x: f64,
        screen_y: f64,
        mods: ModifierKeys,
    ) {
        self.pending_click = true;
        self.click_start_screen = (screen_x, screen_y);

        let (world_x, world_y) = coords.screen_to_world(screen_x, screen_y);
        let tick = coords.world_to_tick(world_x);
        let key = coords.world_y_to_key(world_y);

        let Some(hit) = notes.note_at(tick, key).copied() else {
            self.begin_rectangle_selection(notes, world_x, world_y);
            return;
        };

        self.active_note_id = hit.id;
        self.initial_tick = hit.tick;
        self.initial_duration = hit.duration;
        self.drag_offset_world_x = world_x - coords.tick_to_world(hit.tick);
        self.drag_offset_world_y = world_y - coords.key_to_world_y(hit.key);

        if !hit.selected {
            if !(mods.ctrl || mods.shift) {
                notes.clear_selection();
            }
            notes.select(hit.id, true);
        } else if mods.ctrl && !self.enable_ctrl_drag_duplicate {
            // Ctrl-click on an already selected note toggles on release,
            // so Ctrl-drags are still distinguishable.
            self.pending_toggle_on_release = true;
        }

        self.is_duplicating = false;
        if self.enable_ctrl_drag_duplicate && mods.ctrl {
            let originals = notes.selected_ids();
            let mut new_ids = Vec::with_capacity(originals.len());
            for id in &originals {
                let Some(src) = notes.find_by_id(*id).copied() else {
                    continue;
                };
                // Duplicates start on top of their originals until dragged
                // away, so overlap must be permitted here.
                let new_id = notes.create_note(
                    src.tick,
                    src.duration,
                    src.key,
                    src.velocity,
                    src.channel,
                    true,
                    false,
                    true,
                );
                if new_id != 0 {
                    if *id == self.active_note_id {
                        self.active_note_id = new_id;
                    }
                    new_ids.push(new_id);
                }
            }
            if !new_ids.is_empty() {
                notes.clear_selection();
                for id in &new_ids {
                    notes.select(*id, true);
                }
                self.is_duplicating = true;
            }
        }

        let Some(anchor) = notes.find_by_id(self.active_note_id) else {
            self.action = Action::None;
            return;
        };

        self.action = match self.classify_edge(coords, world_x, anchor.tick, anchor.end_tick()) {
            HoverEdge::Left => Action::ResizingLeft,
            HoverEdge::Right => Action::ResizingRight,
            HoverEdge::Body => Action::DraggingNote,
        };
        self.rect_active = false;
        self.hover = None;
    }

    pub fn on_mouse_move(
        &mut self,
        notes: &mut NoteStore,
        coords: &CoordinateSystem,
        snap: &GridSnap,
        screen_x: f64,
        screen_y: f64,
        mods: ModifierKeys,
    ) {
        let (world_x, world_y) = coords.screen_to_world(screen_x, screen_y);

        if self.pending_click {
            let dx = (screen_x - self.click_start_screen.0).abs();
            let dy = (screen_y - self.click_start_screen.1).abs();
            if dx <= self.drag_threshold_pixels && dy <= self.drag_threshold_pixels {
                // Within click slop: only hover updates, no action yet.
                self.update_hover(notes, coords, world_x, world_y);
                return;
            }
            self.pending_click = false;
        }

        match self.action {
            Action::None => {
                self.update_hover(notes, coords, world_x, world_y);
            }
            Action::DraggingNote => {
                let Some(anchor) = notes.find_by_id(self.active_note_id).copied() else {
                    return;
                };

                let new_tick = coords.world_to_tick(world_x - self.drag_offset_world_x);
                let new_key = coords.world_y_to_key(world_y - self.drag_offset_world_y);
                let new_tick = self.apply_snap(snap, coords, new_tick, mods);

                let delta_tick = new_tick - anchor.tick;
                let delta_key = new_key - anchor.key;
                if delta_tick == 0 && delta_key == 0 {
                    return;
                }

                // The whole selection moves by the anchor's delta; failed
                // moves skip silently so the group shape survives.
                let mut ids = notes.selected_ids();
                if ids.is_empty() {
                    ids.push(self.active_note_id);
                }
                for id in ids {
                    notes.move_note(id, delta_tick, delta_key, false, false);
                }
            }
            Action::ResizingLeft | Action::ResizingRight => {
                if notes.find_by_id(self.active_note_id).is_none() {
                    return;
                }

                let left_world = coords.tick_to_world(self.initial_tick);
                let right_world = coords.tick_to_world(self.initial_tick + self.initial_duration);

                let (edge_left, edge_right) = if self.action == Action::ResizingLeft {
                    (world_x, right_world)
                } else {
                    (left_world, world_x)
                };

                let mut new_left = self.apply_snap(snap, coords, coords.world_to_tick(edge_left), mods);
                let mut new_right =
                    self.apply_snap(snap, coords, coords.world_to_tick(edge_right), mods);

                if self.action == Action::ResizingLeft {
                    let max_left = self.initial_tick + self.initial_duration - MIN_NOTE_LENGTH_TICKS;
                    new_left = new_left.min(max_left);
                } else {
                    let min_right = self.initial_tick + MIN_NOTE_LENGTH_TICKS;
                    new_right = new_right.max(min_right);
                }
                if new_right <= new_left {
                    return;
                }

                // Resize affects the anchor only; the left edge moves first,
                // then the duration follows.
                let current_tick = notes.find_by_id(self.active_note_id).map(|n| n.tick).unwrap_or(0);
                let delta_tick = new_left - current_tick;
                let new_duration = new_right - new_left;
                notes.move_note(self.active_note_id, delta_tick, 0, false, false);
                notes.resize_note(self.active_note_id, new_duration, false, false);

                // The last resized length becomes the creation default.
                self.default_note_duration = new_duration;
            }
            Action::RectangleSelection => {
                self.rect_end_world = (world_x, world_y);
                self.update_rectangle_selection(notes, coords, mods);
            }
        }
    }

    pub fn on_mouse_up(
        &mut self,
        notes: &mut NoteStore,
        coords: &CoordinateSystem,
        screen_x: f64,
        screen_y: f64,
        mods: ModifierKeys,
    ) {
        // A press that never crossed the drag threshold is a plain click.
        if self.pending_click {
            if self.action == Action::RectangleSelection && !mods.ctrl && !mods.shift && !mods.alt {
                // Empty-space click clears the selection.
                notes.clear_selection();
            }

            if self.pending_toggle_on_release && !self.is_duplicating && mods.ctrl {
                let (world_x, world_y) = coords.screen_to_world(screen_x, screen_y);
                let tick = coords.world_to_tick(world_x);
                let key = coords.world_y_to_key(world_y);
                if let Some(note) = notes.note_at(tick, key).copied() {
                    if note.selected {
                        notes.deselect(note.id);
                    } else {
                        notes.select(note.id, true);
                    }
                }
            }
        }

        self.action = Action::None;
        self.active_note_id = 0;
        self.rect_active = false;
        self.is_duplicating = false;
        self.pending_click = false;
        self.pending_toggle_on_release = false;
    }

    /// Double-click deletes the hit note, or creates one at the snapped tick
    /// with the current default duration.
    pub fn on_double_click(
        &mut self,
        notes: &mut NoteStore,
        coords: &CoordinateSystem,
        snap: &GridSnap,
        screen_x: f64,
        screen_y: f64,
        mods: ModifierKeys,
    ) {
        let (world_x, world_y) = coords.screen_to_world(screen_x, screen_y);
        let tick = coords.world_to_tick(world_x);
        let key = coords.world_y_to_key(world_y);

        if let Some(note) = notes.note_at(tick, key).copied() {
            notes.remove_note(note.id, false);
            return;
        }

        let snapped = self.apply_snap(snap, coords, tick, mods).max(0);
        notes.create_note(
            snapped,
            self.default_note_duration,
            key.clamp(0, 127),
            100,
            0,
            true,
            false,
            false,
        );
    }

    // Internals ---------------------------------------------------------

    fn update_hover(
        &mut self,
        notes: &NoteStore,
        coords: &CoordinateSystem,
        world_x: f64,
        world_y: f64,
    ) {
        let tick = coords.world_to_tick(world_x);
        let key = coords.world_y_to_key(world_y);
        self.hover = notes
            .note_at(tick, key)
            .map(|n| (n.id, self.classify_edge(coords, world_x, n.tick, n.end_tick())));
    }

    fn begin_rectangle_selection(&mut self, notes: &NoteStore, world_x: f64, world_y: f64) {
        self.action = Action::RectangleSelection;
        self.hover = None;
        self.rect_active = true;
        self.rect_start_world = (world_x, world_y);
        self.rect_end_world = (world_x, world_y);
        self.initial_selection = notes.selected_ids();
    }

    fn update_rectangle_selection(
        &mut self,
        notes: &mut NoteStore,
        coords: &CoordinateSystem,
        mods: ModifierKeys,
    ) {
        let Some((x1, y1, x2, y2)) = self.selection_rectangle_world() else {
            return;
        };

        let mut in_rect = Vec::new();
        for note in notes.notes() {
            let nx1 = coords.tick_to_world(note.tick);
            let nx2 = coords.tick_to_world(note.end_tick());
            let ny1 = coords.key_to_world_y(note.key);
            let ny2 = ny1 + coords.key_height();
            if nx1 < x2 && nx2 > x1 && ny1 < y2 && ny2 > y1 {
                in_rect.push(note.id);
            }
        }

        let initial: HashSet<NoteId> = self.initial_selection.iter().copied().collect();
        let in_rect_set: HashSet<NoteId> = in_rect.iter().copied().collect();

        // Alt subtracts, Ctrl adds, Shift toggles, plain replaces.
        let desired: HashSet<NoteId> = if mods.alt {
            initial.difference(&in_rect_set).copied().collect()
        } else if mods.ctrl {
            initial.union(&in_rect_set).copied().collect()
        } else if mods.shift {
            initial.symmetric_difference(&in_rect_set).copied().collect()
        } else {
            in_rect_set
        };

        notes.clear_selection();
        for id in desired {
            notes.select(id, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SnapMode;

    struct Rig {
        notes: NoteStore,
        coords: CoordinateSystem,
        snap: GridSnap,
        pointer: PointerController,
    }

    fn rig() -> Rig {
        let mut coords = CoordinateSystem::new(180.0);
        coords.set_pixels_per_beat(60.0);
        // Scroll so keys around 60 are on screen.
        coords.set_scroll(0.0, 1300.0);
        let mut snap = GridSnap::new(480);
        snap.set_snap_mode(SnapMode::Off);
        Rig {
            notes: NoteStore::new(),
            coords,
            snap,
            pointer: PointerController::new(),
        }
    }

    impl Rig {
        /// Widget-local screen position over the middle of a note cell.
        fn screen_at(&self, world_x: f64, key: MidiKey) -> (f64, f64) {
            let world_y = self.coords.key_to_world_y(key) + self.coords.key_height() / 2.0;
            self.coords.world_to_screen(world_x, world_y)
        }

        fn down(&mut self, x: f64, y: f64, mods: ModifierKeys) {
            self.pointer
                .on_mouse_down(&mut self.notes, &self.coords, x, y, mods);
        }

        fn drag(&mut self, x: f64, y: f64, mods: ModifierKeys) {
            self.pointer
                .on_mouse_move(&mut self.notes, &self.coords, &self.snap, x, y, mods);
        }

        fn up(&mut self, x: f64, y: f64, mods: ModifierKeys) {
            self.pointer
                .on_mouse_up(&mut self.notes, &self.coords, x, y, mods);
        }
    }

    fn note_fields(store: &NoteStore, id: NoteId) -> (Tick, Duration, MidiKey) {
        let n = store.find_by_id(id).unwrap();
        (n.tick, n.duration, n.key)
    }

    #[test]
    fn group_drag_preserves_spacing() {
        let mut rig = rig();
        let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);
        let b = rig.notes.create_note(480, 240, 60, 100, 0, false, false, false);
        let c = rig.notes.create_note(960, 240, 62, 100, 0, false, false, false);
        rig.notes.select(a, true);
        rig.notes.select(b, true);
        rig.notes.select(c, true);

        // Grab A's body at world X 15 (not within 10 px of either edge).
        let (sx, sy) = rig.screen_at(15.0, 60);
        rig.down(sx, sy, ModifierKeys::default());
        // One beat right, one key up.
        rig.drag(sx + 60.0, sy - 20.0, ModifierKeys::default());
        rig.up(sx + 60.0, sy - 20.0, ModifierKeys::default());

        assert_eq!(note_fields(&rig.notes, a), (480, 240, 61));
        assert_eq!(note_fields(&rig.notes, b), (960, 240, 61));
        assert_eq!(note_fields(&rig.notes, c), (1440, 240, 63));
    }

    #[test]
    fn click_below_threshold_does_not_drag() {
        let mut rig = rig();
        let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);

        let (sx, sy) = rig.screen_at(15.0, 60);
        rig.down(sx, sy, ModifierKeys::default());
        rig.drag(sx + 2.0, sy + 2.0, ModifierKeys::default());
        rig.up(sx + 2.0, sy + 2.0, ModifierKeys::default());

        assert_eq!(note_fields(&rig.notes, a), (0, 240, 60));
        assert!(rig.notes.is_selected(a));
    }

    #[test]
    fn click_selects_and_empty_click_clears() {
        let mut rig = rig();
        let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);
        let b = rig.notes.create_note(480, 240, 62, 100, 0, false, false, false);
        rig.notes.select(b, false);

        // Plain click on A replaces the selection.
        let (sx, sy) = rig.screen_at(15.0, 60);
        rig.down(sx, sy, ModifierKeys::default());
        rig.up(sx, sy, ModifierKeys::default());
        assert!(rig.notes.is_selected(a));
        assert!(!rig.notes.is_selected(b));

        // Shift-click keeps the previous selection. B spans world X [60, 90].
        let (sx, sy) = rig.screen_at(75.0, 62);
        let shift = ModifierKeys {
            shift: true,
            ..Default::default()
        };
        rig.down(sx, sy, shift);
        rig.up(sx, sy, shift);
        assert!(rig.notes.is_selected(a));
        assert!(rig.notes.is_selected(b));

        // Empty-space click clears everything.
        let (sx, sy) = rig.screen_at(3000.0, 80);
        rig.down(sx, sy, ModifierKeys::default());
        rig.up(sx, sy, ModifierKeys::default());
        assert_eq!(rig.notes.selection_len(), 0);
    }

    #[test]
    fn rectangle_set_algebra() {
        let cases: [(ModifierKeys, &[usize]); 4] = [
            // plain: replace with in-rect.
            (ModifierKeys::default(), &[0, 1]),
            // Ctrl: initial union in-rect.
            (
                ModifierKeys {
                    ctrl: true,
                    ..Default::default()
                },
                &[0, 1, 2],
            ),
            // Shift: symmetric difference toggles A off, adds B.
            (
                ModifierKeys {
                    shift: true,
                    ..Default::default()
                },
                &[1, 2],
            ),
            // Alt: subtract in-rect from initial.
            (
                ModifierKeys {
                    alt: true,
                    ..Default::default()
                },
                &[2],
            ),
        ];

        for (mods, expected) in cases {
            let mut rig = rig();
            let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);
            let b = rig.notes.create_note(480, 240, 62, 100, 0, false, false, false);
            let far = rig.notes.create_note(9600, 240, 70, 100, 0, false, false, false);
            let ids = [a, b, far];
            // Initial selection: {a, far}.
            rig.notes.select(a, true);
            rig.notes.select(far, true);

            // Rectangle from empty space above B's row, across A and B.
            let start = rig.coords.world_to_screen(-20.0, 1295.0);
            rig.down(start.0, start.1, mods);
            let end = rig.coords.world_to_screen(520.0, 1390.0);
            rig.drag(end.0, end.1, mods);
            rig.up(end.0, end.1, mods);

            let mut got: Vec<NoteId> = rig.notes.selected_ids();
            got.sort_unstable();
            let mut want: Vec<NoteId> = expected.iter().map(|&i| ids[i]).collect();
            want.sort_unstable();
            assert_eq!(got, want, "mods {:?}", mods);
        }
    }

    #[test]
    fn right_edge_resize_updates_anchor_only() {
        let mut rig = rig();
        let a = rig.notes.create_note(0, 480, 60, 100, 0, false, false, false);
        let b = rig.notes.create_note(960, 480, 62, 100, 0, false, false, false);
        rig.notes.select(a, true);
        rig.notes.select(b, true);

        // A spans world X [0, 60]; grab the right edge.
        let (sx, sy) = rig.screen_at(58.0, 60);
        rig.down(sx, sy, ModifierKeys::default());
        assert!(!rig.pointer.is_dragging_note());
        rig.drag(sx + 30.0, sy, ModifierKeys::default());
        rig.up(sx + 30.0, sy, ModifierKeys::default());

        let (_, dur_a, _) = note_fields(&rig.notes, a);
        assert_eq!(dur_a, 704); // world 88 px -> tick 704 at 60 ppb
        assert_eq!(note_fields(&rig.notes, b), (960, 480, 62));
        // The resized length becomes the creation default.
        assert_eq!(rig.pointer.default_note_duration(), 704);
    }

    #[test]
    fn left_edge_resize_enforces_minimum_length() {
        let mut rig = rig();
        let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);

        // Left edge at world X 0; drag far past the right edge.
        let (sx, sy) = rig.screen_at(2.0, 60);
        rig.down(sx, sy, ModifierKeys::default());
        rig.drag(sx + 200.0, sy, ModifierKeys::default());
        rig.up(sx + 200.0, sy, ModifierKeys::default());

        let (tick, dur, _) = note_fields(&rig.notes, a);
        assert_eq!(dur, MIN_NOTE_LENGTH_TICKS);
        assert_eq!(tick, 240 - MIN_NOTE_LENGTH_TICKS);
    }

    #[test]
    fn ctrl_drag_duplicates_selection() {
        let mut rig = rig();
        let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);
        rig.notes.select(a, false);

        let ctrl = ModifierKeys {
            ctrl: true,
            ..Default::default()
        };
        let (sx, sy) = rig.screen_at(15.0, 60);
        rig.down(sx, sy, ctrl);
        assert!(rig.pointer.is_duplicating());
        rig.drag(sx, sy - 40.0, ctrl); // two keys up
        rig.up(sx, sy - 40.0, ctrl);

        assert_eq!(rig.notes.len(), 2);
        // The original stays put; the duplicate moved.
        assert_eq!(note_fields(&rig.notes, a), (0, 240, 60));
        let dup = rig
            .notes
            .notes()
            .iter()
            .find(|n| n.id != a)
            .copied()
            .unwrap();
        assert_eq!((dup.tick, dup.key), (0, 62));
        assert!(rig.notes.is_selected(dup.id));
        assert!(!rig.notes.is_selected(a));
    }

    #[test]
    fn ctrl_click_toggles_on_release_when_duplication_disabled() {
        let mut rig = rig();
        rig.pointer.set_enable_ctrl_drag_duplicate(false);
        let a = rig.notes.create_note(0, 240, 60, 100, 0, false, false, false);
        rig.notes.select(a, false);

        let ctrl = ModifierKeys {
            ctrl: true,
            ..Default::default()
        };
        let (sx, sy) = rig.screen_at(15.0, 60);
        rig.down(sx, sy, ctrl);
        // Still selected mid-press.
        assert!(rig.notes.is_selected(a));
        rig.up(sx, sy, ctrl);
        assert!(!rig.notes.is_selected(a));
    }

    #[test]
    fn double_click_creates_then_deletes() {
        let mut rig = rig();
        let (sx, sy) = rig.screen_at(130.0, 64);
        rig.pointer.on_double_click(
            &mut rig.notes,
            &rig.coords,
            &rig.snap,
            sx,
            sy,
            ModifierKeys::default(),
        );
        assert_eq!(rig.notes.len(), 1);
        let created = rig.notes.notes()[0];
        assert_eq!(created.key, 64);
        assert_eq!(created.duration, 480);
        assert!(created.selected);

        rig.pointer.on_double_click(
            &mut rig.notes,
            &rig.coords,
            &rig.snap,
            sx,
            sy,
            ModifierKeys::default(),
        );
        assert!(rig.notes.is_empty());
    }

    #[test]
    fn double_click_snaps_new_note_with_snap_on() {
        let mut rig = rig();
        rig.snap.set_snap_mode(SnapMode::Manual);
        rig.snap.set_snap_division("1/4");

        // World X 58 is tick 464, within 8 px of the beat at 480.
        let (sx, sy) = rig.screen_at(58.0, 50);
        rig.pointer.on_double_click(
            &mut rig.notes,
            &rig.coords,
            &rig.snap,
            sx,
            sy,
            ModifierKeys::default(),
        );
        assert_eq!(rig.notes.notes()[0].tick, 480);
    }

    #[test]
    fn hover_classifies_edges() {
        let mut rig = rig();
        rig.notes.create_note(0, 480, 60, 100, 0, false, false, false);

        // A spans world X [0, 60].
        let cases = [(3.0, HoverEdge::Left), (30.0, HoverEdge::Body), (57.0, HoverEdge::Right)];
        for (wx, expected) in cases {
            let (sx, sy) = rig.screen_at(wx, 60);
            rig.drag(sx, sy, ModifierKeys::default());
            let (_, edge) = rig.pointer.hover_state().unwrap();
            assert_eq!(edge, expected, "world x {}", wx);
        }

        let (sx, sy) = rig.screen_at(30.0, 70);
        rig.drag(sx, sy, ModifierKeys::default());
        assert!(rig.pointer.hover_state().is_none());
    }
}
