use crate::coords::CoordinateSystem;
use crate::grid::{GridSnap, SnapMode};
use crate::input::pointer::ModifierKeys;
use crate::model::note::{Note, NoteId, Tick};
use crate::model::store::NoteStore;

/// Logical keys the keyboard controller understands. The host maps its
/// framework key codes to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Delete,
    Backspace,
    A,
    C,
    V,
    Z,
    Y,
    Up,
    Down,
    Left,
    Right,
}

/// Keyboard shortcuts over a note store:
/// Ctrl+A select all, Delete/Backspace delete selection, Ctrl+C/V clipboard,
/// Ctrl+Z/Y undo/redo, arrows transpose (1 semitone, 12 with Shift) or nudge
/// in time (snap division, fine 1/128 note with Shift).
#[derive(Debug, Default)]
pub struct KeyboardController {
    clipboard: Vec<Note>,
}

impl KeyboardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    /// Handle one key press. Returns true if the event was consumed.
    pub fn on_key_press(
        &mut self,
        notes: &mut NoteStore,
        snap: &GridSnap,
        coords: &CoordinateSystem,
        key: EditorKey,
        mods: ModifierKeys,
    ) -> bool {
        match key {
            EditorKey::A if mods.ctrl => {
                notes.select_all();
                true
            }
            EditorKey::Delete | EditorKey::Backspace => {
                self.delete_selected(notes);
                true
            }
            EditorKey::C if mods.ctrl => {
                self.copy_selected(notes);
                true
            }
            EditorKey::V if mods.ctrl => {
                self.paste(notes);
                true
            }
            EditorKey::Z if mods.ctrl => notes.undo(),
            EditorKey::Y if mods.ctrl => notes.redo(),
            EditorKey::Up | EditorKey::Down | EditorKey::Left | EditorKey::Right => {
                self.move_selection(notes, snap, coords, key, mods)
            }
            _ => false,
        }
    }

    /// Paste so the earliest clipboard note starts at the target tick.
    pub fn paste_at_tick(&self, notes: &mut NoteStore, target_tick: Tick) -> bool {
        if self.clipboard.is_empty() {
            return false;
        }
        let earliest = self.clipboard.iter().map(|n| n.tick).min().unwrap_or(0);
        let offset = target_tick - earliest;

        notes.snapshot_for_undo();
        let mut created_any = false;
        for src in &self.clipboard {
            let tick = (src.tick + offset).max(0);
            let id = notes.create_note(
                tick,
                src.duration,
                src.key,
                src.velocity,
                src.channel,
                true,
                false,
                false,
            );
            created_any |= id != 0;
        }
        created_any
    }

    fn delete_selected(&mut self, notes: &mut NoteStore) {
        let to_delete: Vec<NoteId> = notes.selected_ids();
        if to_delete.is_empty() {
            return;
        }
        notes.snapshot_for_undo();
        for id in to_delete {
            notes.remove_note(id, false);
        }
    }

    fn copy_selected(&mut self, notes: &NoteStore) {
        self.clipboard = notes
            .notes()
            .iter()
            .filter(|n| n.selected)
            .copied()
            .collect();
    }

    fn paste(&mut self, notes: &mut NoteStore) {
        if self.clipboard.is_empty() {
            return;
        }
        // Clipboard ticks are absolute; paste lands at the original spots.
        notes.snapshot_for_undo();
        for src in &self.clipboard {
            notes.create_note(
                src.tick,
                src.duration,
                src.key,
                src.velocity,
                src.channel,
                true,
                false,
                false,
            );
        }
    }

    fn move_selection(
        &mut self,
        notes: &mut NoteStore,
        snap: &GridSnap,
        coords: &CoordinateSystem,
        key: EditorKey,
        mods: ModifierKeys,
    ) -> bool {
        let mut delta_tick: Tick = 0;
        let mut delta_key: i32 = 0;

        match key {
            EditorKey::Up => delta_key = if mods.shift { 12 } else { 1 },
            EditorKey::Down => delta_key = if mods.shift { -12 } else { -1 },
            EditorKey::Left | EditorKey::Right => {
                let tpb = Tick::from(snap.ticks_per_beat());
                // Fine unit: a 1/128 note.
                let fine = 4 * tpb / 128;
                let base = if snap.snap_mode() == SnapMode::Adaptive {
                    snap.adaptive_division(coords.pixels_per_beat(), false).ticks
                } else {
                    snap.snap_division().ticks
                };
                let step = if mods.shift { fine } else { base };
                delta_tick = if key == EditorKey::Left { -step } else { step };
            }
            _ => unreachable!(),
        }

        let selected: Vec<&Note> = notes.notes().iter().filter(|n| n.selected).collect();
        if selected.is_empty() {
            return false;
        }

        // The whole group moves or nothing does: check range limits against
        // the selection extremes first so per-note clamping cannot distort
        // relative spacing.
        if delta_key != 0 {
            let min_key = selected.iter().map(|n| n.key).min().unwrap();
            let max_key = selected.iter().map(|n| n.key).max().unwrap();
            if max_key + delta_key > 127 || min_key + delta_key < 0 {
                return false;
            }
        }
        if delta_tick != 0 {
            let min_tick = selected.iter().map(|n| n.tick).min().unwrap();
            if min_tick + delta_tick < 0 {
                return false;
            }
        }

        let ids = notes.selected_ids();
        if ids.is_empty() || (delta_tick == 0 && delta_key == 0) {
            return false;
        }

        notes.snapshot_for_undo();
        let mut moved_any = false;
        for id in ids {
            if notes.move_note(id, delta_tick, delta_key, false, false) {
                moved_any = true;
            }
        }
        moved_any
    }
}
