use std::collections::{HashMap, HashSet};

use crate::constants::UNDO_STACK_LIMIT;
use crate::model::note::{Channel, Duration, MidiKey, Note, NoteId, Tick, Velocity};

/// Central note collection: CRUD, per-key index, selection tracking, and
/// snapshot-based undo/redo. Single-threaded; driven from the host UI thread.
#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    id_to_index: HashMap<NoteId, usize>,
    key_index: HashMap<MidiKey, Vec<usize>>,
    selected_ids: HashSet<NoteId>,

    undo_stack: Vec<Vec<Note>>,
    redo_stack: Vec<Vec<Note>>,
    max_undo_levels: usize,
    next_id: NoteId,
}

impl NoteStore {
    pub fn new() -> Self {
        Self {
            max_undo_levels: UNDO_STACK_LIMIT,
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Create a note and add it to the collection. Returns the assigned id,
    /// or 0 when validation fails or an overlap is rejected. A rejected
    /// create does not consume an id.
    #[allow(clippy::too_many_arguments)]
    pub fn create_note(
        &mut self,
        tick: Tick,
        duration: Duration,
        key: MidiKey,
        velocity: Velocity,
        channel: Channel,
        selected: bool,
        record_undo: bool,
        allow_overlap: bool,
    ) -> NoteId {
        let mut note = match Note::new(tick, duration, key, velocity, channel) {
            Ok(n) => n,
            Err(_) => return 0,
        };
        note.selected = selected;

        if !allow_overlap && self.would_overlap(&note, None) {
            return 0;
        }

        if record_undo {
            self.push_undo_state();
        }

        note.id = self.next_id;
        self.next_id += 1;

        let index = self.notes.len();
        self.notes.push(note);
        self.id_to_index.insert(note.id, index);
        self.key_index.entry(note.key).or_default().push(index);
        if selected {
            self.selected_ids.insert(note.id);
        }

        note.id
    }

    /// Remove a note by id. Returns true if a note was removed.
    pub fn remove_note(&mut self, id: NoteId, record_undo: bool) -> bool {
        let Some(&index) = self.id_to_index.get(&id) else {
            return false;
        };

        if record_undo {
            self.push_undo_state();
        }

        self.notes.remove(index);
        self.rebuild_indexes();
        self.rebuild_selection_from_notes();
        true
    }

    /// Move a note by deltas, clamping tick to >= 0 and key to 0-127. On
    /// overlap rejection the note is left unchanged and false is returned.
    pub fn move_note(
        &mut self,
        id: NoteId,
        delta_tick: Tick,
        delta_key: i32,
        record_undo: bool,
        allow_overlap: bool,
    ) -> bool {
        let Some(&index) = self.id_to_index.get(&id) else {
            return false;
        };

        let mut moved = self.notes[index];
        moved.move_by(delta_tick, delta_key);

        if !allow_overlap && self.would_overlap(&moved, Some(id)) {
            return false;
        }

        if record_undo {
            self.push_undo_state();
        }

        self.notes[index] = moved;
        self.rebuild_indexes();
        true
    }

    /// Resize a note to a new duration (> 0 required).
    pub fn resize_note(
        &mut self,
        id: NoteId,
        new_duration: Duration,
        record_undo: bool,
        allow_overlap: bool,
    ) -> bool {
        if new_duration <= 0 {
            return false;
        }
        let Some(&index) = self.id_to_index.get(&id) else {
            return false;
        };

        let mut resized = self.notes[index];
        resized.duration = new_duration;

        if !allow_overlap && self.would_overlap(&resized, Some(id)) {
            return false;
        }

        if record_undo {
            self.push_undo_state();
        }

        self.notes[index] = resized;
        true
    }

    /// Check whether a probe note would overlap any stored note on the same
    /// key, optionally excluding one id (the note being edited).
    pub fn would_overlap(&self, probe: &Note, exclude_id: Option<NoteId>) -> bool {
        let Some(indices) = self.key_index.get(&probe.key) else {
            return false;
        };
        indices.iter().any(|&i| {
            let existing = &self.notes[i];
            if exclude_id == Some(existing.id) {
                return false;
            }
            probe.overlaps(existing)
        })
    }

    pub fn find_by_id(&self, id: NoteId) -> Option<&Note> {
        self.id_to_index.get(&id).map(|&i| &self.notes[i])
    }

    /// Note whose [tick, end_tick) interval contains the probe tick on the
    /// given key.
    pub fn note_at(&self, tick: Tick, key: MidiKey) -> Option<&Note> {
        let indices = self.key_index.get(&key)?;
        indices
            .iter()
            .map(|&i| &self.notes[i])
            .find(|n| n.contains_tick(tick))
    }

    /// All notes intersecting the half-open tick range on keys in
    /// [min_key, max_key].
    pub fn notes_in_range(
        &self,
        start_tick: Tick,
        end_tick: Tick,
        min_key: MidiKey,
        max_key: MidiKey,
    ) -> Vec<&Note> {
        let mut result = Vec::new();
        if start_tick >= end_tick || min_key > max_key {
            return result;
        }
        for key in min_key..=max_key {
            if let Some(indices) = self.key_index.get(&key) {
                for &i in indices {
                    let note = &self.notes[i];
                    if note.tick < end_tick && note.end_tick() > start_tick {
                        result.push(note);
                    }
                }
            }
        }
        result
    }

    // Selection ---------------------------------------------------------

    pub fn select(&mut self, id: NoteId, add_to_selection: bool) {
        if !self.id_to_index.contains_key(&id) {
            return;
        }
        if !add_to_selection {
            self.clear_selection();
        }
        let index = self.id_to_index[&id];
        self.notes[index].selected = true;
        self.selected_ids.insert(id);
    }

    pub fn deselect(&mut self, id: NoteId) {
        if let Some(&index) = self.id_to_index.get(&id) {
            self.notes[index].selected = false;
            self.selected_ids.remove(&id);
        }
    }

    pub fn clear_selection(&mut self) {
        for note in &mut self.notes {
            note.selected = false;
        }
        self.selected_ids.clear();
    }

    pub fn select_all(&mut self) {
        self.selected_ids.clear();
        for note in &mut self.notes {
            note.selected = true;
            self.selected_ids.insert(note.id);
        }
    }

    pub fn is_selected(&self, id: NoteId) -> bool {
        self.selected_ids.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<NoteId> {
        self.selected_ids.iter().copied().collect()
    }

    pub fn selection_len(&self) -> usize {
        self.selected_ids.len()
    }

    // Undo / redo -------------------------------------------------------

    pub fn set_max_undo_levels(&mut self, levels: usize) {
        self.max_undo_levels = levels;
    }

    /// Explicitly capture the current sequence so a multi-step edit (group
    /// drag, keyboard nudge) lands in one undo step.
    pub fn snapshot_for_undo(&mut self) {
        self.push_undo_state();
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(std::mem::replace(&mut self.notes, previous));
        self.rebuild_indexes();
        self.rebuild_selection_from_notes();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(std::mem::replace(&mut self.notes, next));
        self.rebuild_indexes();
        self.rebuild_selection_from_notes();
        true
    }

    /// Remove all notes and history.
    pub fn clear(&mut self) {
        self.notes.clear();
        self.id_to_index.clear();
        self.key_index.clear();
        self.selected_ids.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // Internals ---------------------------------------------------------

    fn push_undo_state(&mut self) {
        self.undo_stack.push(self.notes.clone());
        if self.undo_stack.len() > self.max_undo_levels {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn rebuild_indexes(&mut self) {
        self.id_to_index.clear();
        self.key_index.clear();
        for (index, note) in self.notes.iter().enumerate() {
            self.id_to_index.insert(note.id, index);
            self.key_index.entry(note.key).or_default().push(index);
        }
    }

    fn rebuild_selection_from_notes(&mut self) {
        self.selected_ids.clear();
        for note in &self.notes {
            if note.selected {
                self.selected_ids.insert(note.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(store: &NoteStore) {
        // Selection set mirrors the selected flags.
        let flagged: HashSet<NoteId> = store
            .notes()
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id)
            .collect();
        let selected: HashSet<NoteId> = store.selected_ids().into_iter().collect();
        assert_eq!(flagged, selected);

        // id -> index map matches the sequence.
        for (index, note) in store.notes().iter().enumerate() {
            assert_eq!(store.id_to_index.get(&note.id), Some(&index));
        }
        assert_eq!(store.id_to_index.len(), store.notes().len());

        // Per-key index covers exactly the notes on each key.
        let mut per_key: HashMap<MidiKey, usize> = HashMap::new();
        for note in store.notes() {
            *per_key.entry(note.key).or_default() += 1;
        }
        for (key, indices) in &store.key_index {
            assert_eq!(per_key.get(key).copied().unwrap_or(0), indices.len());
            for &i in indices {
                assert_eq!(store.notes()[i].key, *key);
            }
        }
    }

    #[test]
    fn create_rejects_same_key_overlap() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, true, false);
        assert_ne!(a, 0);

        let rejected = store.create_note(120, 240, 60, 100, 0, false, true, false);
        assert_eq!(rejected, 0);
        assert_eq!(store.len(), 1);

        let other_key = store.create_note(120, 240, 61, 100, 0, false, true, false);
        assert_ne!(other_key, 0);
        assert_eq!(store.len(), 2);
        assert_consistent(&store);
    }

    #[test]
    fn rejected_create_does_not_consume_an_id() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, false, false);
        let _ = store.create_note(0, 240, 60, 100, 0, false, false, false);
        let b = store.create_note(480, 240, 60, 100, 0, false, false, false);
        assert_eq!(b, a + 1);
    }

    #[test]
    fn create_rejects_invalid_input() {
        let mut store = NoteStore::new();
        assert_eq!(store.create_note(-1, 240, 60, 100, 0, false, false, false), 0);
        assert_eq!(store.create_note(0, 0, 60, 100, 0, false, false, false), 0);
        assert_eq!(store.create_note(0, 240, 200, 100, 0, false, false, false), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn move_restores_state_on_overlap_rejection() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, false, false);
        let b = store.create_note(480, 240, 60, 100, 0, false, false, false);

        // Moving b onto a is rejected and leaves b untouched.
        assert!(!store.move_note(b, -480, 0, false, false));
        let b_note = store.find_by_id(b).unwrap();
        assert_eq!(b_note.tick, 480);

        // A legal move applies and clamps nothing.
        assert!(store.move_note(a, 60, 2, false, false));
        let a_note = store.find_by_id(a).unwrap();
        assert_eq!((a_note.tick, a_note.key), (60, 62));
        assert_consistent(&store);
    }

    #[test]
    fn resize_requires_positive_duration() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, false, false);
        assert!(!store.resize_note(a, 0, false, false));
        assert!(store.resize_note(a, 120, false, false));
        assert_eq!(store.find_by_id(a).unwrap().duration, 120);
    }

    #[test]
    fn note_at_uses_half_open_interval() {
        let mut store = NoteStore::new();
        let a = store.create_note(100, 50, 60, 100, 0, false, false, false);
        assert_eq!(store.note_at(100, 60).map(|n| n.id), Some(a));
        assert_eq!(store.note_at(149, 60).map(|n| n.id), Some(a));
        assert!(store.note_at(150, 60).is_none());
        assert!(store.note_at(120, 61).is_none());
    }

    #[test]
    fn notes_in_range_filters_by_tick_and_key() {
        let mut store = NoteStore::new();
        store.create_note(0, 240, 60, 100, 0, false, false, false);
        store.create_note(480, 240, 62, 100, 0, false, false, false);
        store.create_note(960, 240, 64, 100, 0, false, false, false);

        let hits = store.notes_in_range(100, 600, 60, 62);
        assert_eq!(hits.len(), 2);
        assert!(store.notes_in_range(600, 600, 0, 127).is_empty());
        assert!(store.notes_in_range(0, 2000, 70, 80).is_empty());
    }

    #[test]
    fn selection_flag_and_set_stay_in_sync() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, false, false);
        let b = store.create_note(480, 240, 61, 100, 0, false, false, false);

        store.select(a, false);
        assert!(store.is_selected(a));
        assert_consistent(&store);

        store.select(b, true);
        assert_eq!(store.selection_len(), 2);
        assert_consistent(&store);

        store.select(b, false);
        assert!(!store.is_selected(a));
        assert_eq!(store.selection_len(), 1);
        assert_consistent(&store);

        store.deselect(b);
        assert_eq!(store.selection_len(), 0);

        store.select_all();
        assert_eq!(store.selection_len(), 2);
        assert_consistent(&store);

        store.remove_note(a, false);
        assert_eq!(store.selection_len(), 1);
        assert_consistent(&store);
    }

    #[test]
    fn undo_redo_restores_exact_sequences() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, true, false);
        let b = store.create_note(480, 240, 61, 90, 1, false, true, false);
        store.move_note(a, 120, 1, true, false);
        let after_all: Vec<Note> = store.notes().to_vec();

        assert!(store.undo());
        assert!(store.undo());
        assert!(store.undo());
        assert!(store.is_empty());
        assert!(!store.undo());

        assert!(store.redo());
        assert!(store.redo());
        assert!(store.redo());
        assert!(!store.redo());
        assert_eq!(store.notes(), after_all.as_slice());

        // Ids survive the round trip.
        assert!(store.find_by_id(a).is_some());
        assert!(store.find_by_id(b).is_some());
        assert_consistent(&store);
    }

    #[test]
    fn new_mutation_clears_redo_stack() {
        let mut store = NoteStore::new();
        store.create_note(0, 240, 60, 100, 0, false, true, false);
        assert!(store.undo());
        store.create_note(480, 240, 61, 100, 0, false, true, false);
        assert!(!store.redo());
    }

    #[test]
    fn undo_levels_are_bounded() {
        let mut store = NoteStore::new();
        store.set_max_undo_levels(3);
        for i in 0..6 {
            store.create_note(i * 480, 240, 60, 100, 0, false, true, false);
        }
        let mut undos = 0;
        while store.undo() {
            undos += 1;
        }
        assert_eq!(undos, 3);
        // The oldest snapshots were dropped, so three notes remain.
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn snapshot_groups_multi_step_edit_into_one_undo() {
        let mut store = NoteStore::new();
        let a = store.create_note(0, 240, 60, 100, 0, false, false, false);
        let b = store.create_note(480, 240, 62, 100, 0, false, false, false);

        store.snapshot_for_undo();
        store.move_note(a, 240, 0, false, false);
        store.move_note(b, 240, 0, false, false);

        assert!(store.undo());
        assert_eq!(store.find_by_id(a).unwrap().tick, 0);
        assert_eq!(store.find_by_id(b).unwrap().tick, 480);
    }
}
