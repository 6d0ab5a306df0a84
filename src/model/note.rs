use serde::{Deserialize, Serialize};

use crate::error::{NoteError, Result};

/// Musical time in ticks. Negative values never appear on stored notes but
/// are legal in intermediate arithmetic (deltas, snap rounding).
pub type Tick = i64;
/// Note length in ticks, always positive on stored notes.
pub type Duration = i64;
/// MIDI note number, 0-127.
pub type MidiKey = i32;
/// MIDI velocity, 0-127.
pub type Velocity = i32;
/// MIDI channel, 0-15.
pub type Channel = i32;
/// Store-assigned note identifier. 0 is reserved as "no note".
pub type NoteId = u64;

/// A single note in the piano roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub tick: Tick,
    pub duration: Duration,
    pub key: MidiKey,
    pub velocity: Velocity,
    pub channel: Channel,
    pub selected: bool,
}

impl Note {
    /// Build a validated note. The id stays 0 until a store assigns one.
    pub fn new(
        tick: Tick,
        duration: Duration,
        key: MidiKey,
        velocity: Velocity,
        channel: Channel,
    ) -> Result<Self> {
        let note = Self {
            id: 0,
            tick,
            duration,
            key,
            velocity,
            channel,
            selected: false,
        };
        note.validate()?;
        Ok(note)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick < 0 {
            return Err(NoteError::NegativeTick);
        }
        if self.duration <= 0 {
            return Err(NoteError::NonPositiveDuration);
        }
        if !(0..=127).contains(&self.key) {
            return Err(NoteError::KeyOutOfRange(self.key));
        }
        if !(0..=127).contains(&self.velocity) {
            return Err(NoteError::VelocityOutOfRange(self.velocity));
        }
        if !(0..=15).contains(&self.channel) {
            return Err(NoteError::ChannelOutOfRange(self.channel));
        }
        Ok(())
    }

    #[inline]
    pub fn end_tick(&self) -> Tick {
        self.tick + self.duration
    }

    /// Two notes overlap when they share a key and their tick intervals
    /// [tick, end_tick) intersect.
    #[inline]
    pub fn overlaps(&self, other: &Note) -> bool {
        self.key == other.key && self.tick < other.end_tick() && other.tick < self.end_tick()
    }

    #[inline]
    pub fn contains_tick(&self, tick: Tick) -> bool {
        self.tick <= tick && tick < self.end_tick()
    }

    /// Shift by deltas, clamping tick to >= 0 and key to 0-127.
    pub fn move_by(&mut self, delta_tick: Tick, delta_key: i32) {
        self.tick = (self.tick + delta_tick).max(0);
        self.key = (self.key + delta_key).clamp(0, 127);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_validates_ranges() {
        assert!(Note::new(0, 240, 60, 100, 0).is_ok());
        assert_eq!(Note::new(-1, 240, 60, 100, 0), Err(NoteError::NegativeTick));
        assert_eq!(
            Note::new(0, 0, 60, 100, 0),
            Err(NoteError::NonPositiveDuration)
        );
        assert_eq!(
            Note::new(0, 240, 128, 100, 0),
            Err(NoteError::KeyOutOfRange(128))
        );
        assert_eq!(
            Note::new(0, 240, 60, 130, 0),
            Err(NoteError::VelocityOutOfRange(130))
        );
        assert_eq!(
            Note::new(0, 240, 60, 100, 16),
            Err(NoteError::ChannelOutOfRange(16))
        );
    }

    #[test]
    fn overlap_requires_same_key_and_interval_intersection() {
        let a = Note::new(0, 240, 60, 100, 0).unwrap();
        let b = Note::new(120, 240, 60, 100, 0).unwrap();
        let c = Note::new(240, 240, 60, 100, 0).unwrap();
        let d = Note::new(120, 240, 61, 100, 0).unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Touching intervals do not overlap.
        assert!(!a.overlaps(&c));
        // Different key never overlaps.
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn move_by_clamps_tick_and_key() {
        let mut n = Note::new(100, 240, 2, 100, 0).unwrap();
        n.move_by(-500, -10);
        assert_eq!(n.tick, 0);
        assert_eq!(n.key, 0);

        n.move_by(50, 300);
        assert_eq!(n.tick, 50);
        assert_eq!(n.key, 127);
    }

    #[test]
    fn contains_tick_is_half_open() {
        let n = Note::new(100, 50, 60, 100, 0).unwrap();
        assert!(n.contains_tick(100));
        assert!(n.contains_tick(149));
        assert!(!n.contains_tick(150));
        assert!(!n.contains_tick(99));
    }
}
