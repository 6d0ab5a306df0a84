use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BEATS_PER_MEASURE, DEFAULT_CC_LANE_HEIGHT, DEFAULT_CLIP_BARS, DEFAULT_PIANO_KEY_WIDTH,
    DEFAULT_RULER_HEIGHT, DEFAULT_TICKS_PER_BEAT,
};
use crate::model::note::MidiKey;

/// Layout and musical defaults for the piano roll widget. Hosts can persist
/// this alongside their own panel state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PianoRollConfig {
    // Layout / geometry
    pub piano_key_width: f64,
    pub ruler_height: f32,
    pub top_padding: f32,
    pub footer_height: f32,
    pub note_label_width: f32,

    // CC lane
    pub show_cc_lane: bool,
    pub cc_lane_height: f32,

    // Musical defaults
    pub ticks_per_beat: i32,
    pub beats_per_measure: i32,
    pub default_clip_bars: i32,
    pub initial_center_key: MidiKey,

    // Playhead follow behaviour
    pub playhead_auto_scroll: bool,
    pub playhead_auto_scroll_margin: f32,
}

impl Default for PianoRollConfig {
    fn default() -> Self {
        Self {
            piano_key_width: DEFAULT_PIANO_KEY_WIDTH,
            ruler_height: DEFAULT_RULER_HEIGHT,
            top_padding: 0.0,
            footer_height: 0.0,
            note_label_width: DEFAULT_PIANO_KEY_WIDTH as f32,
            show_cc_lane: true,
            cc_lane_height: DEFAULT_CC_LANE_HEIGHT,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
            default_clip_bars: DEFAULT_CLIP_BARS,
            initial_center_key: 60,
            playhead_auto_scroll: false,
            playhead_auto_scroll_margin: 100.0,
        }
    }
}

impl PianoRollConfig {
    /// Narrower key strip and CC lane for cramped panels.
    pub fn compact() -> Self {
        Self {
            piano_key_width: 150.0,
            ruler_height: 22.0,
            note_label_width: 150.0,
            cc_lane_height: 90.0,
            ..Self::default()
        }
    }

    /// Wider key strip and a taller CC lane.
    pub fn spacious() -> Self {
        Self {
            piano_key_width: 200.0,
            ruler_height: 24.0,
            note_label_width: 200.0,
            cc_lane_height: 140.0,
            ..Self::default()
        }
    }
}
