use crate::model::note::Tick;

/// Advance a playback position by wall-clock time at the given tempo,
/// wrapping into the loop range by the overshoot amount when looping is on.
/// Pure tick arithmetic; the host owns timing and transport state.
pub fn advance_playback_ticks(
    current_position: Tick,
    tempo_bpm: f64,
    ticks_per_beat: i32,
    delta_seconds: f64,
    loop_enabled: bool,
    loop_start_tick: Tick,
    loop_end_tick: Tick,
) -> Tick {
    if delta_seconds <= 0.0 || tempo_bpm <= 0.0 || ticks_per_beat <= 0 {
        return current_position;
    }

    let ticks_per_second = tempo_bpm * f64::from(ticks_per_beat) / 60.0;
    let delta_ticks = ticks_per_second * delta_seconds;
    if delta_ticks <= 0.0 {
        return current_position;
    }

    let mut new_pos = (current_position + delta_ticks as Tick).max(0);

    if loop_enabled && loop_end_tick > loop_start_tick && new_pos >= loop_end_tick {
        let overshoot = new_pos - loop_end_tick;
        new_pos = (loop_start_tick + overshoot).max(loop_start_tick);
    }

    new_pos
}

/// Stateful playback helper the host holds alongside its transport.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub position_ticks: Tick,
    pub tempo_bpm: f64,
    pub ticks_per_beat: i32,
    pub playing: bool,
    pub loop_enabled: bool,
    pub loop_start_tick: Tick,
    pub loop_end_tick: Tick,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            position_ticks: 0,
            tempo_bpm: 120.0,
            ticks_per_beat: 480,
            playing: false,
            loop_enabled: false,
            loop_start_tick: 0,
            loop_end_tick: 0,
        }
    }
}

impl PlaybackState {
    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm > 0.0 {
            self.tempo_bpm = bpm;
        }
    }

    pub fn set_position(&mut self, tick: Tick) {
        self.position_ticks = tick.max(0);
    }

    pub fn set_loop_range(&mut self, start: Tick, end: Tick) {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        self.loop_start_tick = start.max(0);
        self.loop_end_tick = end.max(self.loop_start_tick);
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance by delta time in seconds and return the new tick position.
    pub fn advance(&mut self, delta_seconds: f64) -> Tick {
        if self.playing {
            self.position_ticks = advance_playback_ticks(
                self.position_ticks,
                self.tempo_bpm,
                self.ticks_per_beat,
                delta_seconds,
                self.loop_enabled,
                self.loop_start_tick,
                self.loop_end_tick,
            );
        }
        self.position_ticks
    }
}
