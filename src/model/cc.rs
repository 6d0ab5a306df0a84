use serde::{Deserialize, Serialize};

use crate::model::note::Tick;

/// One control point in a CC lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub tick: Tick,
    pub value: i32, // 0-127
}

/// A single MIDI continuous-controller lane: a CC number plus a point list
/// kept sorted by tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlLane {
    cc_number: i32,
    points: Vec<ControlPoint>,
}

impl ControlLane {
    pub fn new(cc_number: i32) -> Self {
        Self {
            cc_number,
            points: Vec::new(),
        }
    }

    pub fn cc_number(&self) -> i32 {
        self.cc_number
    }

    pub fn set_cc_number(&mut self, cc: i32) {
        self.cc_number = cc;
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Add a point, keeping the lane sorted by tick.
    pub fn add_point(&mut self, tick: Tick, value: i32) {
        self.points.push(ControlPoint {
            tick,
            value: value.clamp(0, 127),
        });
        self.points.sort_by_key(|p| p.tick);
    }

    /// Remove the first point within max_delta ticks of the given tick.
    /// Returns true if a point was removed.
    pub fn remove_near(&mut self, tick: Tick, max_delta: Tick) -> bool {
        if let Some(pos) = self
            .points
            .iter()
            .position(|p| (p.tick - tick).abs() <= max_delta)
        {
            self.points.remove(pos);
            true
        } else {
            false
        }
    }

    /// Index of the first point within max_delta ticks of the given tick.
    pub fn index_near(&self, tick: Tick, max_delta: Tick) -> Option<usize> {
        self.points
            .iter()
            .position(|p| (p.tick - tick).abs() <= max_delta)
    }

    pub fn point(&self, index: usize) -> Option<&ControlPoint> {
        self.points.get(index)
    }

    pub fn set_value(&mut self, index: usize, value: i32) {
        if let Some(p) = self.points.get_mut(index) {
            p.value = value.clamp(0, 127);
        }
    }

    /// Update a point's tick and keep the lane sorted.
    pub fn set_tick(&mut self, index: usize, tick: Tick) {
        if let Some(p) = self.points.get_mut(index) {
            p.tick = tick;
            self.points.sort_by_key(|p| p.tick);
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
