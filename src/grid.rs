use crate::constants::{
    DEFAULT_BEATS_PER_MEASURE, DEFAULT_TICKS_PER_BEAT, IDEAL_GRID_SPACING_PX, MAGNETIC_SNAP_RANGE_PX,
    MAX_GRID_SPACING_PX, MIN_GRID_SPACING_PX, RULER_BAR_LABELS_PPB, RULER_BEAT_LABELS_PPB,
    RULER_SIXTEENTH_LABELS_PPB,
};
use crate::model::note::Tick;

/// Snap behaviour for note placement and editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapMode {
    Off,
    #[default]
    Adaptive,
    Manual,
}

/// A grid/snap division, e.g. "1/16".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapDivision {
    pub ticks: Tick,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLineKind {
    Measure,
    Beat,
    Subdivision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub tick: Tick,
    pub kind: GridLineKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulerLabel {
    pub tick: Tick,
    pub text: String,
}

const DIVISION_LABELS: [&str; 9] = [
    "1/64", "1/32", "1/16", "1/8", "1/4", "1/2", "1 bar", "2 bars", "4 bars",
];

fn build_divisions(ticks_per_beat: i32) -> Vec<SnapDivision> {
    // A whole note spans four beats; divisions scale with ticks-per-beat so
    // the table matches 30..7680 at TPB 480.
    let whole = Tick::from(ticks_per_beat) * 4;
    let ticks = [
        whole / 64,
        whole / 32,
        whole / 16,
        whole / 8,
        whole / 4,
        whole / 2,
        whole,
        whole * 2,
        whole * 4,
    ];
    DIVISION_LABELS
        .iter()
        .zip(ticks)
        .map(|(&label, ticks)| SnapDivision { ticks, label })
        .collect()
}

/// Adaptive grid and magnetic snapping: a division table scaled to the
/// current ticks-per-beat drives both grid rendering density and snapping.
#[derive(Debug, Clone)]
pub struct GridSnap {
    ticks_per_beat: i32,
    beats_per_measure: i32,
    snap_mode: SnapMode,
    snap_division: SnapDivision,
    grid_division: SnapDivision,
    divisions: Vec<SnapDivision>,
}

impl Default for GridSnap {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_BEAT)
    }
}

impl GridSnap {
    pub fn new(ticks_per_beat: i32) -> Self {
        let divisions = build_divisions(ticks_per_beat);
        let quarter = divisions[4];
        Self {
            ticks_per_beat,
            beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
            snap_mode: SnapMode::Adaptive,
            snap_division: quarter,
            grid_division: quarter,
            divisions,
        }
    }

    pub fn ticks_per_beat(&self) -> i32 {
        self.ticks_per_beat
    }

    pub fn set_ticks_per_beat(&mut self, ticks_per_beat: i32) {
        if ticks_per_beat <= 0 {
            return;
        }
        let snap_label = self.snap_division.label;
        let grid_label = self.grid_division.label;
        self.ticks_per_beat = ticks_per_beat;
        self.divisions = build_divisions(ticks_per_beat);
        // Re-resolve current divisions in the rescaled table.
        if let Some(d) = self.find_division(snap_label) {
            self.snap_division = *d;
        }
        if let Some(d) = self.find_division(grid_label) {
            self.grid_division = *d;
        }
    }

    pub fn beats_per_measure(&self) -> i32 {
        self.beats_per_measure
    }

    pub fn set_beats_per_measure(&mut self, beats: i32) {
        if beats > 0 {
            self.beats_per_measure = beats;
        }
    }

    pub fn snap_mode(&self) -> SnapMode {
        self.snap_mode
    }

    pub fn set_snap_mode(&mut self, mode: SnapMode) {
        self.snap_mode = mode;
    }

    pub fn snap_division(&self) -> SnapDivision {
        self.snap_division
    }

    pub fn grid_division(&self) -> SnapDivision {
        self.grid_division
    }

    /// Set the snap division by label. Returns true if the label exists.
    pub fn set_snap_division(&mut self, label: &str) -> bool {
        match self.find_division(label) {
            Some(d) => {
                self.snap_division = *d;
                true
            }
            None => false,
        }
    }

    pub fn set_grid_division(&mut self, label: &str) -> bool {
        match self.find_division(label) {
            Some(d) => {
                self.grid_division = *d;
                true
            }
            None => false,
        }
    }

    /// Step the snap division through the table, wrapping at the ends.
    pub fn cycle_snap_division(&mut self, forward: bool) {
        let count = self.divisions.len();
        let index = self
            .divisions
            .iter()
            .position(|d| d.label == self.snap_division.label)
            .unwrap_or(0);
        let next = if forward {
            (index + 1) % count
        } else {
            (index + count - 1) % count
        };
        self.snap_division = self.divisions[next];
    }

    /// Pick a division for the current zoom. For grids, prefer spacing near
    /// the ideal and reject anything outside [min, max]; for snapping, use
    /// the finest division whose spacing is at least the minimum. The table
    /// runs fine to coarse, so the first acceptable entry is the finest.
    pub fn adaptive_division(&self, pixels_per_beat: f64, for_grid: bool) -> SnapDivision {
        let spacing = |division: &SnapDivision| {
            division.ticks as f64 / f64::from(self.ticks_per_beat) * pixels_per_beat
        };

        let best = if for_grid {
            let mut best: Option<SnapDivision> = None;
            let mut best_score = f64::INFINITY;
            for division in &self.divisions {
                let px = spacing(division);
                if px < MIN_GRID_SPACING_PX || px > MAX_GRID_SPACING_PX {
                    continue;
                }
                let score = (px - IDEAL_GRID_SPACING_PX).abs();
                if score < best_score {
                    best_score = score;
                    best = Some(*division);
                }
            }
            best
        } else {
            self.divisions
                .iter()
                .find(|d| spacing(d) >= MIN_GRID_SPACING_PX)
                .copied()
        };

        best.unwrap_or(self.divisions[4])
    }

    /// Round to the nearest multiple of the snap division. `Off` is the
    /// identity. Negative inputs round to the nearest multiple without
    /// clamping; use the floor/ceil variants for clamped behaviour.
    pub fn snap_tick(&self, tick: Tick, mode_override: Option<SnapMode>) -> Tick {
        let mode = mode_override.unwrap_or(self.snap_mode);
        if mode == SnapMode::Off {
            return tick;
        }
        let size = self.snap_division.ticks;
        if size <= 0 {
            return tick;
        }
        (tick as f64 / size as f64).round() as Tick * size
    }

    pub fn snap_tick_floor(&self, tick: Tick) -> Tick {
        if self.snap_mode == SnapMode::Off {
            return tick;
        }
        let size = self.snap_division.ticks;
        if size <= 0 {
            return tick;
        }
        if tick < 0 {
            return 0;
        }
        tick / size * size
    }

    pub fn snap_tick_ceil(&self, tick: Tick) -> Tick {
        if self.snap_mode == SnapMode::Off {
            return tick;
        }
        let size = self.snap_division.ticks;
        if size <= 0 {
            return tick;
        }
        if tick < 0 {
            return 0;
        }
        (tick + size - 1) / size * size
    }

    /// Snap only when the pixel distance to the nearest grid point is within
    /// range. Adaptive mode snaps at the finest valid division for the zoom.
    /// Returns the (possibly unchanged) tick and whether it snapped.
    pub fn magnetic_snap(&self, tick: Tick, pixels_per_beat: f64) -> (Tick, bool) {
        self.magnetic_snap_with_range(tick, pixels_per_beat, MAGNETIC_SNAP_RANGE_PX)
    }

    pub fn magnetic_snap_with_range(
        &self,
        tick: Tick,
        pixels_per_beat: f64,
        range_px: f64,
    ) -> (Tick, bool) {
        if self.snap_mode == SnapMode::Off {
            return (tick, false);
        }
        let size = match self.snap_mode {
            SnapMode::Adaptive => self.adaptive_division(pixels_per_beat, false).ticks,
            _ => self.snap_division.ticks,
        };
        if size <= 0 {
            return (tick, false);
        }

        let nearest = (tick as f64 / size as f64).round() as Tick * size;
        let beats_off = (tick - nearest).abs() as f64 / f64::from(self.ticks_per_beat);
        let pixels_off = beats_off * pixels_per_beat;

        if pixels_off <= range_px {
            (nearest, true)
        } else {
            (tick, false)
        }
    }

    /// Grid lines for the visible range at the adaptive grid division, each
    /// classified by divisibility: measure, beat, or subdivision.
    pub fn grid_lines(&self, start_tick: Tick, end_tick: Tick, pixels_per_beat: f64) -> Vec<GridLine> {
        let mut lines = Vec::new();
        if start_tick >= end_tick {
            return lines;
        }
        let grid_size = self.adaptive_division(pixels_per_beat, true).ticks;
        if grid_size <= 0 {
            return lines;
        }

        let measure_ticks = Tick::from(self.ticks_per_beat) * Tick::from(self.beats_per_measure);
        let aligned_start = start_tick / grid_size * grid_size;

        let mut tick = aligned_start;
        while tick <= end_tick {
            let kind = if tick % measure_ticks == 0 {
                GridLineKind::Measure
            } else if tick % Tick::from(self.ticks_per_beat) == 0 {
                GridLineKind::Beat
            } else {
                GridLineKind::Subdivision
            };
            lines.push(GridLine { tick, kind });
            tick += grid_size;
        }
        lines
    }

    /// Ruler labels for the visible range. Density follows the zoom level:
    /// 1/16 labels when very zoomed in, "m.b" beat labels at medium zoom,
    /// bar numbers when zoomed out, every second bar beyond that. Bars and
    /// beats are 1-indexed.
    pub fn ruler_labels(
        &self,
        start_tick: Tick,
        end_tick: Tick,
        pixels_per_beat: f64,
    ) -> Vec<RulerLabel> {
        let mut labels = Vec::new();
        if start_tick >= end_tick {
            return labels;
        }

        let tpb = Tick::from(self.ticks_per_beat);
        let bar = tpb * Tick::from(self.beats_per_measure);
        let (interval, beat_labels) = if pixels_per_beat >= RULER_SIXTEENTH_LABELS_PPB {
            (tpb * 4 / 16, true)
        } else if pixels_per_beat >= RULER_BEAT_LABELS_PPB {
            (tpb, true)
        } else if pixels_per_beat >= RULER_BAR_LABELS_PPB {
            (bar, false)
        } else {
            (bar * 2, false)
        };
        if interval <= 0 {
            return labels;
        }

        let aligned_start = start_tick / interval * interval;
        let mut tick = aligned_start;
        while tick <= end_tick {
            let total_beats = tick as f64 / f64::from(self.ticks_per_beat);
            let measure = (total_beats / f64::from(self.beats_per_measure)) as i64 + 1;
            let text = if beat_labels {
                let beat = (total_beats % f64::from(self.beats_per_measure)) as i64 + 1;
                format!("{}.{}", measure, beat)
            } else {
                format!("{}", measure)
            };
            labels.push(RulerLabel { tick, text });
            tick += interval;
        }
        labels
    }

    /// Human-readable snap description for status displays.
    pub fn snap_info(&self) -> String {
        match self.snap_mode {
            SnapMode::Off => "Snap: OFF".to_string(),
            SnapMode::Adaptive => format!("Snap: ADAPTIVE ({})", self.snap_division.label),
            SnapMode::Manual => format!("Snap: {}", self.snap_division.label),
        }
    }

    fn find_division(&self, label: &str) -> Option<&SnapDivision> {
        self.divisions.iter().find(|d| d.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_table_scales_with_ticks_per_beat() {
        let grid = GridSnap::new(480);
        let ticks: Vec<Tick> = grid.divisions.iter().map(|d| d.ticks).collect();
        assert_eq!(ticks, vec![30, 60, 120, 240, 480, 960, 1920, 3840, 7680]);

        let grid = GridSnap::new(960);
        assert_eq!(grid.divisions[0].ticks, 60);
        assert_eq!(grid.divisions[8].ticks, 15360);
    }

    #[test]
    fn snap_tick_rounds_to_nearest_multiple() {
        let mut grid = GridSnap::new(480);
        grid.set_snap_mode(SnapMode::Manual);
        grid.set_snap_division("1/4");

        assert_eq!(grid.snap_tick(460, None), 480);
        assert_eq!(grid.snap_tick(200, None), 240);
        assert_eq!(grid.snap_tick(0, None), 0);
        // Negative input rounds to the nearest multiple, unclamped.
        assert_eq!(grid.snap_tick(-460, None), -480);
        // Off is the identity, both as mode and as override.
        assert_eq!(grid.snap_tick(460, Some(SnapMode::Off)), 460);
        grid.set_snap_mode(SnapMode::Off);
        assert_eq!(grid.snap_tick(460, None), 460);
    }

    #[test]
    fn floor_and_ceil_clamp_negatives() {
        let mut grid = GridSnap::new(480);
        grid.set_snap_mode(SnapMode::Manual);
        grid.set_snap_division("1/4");

        assert_eq!(grid.snap_tick_floor(460), 0);
        assert_eq!(grid.snap_tick_floor(500), 480);
        assert_eq!(grid.snap_tick_ceil(460), 480);
        assert_eq!(grid.snap_tick_floor(-10), 0);
        assert_eq!(grid.snap_tick_ceil(-10), 0);
    }

    #[test]
    fn magnetic_snap_respects_pixel_range() {
        let mut grid = GridSnap::new(480);
        grid.set_snap_mode(SnapMode::Manual);
        grid.set_snap_division("1/4");

        // |460 - 480| = 20 ticks = 2.5 px at 60 ppb, within the 8 px range.
        assert_eq!(grid.magnetic_snap(460, 60.0), (480, true));
        // |400 - 480| = 80 ticks = 10 px, outside the range; |400-480| vs
        // |400-240|: nearest multiple of 480 is 480 at 80 ticks away.
        assert_eq!(grid.magnetic_snap(400, 60.0), (400, false));
    }

    #[test]
    fn magnetic_snap_off_is_identity() {
        let mut grid = GridSnap::new(480);
        grid.set_snap_mode(SnapMode::Off);
        assert_eq!(grid.magnetic_snap(460, 60.0), (460, false));
    }

    #[test]
    fn adaptive_snapping_picks_finest_division_above_minimum() {
        let grid = GridSnap::new(480);
        // At 60 ppb: 1/16 spans 15 px (>= 10), 1/32 spans 7.5 px (rejected).
        assert_eq!(grid.adaptive_division(60.0, false).label, "1/16");
        // At 240 ppb the 1/64 (11.25 px) becomes valid.
        assert_eq!(grid.adaptive_division(240.0, false).label, "1/64");
    }

    #[test]
    fn adaptive_grid_prefers_ideal_spacing() {
        let grid = GridSnap::new(480);
        // At 60 ppb: 1/8 = 30 px exactly matches the ideal spacing.
        assert_eq!(grid.adaptive_division(60.0, true).label, "1/8");
        // At very low zoom all fine divisions collapse below minimum; bars
        // become the grid.
        assert_eq!(grid.adaptive_division(8.0, true).label, "1 bar");
    }

    #[test]
    fn grid_lines_classified_by_divisibility() {
        let grid = GridSnap::new(480);
        let lines = grid.grid_lines(0, 1920, 60.0);
        assert!(!lines.is_empty());
        for line in &lines {
            let expected = if line.tick % 1920 == 0 {
                GridLineKind::Measure
            } else if line.tick % 480 == 0 {
                GridLineKind::Beat
            } else {
                GridLineKind::Subdivision
            };
            assert_eq!(line.kind, expected);
        }
        assert_eq!(lines.first().unwrap().tick, 0);
        assert_eq!(lines.first().unwrap().kind, GridLineKind::Measure);
    }

    #[test]
    fn ruler_label_density_follows_zoom() {
        let grid = GridSnap::new(480);

        // >= 460 ppb: 1/16 resolution.
        let labels = grid.ruler_labels(0, 480, 500.0);
        assert_eq!(labels[1].tick - labels[0].tick, 120);

        // Beat labels at medium zoom, "m.b" text, 1-indexed.
        let labels = grid.ruler_labels(0, 1920, 100.0);
        assert_eq!(labels[0].text, "1.1");
        assert_eq!(labels[1].text, "1.2");
        assert_eq!(labels[1].tick - labels[0].tick, 480);

        // Bars only.
        let labels = grid.ruler_labels(0, 7680, 50.0);
        assert_eq!(labels[0].text, "1");
        assert_eq!(labels[1].text, "2");
        assert_eq!(labels[1].tick - labels[0].tick, 1920);

        // Every two bars when very zoomed out.
        let labels = grid.ruler_labels(0, 15360, 20.0);
        assert_eq!(labels[1].tick - labels[0].tick, 3840);
        assert_eq!(labels[1].text, "3");
    }

    #[test]
    fn cycle_and_lookup_by_label() {
        let mut grid = GridSnap::new(480);
        assert_eq!(grid.snap_division().label, "1/4");
        grid.cycle_snap_division(true);
        assert_eq!(grid.snap_division().label, "1/2");
        grid.cycle_snap_division(false);
        grid.cycle_snap_division(false);
        assert_eq!(grid.snap_division().label, "1/8");

        assert!(grid.set_snap_division("4 bars"));
        grid.cycle_snap_division(true);
        assert_eq!(grid.snap_division().label, "1/64");

        assert!(!grid.set_snap_division("1/5"));
    }

    #[test]
    fn snap_info_reflects_mode() {
        let mut grid = GridSnap::new(480);
        assert_eq!(grid.snap_info(), "Snap: ADAPTIVE (1/4)");
        grid.set_snap_mode(SnapMode::Off);
        assert_eq!(grid.snap_info(), "Snap: OFF");
        grid.set_snap_mode(SnapMode::Manual);
        grid.set_snap_division("1/16");
        assert_eq!(grid.snap_info(), "Snap: 1/16");
    }

    #[test]
    fn rescaling_ticks_per_beat_keeps_division_labels() {
        let mut grid = GridSnap::new(480);
        grid.set_snap_division("1/16");
        grid.set_ticks_per_beat(960);
        assert_eq!(grid.snap_division().label, "1/16");
        assert_eq!(grid.snap_division().ticks, 240);
    }
}
