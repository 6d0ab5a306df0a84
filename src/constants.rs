use crate::model::note::Tick;

// Musical defaults
pub const DEFAULT_TICKS_PER_BEAT: i32 = 480;
pub const DEFAULT_BEATS_PER_MEASURE: i32 = 4;
pub const DEFAULT_CLIP_BARS: i32 = 4;
pub const TOTAL_KEYS: i32 = 128;

// Zoom / layout
pub const DEFAULT_PIXELS_PER_BEAT: f64 = 60.0;
pub const MIN_PIXELS_PER_BEAT: f64 = 15.0;
pub const MAX_PIXELS_PER_BEAT: f64 = 4000.0;
pub const DEFAULT_KEY_HEIGHT: f64 = 20.0;
pub const BASE_KEY_HEIGHT: f64 = 20.0;
pub const VERTICAL_ZOOM_MIN_PERCENT: f64 = 0.60;
pub const VERTICAL_ZOOM_MAX_PERCENT: f64 = 1.25;
pub const DEFAULT_PIANO_KEY_WIDTH: f64 = 180.0;
pub const DEFAULT_RULER_HEIGHT: f32 = 24.0;
pub const DEFAULT_CC_LANE_HEIGHT: f32 = 120.0;

// Interaction
pub const NOTE_EDGE_THRESHOLD: f64 = 10.0;
pub const DRAG_THRESHOLD_PIXELS: f64 = 4.0;
pub const MIN_NOTE_LENGTH_TICKS: Tick = 10;
pub const MAGNETIC_SNAP_RANGE_PX: f64 = 8.0;
pub const MARKER_HIT_PX: f64 = 8.0;
pub const UNDO_STACK_LIMIT: usize = 100;
pub const WHEEL_SCROLL_SPEED: f64 = 30.0;

// Ruler / note-name gestures
pub const GESTURE_START_THRESHOLD: f64 = 3.0;
pub const GESTURE_AXIS_RATIO: f64 = 1.5;
pub const ZOOM_DRAG_SENSITIVITY: f64 = 0.01;

// Edge scrolling during rectangle selection
pub const EDGE_SCROLL_MARGIN: f64 = 60.0;
pub const EDGE_SCROLL_BASE_SPEED: f64 = 5.0;
pub const EDGE_SCROLL_MAX_SPEED: f64 = 25.0;

// Scrollbar
pub const SCROLLBAR_TRACK_SIZE: f32 = 15.0;
pub const SCROLLBAR_DRAG_THRESHOLD: f64 = 3.0;
pub const SCROLLBAR_MIN_THUMB: f64 = 20.0;
pub const SCROLLBAR_PAGE_FRACTION: f64 = 0.9;
pub const SCROLLBAR_DOUBLE_CLICK_SECS: f64 = 0.8;
pub const EDGE_ZOOM_MIN_PPB: f64 = 10.0;
pub const EDGE_ZOOM_MAX_PPB: f64 = 500.0;
pub const FIT_MIN_PPB: f64 = 15.0;
pub const FIT_MAX_PPB: f64 = 480.0;

// Adaptive grid spacing (pixels between adjacent grid lines)
pub const MIN_GRID_SPACING_PX: f64 = 10.0;
pub const IDEAL_GRID_SPACING_PX: f64 = 30.0;
pub const MAX_GRID_SPACING_PX: f64 = 100.0;

// Ruler label density thresholds (pixels per beat)
pub const RULER_SIXTEENTH_LABELS_PPB: f64 = 460.0;
pub const RULER_BEAT_LABELS_PPB: f64 = 67.0;
pub const RULER_BAR_LABELS_PPB: f64 = 40.0;
