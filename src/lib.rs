//! Piano-roll editing core for egui.
//!
//! Maintains the note model, view transforms, and interaction state for a
//! MIDI note editor with a CC lane, and issues primitive draw commands to
//! the host's immediate-mode painter. The host owns the window, transport,
//! and audio; the widget owns editing.
//!
//! ```no_run
//! use pianoroll::PianoRollWidget;
//!
//! let mut roll = PianoRollWidget::new();
//! # let ctx = egui::Context::default();
//! # egui::CentralPanel::default().show(&ctx, |ui| {
//! for event in roll.ui(ui) {
//!     // react to playhead moves, marker drags, piano key presses
//!     let _ = event;
//! }
//! # });
//! ```

pub mod config;
pub mod constants;
pub mod coords;
pub mod error;
pub mod grid;
pub mod input;
pub mod model;
pub mod playback;
pub mod serialization;
pub mod ui;

pub use config::PianoRollConfig;
pub use coords::{CoordinateSystem, Viewport};
pub use error::NoteError;
pub use grid::{GridLine, GridLineKind, GridSnap, RulerLabel, SnapDivision, SnapMode};
pub use input::{EditorKey, HoverEdge, KeyboardController, ModifierKeys, PointerController};
pub use model::{Channel, ControlLane, ControlPoint, Duration, MidiKey, Note, NoteId, NoteStore, Tick, Velocity};
pub use playback::{advance_playback_ticks, PlaybackState};
pub use ui::{PianoRollEvent, PianoRollWidget, PointerInput, Theme};
