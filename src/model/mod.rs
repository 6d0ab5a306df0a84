pub mod cc;
pub mod note;
pub mod store;

pub use cc::{ControlLane, ControlPoint};
pub use note::{Channel, Duration, MidiKey, Note, NoteId, Tick, Velocity};
pub use store::NoteStore;
