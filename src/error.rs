use std::fmt;

/// Validation errors for note construction and mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteError {
    NegativeTick,
    NonPositiveDuration,
    KeyOutOfRange(i32),
    VelocityOutOfRange(i32),
    ChannelOutOfRange(i32),
}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NoteError::NegativeTick => write!(f, "note tick must be non-negative"),
            NoteError::NonPositiveDuration => write!(f, "note duration must be positive"),
            NoteError::KeyOutOfRange(key) => write!(f, "MIDI key {} out of range 0-127", key),
            NoteError::VelocityOutOfRange(vel) => write!(f, "velocity {} out of range 0-127", vel),
            NoteError::ChannelOutOfRange(chan) => write!(f, "channel {} out of range 0-15", chan),
        }
    }
}

impl std::error::Error for NoteError {}

pub type Result<T> = std::result::Result<T, NoteError>;
