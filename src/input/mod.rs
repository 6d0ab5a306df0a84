pub mod keyboard;
pub mod pointer;

pub use keyboard::{EditorKey, KeyboardController};
pub use pointer::{HoverEdge, ModifierKeys, PointerController};
