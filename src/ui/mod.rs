pub mod cc_lane;
pub mod drag_rect;
pub mod loop_marker;
pub mod overlay;
pub mod renderer;
pub mod scrollbar;
pub mod theme;
pub mod widget;

pub use drag_rect::{DragRect, DragState, RectBounds, RectSpace};
pub use loop_marker::LoopMarker;
pub use scrollbar::{HScrollbar, ScrollbarEvent};
pub use theme::Theme;
pub use widget::{PianoRollEvent, PianoRollWidget, PointerInput};
