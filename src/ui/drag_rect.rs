/// Interaction states shared by every draggable rectangle (scrollbar thumb,
/// loop region).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    HoveringBody,
    HoveringLeftEdge,
    HoveringRightEdge,
    Dragging,
    ResizingLeft,
    ResizingRight,
}

impl DragState {
    pub fn is_hovering(self) -> bool {
        matches!(
            self,
            DragState::HoveringBody | DragState::HoveringLeftEdge | DragState::HoveringRightEdge
        )
    }

    pub fn is_active(self) -> bool {
        matches!(
            self,
            DragState::Dragging | DragState::ResizingLeft | DragState::ResizingRight
        )
    }
}

/// Rectangle bounds in the rectangle's native coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl RectBounds {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }
}

/// Coordinate conversion between the rectangle's native ("world") space and
/// widget-local screen space. The scrollbar uses the identity; the loop
/// marker maps world X through the coordinate system with a fixed local Y.
pub trait RectSpace {
    fn screen_to_world(&self, x: f64, y: f64) -> Option<(f64, f64)>;
    fn world_to_screen(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    fn world_to_screen_bounds(&self, b: &RectBounds) -> Option<RectBounds> {
        let (left, top) = self.world_to_screen(b.left, b.top)?;
        let (right, bottom) = self.world_to_screen(b.right, b.bottom)?;
        Some(RectBounds::new(left, right, top, bottom))
    }
}

/// Screen-space identity conversion.
pub struct IdentitySpace;

impl RectSpace for IdentitySpace {
    fn screen_to_world(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((x, y))
    }

    fn world_to_screen(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((x, y))
    }
}

/// Hover/drag/resize state machine over a rectangle, with optional snapping
/// and a preview that commits on release. Owners provide the coordinate
/// space per call and react to `mouse_up` returning true by reading the
/// finalized bounds.
#[derive(Debug)]
pub struct DragRect {
    pub bounds: RectBounds,
    pub state: DragState,
    pub visible: bool,
    pub enabled: bool,

    pub edge_threshold: f64,
    pub min_width: f64,
    pub snap_enabled: bool,
    pub snap_size: f64,
    pub show_drag_preview: bool,

    drag_start: Option<(f64, f64)>,
    drag_offset: (f64, f64),
    original_bounds: Option<RectBounds>,
    preview_bounds: Option<RectBounds>,
}

impl Default for DragRect {
    fn default() -> Self {
        Self {
            bounds: RectBounds::default(),
            state: DragState::Idle,
            visible: true,
            enabled: true,
            edge_threshold: 5.0,
            min_width: 10.0,
            snap_enabled: true,
            snap_size: 1.0,
            show_drag_preview: true,
            drag_start: None,
            drag_offset: (0.0, 0.0),
            original_bounds: None,
            preview_bounds: None,
        }
    }
}

impl DragRect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snap_value(&self, value: f64) -> f64 {
        if !self.snap_enabled || self.snap_size <= 0.0 {
            return value;
        }
        (value / self.snap_size).round() * self.snap_size
    }

    pub fn preview_bounds(&self) -> Option<RectBounds> {
        self.preview_bounds
    }

    pub fn original_bounds(&self) -> Option<RectBounds> {
        self.original_bounds
    }

    /// Hover detection. Does nothing while a drag or resize is in flight.
    pub fn hover(&mut self, space: &impl RectSpace, x: f64, y: f64) -> DragState {
        if !self.enabled || !self.visible {
            return DragState::Idle;
        }
        if self.state.is_active() {
            return self.state;
        }

        let Some(screen_bounds) = space.world_to_screen_bounds(&self.bounds) else {
            self.state = DragState::Idle;
            return self.state;
        };

        if !screen_bounds.contains(x, y) {
            self.state = DragState::Idle;
            return self.state;
        }

        self.state = if (x - screen_bounds.left).abs() <= self.edge_threshold {
            DragState::HoveringLeftEdge
        } else if (x - screen_bounds.right).abs() <= self.edge_threshold {
            DragState::HoveringRightEdge
        } else {
            DragState::HoveringBody
        };
        self.state
    }

    /// Transition the current hover state into drag or resize. Returns true
    /// if an interaction started.
    pub fn mouse_down(&mut self, space: &impl RectSpace, x: f64, y: f64) -> bool {
        if !self.enabled || !self.visible {
            return false;
        }
        match self.state {
            DragState::HoveringLeftEdge => {
                self.start_resize_left(x, y);
                true
            }
            DragState::HoveringRightEdge => {
                self.start_resize_right(x, y);
                true
            }
            DragState::HoveringBody => {
                self.start_drag(space, x, y);
                true
            }
            _ => false,
        }
    }

    /// Update an active drag or resize. Returns true if bounds or preview
    /// changed.
    pub fn drag(&mut self, space: &impl RectSpace, x: f64, y: f64) -> bool {
        if !self.enabled {
            return false;
        }
        match self.state {
            DragState::Dragging => self.update_drag(space, x, y),
            DragState::ResizingLeft => self.update_resize_left(space, x),
            DragState::ResizingRight => self.update_resize_right(space, x),
            _ => false,
        }
    }

    /// End the interaction, committing the preview to bounds. Returns true
    /// when an interaction finished (the owner should finalize).
    pub fn mouse_up(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }

        if self.show_drag_preview {
            if let Some(preview) = self.preview_bounds {
                self.bounds = preview;
            }
        }

        self.state = DragState::Idle;
        self.drag_start = None;
        self.drag_offset = (0.0, 0.0);
        self.original_bounds = None;
        self.preview_bounds = None;
        true
    }

    pub fn start_drag(&mut self, space: &impl RectSpace, x: f64, y: f64) {
        self.state = DragState::Dragging;
        self.drag_start = Some((x, y));
        self.original_bounds = Some(self.bounds);

        self.drag_offset = match space.screen_to_world(x, y) {
            Some((wx, wy)) => (wx - self.bounds.left, wy - self.bounds.top),
            None => (0.0, 0.0),
        };

        if self.show_drag_preview {
            self.preview_bounds = Some(self.bounds);
        }
    }

    pub fn start_resize_left(&mut self, x: f64, y: f64) {
        self.state = DragState::ResizingLeft;
        self.drag_start = Some((x, y));
        self.original_bounds = Some(self.bounds);
        if self.show_drag_preview {
            self.preview_bounds = Some(self.bounds);
        }
    }

    pub fn start_resize_right(&mut self, x: f64, y: f64) {
        self.state = DragState::ResizingRight;
        self.drag_start = Some((x, y));
        self.original_bounds = Some(self.bounds);
        if self.show_drag_preview {
            self.preview_bounds = Some(self.bounds);
        }
    }

    pub fn update_drag(&mut self, space: &impl RectSpace, x: f64, y: f64) -> bool {
        if self.drag_start.is_none() || self.original_bounds.is_none() {
            return false;
        }
        let Some((wx, wy)) = space.screen_to_world(x, y) else {
            return false;
        };

        let mut new_left = wx - self.drag_offset.0;
        let mut new_top = wy - self.drag_offset.1;
        if self.snap_enabled {
            new_left = self.snap_value(new_left);
            new_top = self.snap_value(new_top);
        }

        let width = self.bounds.width();
        let height = self.bounds.height();
        let moved = RectBounds::new(new_left, new_left + width, new_top, new_top + height);

        if self.show_drag_preview {
            self.preview_bounds = Some(moved);
        } else {
            self.bounds = moved;
        }
        true
    }

    fn update_resize_left(&mut self, space: &impl RectSpace, x: f64) -> bool {
        if self.original_bounds.is_none() {
            return false;
        }
        let Some((wx, _)) = space.screen_to_world(x, 0.0) else {
            return false;
        };

        let mut new_left = wx;
        if self.snap_enabled {
            new_left = self.snap_value(new_left);
        }
        new_left = new_left.min(self.bounds.right - self.min_width);

        if self.show_drag_preview {
            if let Some(preview) = &mut self.preview_bounds {
                preview.left = new_left;
            }
        } else {
            self.bounds.left = new_left;
        }
        true
    }

    fn update_resize_right(&mut self, space: &impl RectSpace, x: f64) -> bool {
        if self.original_bounds.is_none() {
            return false;
        }
        let Some((wx, _)) = space.screen_to_world(x, 0.0) else {
            return false;
        };

        let mut new_right = wx;
        if self.snap_enabled {
            new_right = self.snap_value(new_right);
        }
        new_right = new_right.max(self.bounds.left + self.min_width);

        if self.show_drag_preview {
            if let Some(preview) = &mut self.preview_bounds {
                preview.right = new_right;
            }
        } else {
            self.bounds.right = new_right;
        }
        true
    }
}
