use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Stage-space axis-aligned rectangle.
///
/// Width and height are never negative. Empty or non-finite geometry is
/// represented by the absence of a `Bounds` (`None`), never by a box with a
/// negative size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build from two opposite corners, returning `None` for degenerate input
    pub fn from_corners(min: DVec2, max: DVec2) -> Option<Self> {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y).validated()
    }

    /// `Some(self)` when every field is finite and the area is positive
    pub fn validated(self) -> Option<Self> {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite();
        (finite && self.width > 0.0 && self.height > 0.0).then_some(self)
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Componentwise min/max union of two boxes
    pub fn union(&self, other: &Bounds) -> Self {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn translated(&self, delta: DVec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }
}

/// One of the eight resize handles around the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleName {
    Right,
    Bottom,
    Left,
    Top,
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl HandleName {
    pub const ALL: [HandleName; 8] = [
        HandleName::TopLeft,
        HandleName::Top,
        HandleName::TopRight,
        HandleName::Right,
        HandleName::BottomRight,
        HandleName::Bottom,
        HandleName::BottomLeft,
        HandleName::Left,
    ];

    pub fn to_kebab_case(&self) -> &'static str {
        match self {
            HandleName::Right => "right",
            HandleName::Bottom => "bottom",
            HandleName::Left => "left",
            HandleName::Top => "top",
            HandleName::BottomRight => "bottom-right",
            HandleName::BottomLeft => "bottom-left",
            HandleName::TopRight => "top-right",
            HandleName::TopLeft => "top-left",
        }
    }

    pub fn cursor(&self) -> &'static str {
        match self {
            HandleName::Right => "ew-resize",
            HandleName::Left => "ew-resize",
            HandleName::Top => "ns-resize",
            HandleName::Bottom => "ns-resize",
            HandleName::TopLeft => "nwse-resize",
            HandleName::BottomRight => "nwse-resize",
            HandleName::TopRight => "nesw-resize",
            HandleName::BottomLeft => "nesw-resize",
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            HandleName::TopLeft
                | HandleName::TopRight
                | HandleName::BottomLeft
                | HandleName::BottomRight
        )
    }

    pub fn moves_left(&self) -> bool {
        matches!(self, HandleName::Left | HandleName::TopLeft | HandleName::BottomLeft)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, HandleName::Right | HandleName::TopRight | HandleName::BottomRight)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, HandleName::Top | HandleName::TopLeft | HandleName::TopRight)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, HandleName::Bottom | HandleName::BottomLeft | HandleName::BottomRight)
    }

    /// Handle position in the proxy's unrotated local frame, origin at the proxy center
    pub fn local_position(&self, width: f64, height: f64) -> DVec2 {
        let x = if self.moves_left() {
            -width / 2.0
        } else if self.moves_right() {
            width / 2.0
        } else {
            0.0
        };
        let y = if self.moves_top() {
            -height / 2.0
        } else if self.moves_bottom() {
            height / 2.0
        } else {
            0.0
        };
        DVec2::new(x, y)
    }
}

/// Which tool the editor is in. Only `Select` enables the transform machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Brush,
    Eraser,
    Fill,
    Text,
    Pan,
}

impl Tool {
    pub fn is_select(self) -> bool {
        self == Tool::Select
    }
}

/// Keyboard modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl Button {
    /// Map a DOM `button` index
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Button::Middle,
            2 => Button::Secondary,
            _ => Button::Primary,
        }
    }
}

/// A pointer or touch event as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: i32,
    /// Client-space position in CSS pixels
    pub client: DVec2,
    pub button: Button,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(pointer_id: i32, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            client: DVec2::new(x, y),
            button: Button::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Side effects the host performs on behalf of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Best-effort `setPointerCapture`; failures are ignored
    CapturePointer(i32),
    /// Best-effort `releasePointerCapture`; failures are ignored
    ReleasePointer(i32),
    SetCursor(&'static str),
    RenderNeeded,
}
