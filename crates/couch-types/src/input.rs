//! Platform-agnostic input event types.
//!
//! Every backend maps its native input to these enums. The core never sees
//! raw platform input.

/// A platform-agnostic input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A keyboard key or controller d-pad button pressed.
    ButtonPress(Button),
    /// A keyboard key or controller d-pad button released.
    ButtonRelease(Button),
    /// Analog stick moved. `value` is normalized to `-1.0..=1.0`.
    AxisMotion { axis: Axis, value: f32 },
    /// A controller face/shoulder button pressed.
    PadButton,
    /// A game controller was connected.
    PadAdded,
    /// A game controller was disconnected.
    PadRemoved,
    /// User requested quit (window close, etc.).
    Quit,
}

/// Buttons that map across keyboard and controller d-pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Cancel,
}

/// Analog axes consumed by the launcher (left stick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Index into per-axis state arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }
}
