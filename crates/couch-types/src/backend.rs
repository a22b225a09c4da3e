//! Backend trait definitions.
//!
//! The core dispatches all drawing, input polling, and display-surface
//! management through these traits. It never calls platform APIs directly.

use crate::error::Result;
use crate::input::InputEvent;

/// A color in RGBA format (0-255 per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const GRAY: Self = Self::rgb(190, 190, 190);
}

/// Opaque handle to a loaded texture in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Rendering backend trait.
///
/// Textures are owned by the backend. They stay valid until the display
/// surface is torn down by [`DisplayBackend::suspend`].
pub trait RenderBackend {
    /// Clear the screen to a solid color.
    fn clear(&mut self, color: Color) -> Result<()>;

    /// Draw a filled rectangle.
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) -> Result<()>;

    /// Draw a rectangle outline `stroke_width` pixels thick, inset from the
    /// given bounds.
    fn stroke_rect(
        &mut self,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        stroke_width: u16,
        color: Color,
    ) -> Result<()>;

    /// Blit a texture at the given position and size.
    fn blit(&mut self, tex: TextureId, x: i32, y: i32, w: u32, h: u32) -> Result<()>;

    /// Draw text with its top-left corner at `(x, y)`. `font_size` is a hint
    /// in pixels.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, font_size: u16, color: Color)
    -> Result<()>;

    /// Width in pixels `text` would occupy at `font_size`.
    fn measure_text(&self, text: &str, font_size: u16) -> u32;

    /// Upload an RGBA8 buffer as a texture.
    fn load_texture(&mut self, width: u32, height: u32, rgba_data: &[u8]) -> Result<TextureId>;

    /// Present the finished frame.
    fn swap_buffers(&mut self) -> Result<()>;
}

/// Input backend trait.
pub trait InputBackend {
    /// Drain all pending platform events in arrival order.
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// A full display backend whose surface can be released while another
/// application owns the screen.
pub trait DisplayBackend: RenderBackend + InputBackend {
    /// Show or hide the mouse pointer.
    fn set_pointer_visible(&mut self, visible: bool);

    /// Tear down the display surface. All textures become invalid.
    fn suspend(&mut self) -> Result<()>;

    /// Recreate the display surface at the original resolution and mode.
    fn resume(&mut self) -> Result<()>;
}
