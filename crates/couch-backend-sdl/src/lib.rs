//! SDL2 backend for couchmode.
//!
//! Implements `RenderBackend`, `InputBackend`, and `DisplayBackend` using
//! SDL2. Text is rendered with SDL2_ttf. Game controllers are opened as
//! they are reported and their D-pad, face buttons, and left stick are
//! translated into the same input events as the keyboard.
//!
//! The SDL context, event pump, and controllers live for the whole run.
//! Only the window, its canvas, and the textures are torn down on
//! [`DisplayBackend::suspend`] so a launched program can own the screen.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sdl2::controller::{Axis as PadAxis, Button as PadButton, GameController};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::ttf::{Font, Sdl2TtfContext};
use sdl2::video::{Window, WindowContext};
use sdl2::{EventPump, GameControllerSubsystem, Sdl, VideoSubsystem};

use couch_types::backend::{Color, DisplayBackend, InputBackend, RenderBackend, TextureId};
use couch_types::error::{CouchError, Result};
use couch_types::input::{Axis, Button, InputEvent};

/// Fonts tried when none is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

/// Window creation parameters.
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// TrueType font. `None` searches common system locations.
    pub font: Option<PathBuf>,
}

/// The parts of the backend that exist only while the display is up.
///
/// # Safety
///
/// `textures` is declared before `texture_creator` so that Rust's drop order
/// (declaration order) destroys all textures before the creator they borrow from.
/// The `Texture<'static>` lifetime is erased via transmute in `load_texture()` --
/// this is sound because the `TextureCreator` always outlives the textures.
struct Surface {
    textures: HashMap<u64, Texture<'static>>,
    texture_creator: TextureCreator<WindowContext>,
    canvas: Canvas<Window>,
}

/// SDL2 rendering, input, and display-surface backend.
pub struct SdlBackend {
    surface: Option<Surface>,
    fonts: RefCell<HashMap<u16, Font<'static, 'static>>>,
    font_path: Option<PathBuf>,
    font_failed: Cell<bool>,
    ttf: &'static Sdl2TtfContext,
    controllers: Vec<GameController>,
    controller_subsystem: GameControllerSubsystem,
    event_pump: EventPump,
    video: VideoSubsystem,
    sdl: Sdl,
    settings: WindowSettings,
    next_texture_id: u64,
}

impl SdlBackend {
    /// Initialize SDL and open the window.
    pub fn new(settings: WindowSettings) -> Result<Self> {
        let sdl = sdl2::init().map_err(|e| CouchError::Backend(e.to_string()))?;
        let video = sdl
            .video()
            .map_err(|e| CouchError::Backend(e.to_string()))?;
        let controller_subsystem = sdl
            .game_controller()
            .map_err(|e| CouchError::Backend(e.to_string()))?;
        let event_pump = sdl
            .event_pump()
            .map_err(|e| CouchError::Backend(e.to_string()))?;

        // Fonts borrow the TTF context; it lives for the rest of the process.
        let ttf: &'static Sdl2TtfContext = Box::leak(Box::new(
            sdl2::ttf::init().map_err(|e| CouchError::Backend(e.to_string()))?,
        ));
        let font_path = find_font(settings.font.as_deref());
        match &font_path {
            Some(p) => log::info!("Using font {}", p.display()),
            None => log::warn!("No TrueType font found, labels disabled"),
        }

        let surface = open_surface(&video, &settings)?;
        sdl.mouse().show_cursor(false);
        log::info!(
            "SDL2 backend initialized: {}x{}{}",
            settings.width,
            settings.height,
            if settings.fullscreen { " (fullscreen)" } else { "" }
        );

        Ok(Self {
            surface: Some(surface),
            fonts: RefCell::new(HashMap::new()),
            font_path,
            font_failed: Cell::new(false),
            ttf,
            controllers: Vec::new(),
            controller_subsystem,
            event_pump,
            video,
            sdl,
            settings,
            next_texture_id: 1,
        })
    }

    fn surface(&mut self) -> Result<&mut Surface> {
        self.surface
            .as_mut()
            .ok_or_else(|| CouchError::Backend("display is suspended".into()))
    }

    /// Set the SDL draw color with optional blend mode.
    fn set_color(canvas: &mut Canvas<Window>, color: Color) {
        if color.a < 255 {
            canvas.set_blend_mode(sdl2::render::BlendMode::Blend);
        } else {
            canvas.set_blend_mode(sdl2::render::BlendMode::None);
        }
        canvas.set_draw_color(sdl_color(color));
    }

    /// Run `f` with the font at `size`, loading it on first use.
    fn with_font<T>(&self, size: u16, f: impl FnOnce(&Font<'static, 'static>) -> T) -> Option<T> {
        if self.font_failed.get() {
            return None;
        }
        let path = self.font_path.as_ref()?;
        let mut fonts = self.fonts.borrow_mut();
        if !fonts.contains_key(&size) {
            match self.ttf.load_font(path, size) {
                Ok(font) => {
                    fonts.insert(size, font);
                },
                Err(e) => {
                    log::warn!("Failed to load font {}: {e}", path.display());
                    self.font_failed.set(true);
                    return None;
                },
            }
        }
        fonts.get(&size).map(f)
    }

    fn open_controller(&mut self, index: u32) {
        match self.controller_subsystem.open(index) {
            Ok(pad) => {
                log::info!("Controller connected: {}", pad.name());
                self.controllers.push(pad);
            },
            Err(e) => log::warn!("Failed to open controller {index}: {e}"),
        }
    }

    fn close_controller(&mut self, instance: u32) {
        self.controllers.retain(|pad| pad.instance_id() != instance);
        log::info!("Controller disconnected ({} remaining)", self.controllers.len());
    }
}

fn sdl_color(color: Color) -> sdl2::pixels::Color {
    sdl2::pixels::Color::RGBA(color.r, color.g, color.b, color.a)
}

fn find_font(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        log::warn!("Configured font {} not found", path.display());
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

fn open_surface(video: &VideoSubsystem, settings: &WindowSettings) -> Result<Surface> {
    let mut builder = video.window(&settings.title, settings.width, settings.height);
    builder.position_centered();
    if settings.fullscreen {
        builder.fullscreen();
    }
    let window = builder
        .build()
        .map_err(|e| CouchError::Backend(e.to_string()))?;
    let canvas = window
        .into_canvas()
        .accelerated()
        .present_vsync()
        .build()
        .map_err(|e| CouchError::Backend(e.to_string()))?;
    let texture_creator = canvas.texture_creator();
    Ok(Surface {
        textures: HashMap::new(),
        texture_creator,
        canvas,
    })
}

impl RenderBackend for SdlBackend {
    fn clear(&mut self, color: Color) -> Result<()> {
        let s = self.surface()?;
        s.canvas.set_draw_color(sdl_color(color));
        s.canvas.clear();
        Ok(())
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) -> Result<()> {
        let s = self.surface()?;
        Self::set_color(&mut s.canvas, color);
        s.canvas
            .fill_rect(Rect::new(x, y, w, h))
            .map_err(CouchError::Backend)
    }

    fn stroke_rect(
        &mut self,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        stroke_width: u16,
        color: Color,
    ) -> Result<()> {
        let s = self.surface()?;
        Self::set_color(&mut s.canvas, color);
        if stroke_width <= 1 {
            let _ = s.canvas.draw_rect(Rect::new(x, y, w, h));
        } else {
            let sw = u32::from(stroke_width);
            let side_h = h.saturating_sub(sw * 2);
            let _ = s.canvas.fill_rect(Rect::new(x, y, w, sw));
            let _ = s
                .canvas
                .fill_rect(Rect::new(x, y + h as i32 - sw as i32, w, sw));
            let _ = s.canvas.fill_rect(Rect::new(x, y + sw as i32, sw, side_h));
            let _ = s.canvas.fill_rect(Rect::new(
                x + w as i32 - sw as i32,
                y + sw as i32,
                sw,
                side_h,
            ));
        }
        Ok(())
    }

    fn blit(&mut self, tex: TextureId, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        let s = self.surface()?;
        let texture = s
            .textures
            .get(&tex.0)
            .ok_or_else(|| CouchError::Backend(format!("texture not found: {}", tex.0)))?;
        s.canvas
            .copy(texture, None, Rect::new(x, y, w, h))
            .map_err(CouchError::Backend)
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        font_size: u16,
        color: Color,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let rendered = self.with_font(font_size, |font| {
            font.render(text).blended(sdl_color(color))
        });
        let rendered = match rendered {
            Some(Ok(surface)) => surface,
            Some(Err(e)) => return Err(CouchError::Backend(e.to_string())),
            None => return Ok(()),
        };
        let s = self.surface()?;
        let texture = s
            .texture_creator
            .create_texture_from_surface(&rendered)
            .map_err(|e| CouchError::Backend(e.to_string()))?;
        s.canvas
            .copy(
                &texture,
                None,
                Rect::new(x, y, rendered.width(), rendered.height()),
            )
            .map_err(CouchError::Backend)
    }

    fn measure_text(&self, text: &str, font_size: u16) -> u32 {
        self.with_font(font_size, |font| font.size_of(text).ok())
            .flatten()
            .map(|(w, _)| w)
            .unwrap_or_else(|| text.chars().count() as u32 * u32::from(font_size) / 2)
    }

    fn load_texture(&mut self, width: u32, height: u32, rgba_data: &[u8]) -> Result<TextureId> {
        let expected = (width * height * 4) as usize;
        if rgba_data.len() != expected {
            return Err(CouchError::Backend(format!(
                "texture data size mismatch: expected {expected}, got {}",
                rgba_data.len()
            )));
        }

        let id = self.next_texture_id;
        let s = self.surface()?;
        let mut texture = s
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::ABGR8888, width, height)
            .map_err(|e| CouchError::Backend(e.to_string()))?;

        let row = width as usize * 4;
        texture
            .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                for (y, src) in rgba_data.chunks_exact(row).enumerate() {
                    buffer[y * pitch..y * pitch + row].copy_from_slice(src);
                }
            })
            .map_err(CouchError::Backend)?;

        texture.set_blend_mode(sdl2::render::BlendMode::Blend);

        // SAFETY: The texture borrows from the surface's texture_creator.
        // `textures` is declared before `texture_creator`, so Rust drops
        // textures first, and suspend drops the whole surface at once.
        let texture: Texture<'static> = unsafe { std::mem::transmute(texture) };

        s.textures.insert(id, texture);
        self.next_texture_id += 1;
        Ok(TextureId(id))
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.surface()?.canvas.present();
        Ok(())
    }
}

impl InputBackend for SdlBackend {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let raw: Vec<Event> = self.event_pump.poll_iter().collect();
        let mut events = Vec::new();
        for event in raw {
            match event {
                Event::ControllerDeviceAdded { which, .. } => {
                    self.open_controller(which);
                    events.push(InputEvent::PadAdded);
                },
                Event::ControllerDeviceRemoved { which, .. } => {
                    self.close_controller(which);
                    events.push(InputEvent::PadRemoved);
                },
                other => events.extend(map_sdl_event(other)),
            }
        }
        events
    }
}

impl DisplayBackend for SdlBackend {
    fn set_pointer_visible(&mut self, visible: bool) {
        self.sdl.mouse().show_cursor(visible);
    }

    fn suspend(&mut self) -> Result<()> {
        // Dropping the surface destroys textures, renderer, and window.
        self.surface = None;
        log::info!("Display suspended");
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if self.surface.is_none() {
            self.surface = Some(open_surface(&self.video, &self.settings)?);
        }
        log::info!("Display resumed");
        Ok(())
    }
}

/// Map an SDL2 event to a couchmode input event.
fn map_sdl_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Quit { .. } => Some(InputEvent::Quit),
        Event::KeyDown {
            keycode: Some(key), ..
        } => map_key(key).map(InputEvent::ButtonPress),
        Event::KeyUp {
            keycode: Some(key), ..
        } => map_key(key).map(InputEvent::ButtonRelease),
        Event::ControllerButtonDown { button, .. } => map_pad_button(button),
        Event::ControllerButtonUp { button, .. } => match map_pad_button(button) {
            Some(InputEvent::ButtonPress(b)) => Some(InputEvent::ButtonRelease(b)),
            _ => None,
        },
        Event::ControllerAxisMotion { axis, value, .. } => map_pad_axis(axis, value),
        _ => None,
    }
}

fn map_key(key: Keycode) -> Option<Button> {
    match key {
        Keycode::Up => Some(Button::Up),
        Keycode::Down => Some(Button::Down),
        Keycode::Left => Some(Button::Left),
        Keycode::Right => Some(Button::Right),
        Keycode::Return | Keycode::KpEnter => Some(Button::Confirm),
        Keycode::Escape => Some(Button::Cancel),
        _ => None,
    }
}

fn map_pad_button(button: PadButton) -> Option<InputEvent> {
    match button {
        PadButton::DPadUp => Some(InputEvent::ButtonPress(Button::Up)),
        PadButton::DPadDown => Some(InputEvent::ButtonPress(Button::Down)),
        PadButton::DPadLeft => Some(InputEvent::ButtonPress(Button::Left)),
        PadButton::DPadRight => Some(InputEvent::ButtonPress(Button::Right)),
        PadButton::A | PadButton::X | PadButton::Y | PadButton::Start => {
            Some(InputEvent::PadButton)
        },
        _ => None,
    }
}

fn map_pad_axis(axis: PadAxis, value: i16) -> Option<InputEvent> {
    let axis = match axis {
        PadAxis::LeftX => Axis::Horizontal,
        PadAxis::LeftY => Axis::Vertical,
        _ => return None,
    };
    Some(InputEvent::AxisMotion {
        axis,
        value: normalize_axis(value),
    })
}

/// Scale a raw stick value to `[-1.0, 1.0]`.
fn normalize_axis(value: i16) -> f32 {
    (f32::from(value) / f32::from(i16::MAX)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_enter() {
        assert_eq!(map_key(Keycode::Left), Some(Button::Left));
        assert_eq!(map_key(Keycode::Return), Some(Button::Confirm));
        assert_eq!(map_key(Keycode::KpEnter), Some(Button::Confirm));
        assert_eq!(map_key(Keycode::Escape), Some(Button::Cancel));
        assert_eq!(map_key(Keycode::A), None);
    }

    #[test]
    fn dpad_matches_arrows() {
        assert_eq!(
            map_pad_button(PadButton::DPadRight),
            Some(InputEvent::ButtonPress(Button::Right))
        );
        assert_eq!(map_pad_button(PadButton::A), Some(InputEvent::PadButton));
        assert_eq!(map_pad_button(PadButton::Guide), None);
    }

    #[test]
    fn stick_axes() {
        assert_eq!(
            map_pad_axis(PadAxis::LeftY, i16::MAX),
            Some(InputEvent::AxisMotion {
                axis: Axis::Vertical,
                value: 1.0
            })
        );
        assert_eq!(map_pad_axis(PadAxis::TriggerLeft, 100), None);
        assert_eq!(normalize_axis(i16::MIN), -1.0);
        assert_eq!(normalize_axis(0), 0.0);
    }
}
