//! Shared test utilities for couch-core tests.
//!
//! Provides a [`MockBackend`] that records all draw calls for assertion, a
//! scripted [`Launcher`], and a settable [`Clock`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::backend::{Color, DisplayBackend, InputBackend, RenderBackend, TextureId};
use crate::error::{CouchError, Result};
use crate::input::InputEvent;
use crate::launch::Launcher;
use crate::remote::{ButtonState, RemoteKey};
use crate::statusbar::Clock;

/// Width of one character in [`MockBackend::measure_text`].
pub const MOCK_GLYPH_WIDTH: u32 = 10;

/// A recorded draw call from the mock backend.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum DrawCall {
    Clear(Color),
    FillRect {
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Color,
    },
    StrokeRect {
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        stroke: u16,
        color: Color,
    },
    DrawText {
        text: String,
        x: i32,
        y: i32,
        font_size: u16,
        color: Color,
    },
    Blit {
        tex: TextureId,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    },
    Swap,
}

/// A mock backend that records all draw calls for test assertions.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub calls: Vec<DrawCall>,
    /// Event batches returned by successive `poll_events` calls.
    pub script: VecDeque<Vec<InputEvent>>,
    /// Events that appear in the queue while the surface is suspended.
    pub queued_while_suspended: Vec<InputEvent>,
    pub suspended: bool,
    pub pointer_visible: bool,
    /// Pointer visibility at each `suspend`.
    pub pointer_at_suspend: Vec<bool>,
    pub suspends: usize,
    pub resumes: usize,
    pub textures_loaded: usize,
    next_texture: u64,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one batch of events for a later poll.
    pub fn push_events(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.script.push_back(events.into_iter().collect());
    }

    /// Number of presented frames.
    pub fn frames(&self) -> usize {
        self.calls.iter().filter(|c| **c == DrawCall::Swap).count()
    }

    /// Texts drawn, in call order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check if any `DrawText` call contains the given substring.
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    /// Every highlight stroke drawn.
    pub fn strokes(&self) -> Vec<(i32, i32, u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::StrokeRect { x, y, w, h, .. } => Some((*x, *y, *w, *h)),
                _ => None,
            })
            .collect()
    }

    pub fn blit_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Blit { .. }))
            .count()
    }

    fn record(&mut self, call: DrawCall) -> Result<()> {
        if self.suspended {
            return Err(CouchError::Backend("drawing while suspended".into()));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl RenderBackend for MockBackend {
    fn clear(&mut self, color: Color) -> Result<()> {
        self.record(DrawCall::Clear(color))
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) -> Result<()> {
        self.record(DrawCall::FillRect { x, y, w, h, color })
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
        self.record(DrawCall::StrokeRect {
            x,
            y,
            w,
            h,
            stroke: stroke_width,
            color,
        })
    }

    fn blit(&mut self, tex: TextureId, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        self.record(DrawCall::Blit { tex, x, y, w, h })
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        font_size: u16,
        color: Color,
    ) -> Result<()> {
        self.record(DrawCall::DrawText {
            text: text.to_string(),
            x,
            y,
            font_size,
            color,
        })
    }

    fn measure_text(&self, text: &str, _font_size: u16) -> u32 {
        text.chars().count() as u32 * MOCK_GLYPH_WIDTH
    }

    fn load_texture(&mut self, width: u32, height: u32, rgba_data: &[u8]) -> Result<TextureId> {
        if self.suspended {
            return Err(CouchError::Backend("no surface".into()));
        }
        if rgba_data.len() != width as usize * height as usize * 4 {
            return Err(CouchError::Backend("bad texture size".into()));
        }
        self.next_texture += 1;
        self.textures_loaded += 1;
        Ok(TextureId(self.next_texture))
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.record(DrawCall::Swap)
    }
}

impl InputBackend for MockBackend {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.script.pop_front().unwrap_or_default()
    }
}

impl DisplayBackend for MockBackend {
    fn set_pointer_visible(&mut self, visible: bool) {
        self.pointer_visible = visible;
    }

    fn suspend(&mut self) -> Result<()> {
        self.pointer_at_suspend.push(self.pointer_visible);
        self.suspended = true;
        self.suspends += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.suspended = false;
        self.resumes += 1;
        let queued = std::mem::take(&mut self.queued_while_suspended);
        if !queued.is_empty() {
            self.script.push_front(queued);
        }
        Ok(())
    }
}

/// What a [`ScriptedLauncher`] reports.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum LaunchOutcome {
    Exit(i32),
    Signaled,
    SpawnFails,
}

/// Records launches and answers with a fixed outcome.
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    pub launched: Rc<RefCell<Vec<Vec<String>>>>,
    pub outcome: LaunchOutcome,
    /// Remote presses injected while the "child" runs.
    pub press_during: Option<(ButtonState, RemoteKey)>,
}

#[allow(dead_code)]
impl ScriptedLauncher {
    pub fn new(outcome: LaunchOutcome) -> Self {
        Self {
            launched: Rc::new(RefCell::new(Vec::new())),
            outcome,
            press_during: None,
        }
    }

    pub fn pressing(mut self, state: ButtonState, key: RemoteKey) -> Self {
        self.press_during = Some((state, key));
        self
    }
}

impl Launcher for ScriptedLauncher {
    fn launch(&mut self, argv: &[String]) -> Result<Option<i32>> {
        self.launched.borrow_mut().push(argv.to_vec());
        if let Some((state, key)) = &self.press_during {
            state.press(key.clone());
        }
        match self.outcome {
            LaunchOutcome::Exit(code) => Ok(Some(code)),
            LaunchOutcome::Signaled => Ok(None),
            LaunchOutcome::SpawnFails => Err(CouchError::Launch("spawn failed".into())),
        }
    }
}

/// A clock whose label is set by the test. Clones share the label.
#[derive(Debug, Clone)]
pub struct FixedClock {
    label: Rc<RefCell<String>>,
}

impl FixedClock {
    pub fn new(label: &str) -> Self {
        Self {
            label: Rc::new(RefCell::new(label.to_string())),
        }
    }

    pub fn set(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
    }
}

impl Clock for FixedClock {
    fn label(&self) -> String {
        self.label.borrow().clone()
    }
}
