//! Status panel: clock and tray indicators in the top-right corner.

use crate::backend::{Color, RenderBackend};
use crate::error::Result;

const PANEL_FONT_SIZE: u16 = 28;
const PANEL_MARGIN: i32 = 24;
const PANEL_PAD: u32 = 12;
const ITEM_GAP: u32 = 20;
const PANEL_BG: Color = Color::rgba(0, 0, 0, 160);
const TRAY_COLOR: Color = Color::rgb(150, 200, 255);

/// Source of the clock label.
pub trait Clock {
    /// Current local time as `HH:MM`.
    fn label(&self) -> String;
}

/// Wall clock in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn label(&self) -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }
}

/// Runtime state of the status panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPanel {
    /// Cached clock string.
    clock_text: String,
    remote_active: bool,
    pads: usize,
}

impl Default for StatusPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            clock_text: "00:00".to_string(),
            remote_active: false,
            pads: 0,
        }
    }

    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    /// Refresh the clock. Returns `true` if the label changed.
    pub fn update_clock(&mut self, clock: &dyn Clock) -> bool {
        let label = clock.label();
        if label == self.clock_text {
            return false;
        }
        self.clock_text = label;
        true
    }

    /// Refresh the tray state. Returns `true` if anything changed.
    pub fn update_tray(&mut self, remote_active: bool, pads_delta: i32) -> bool {
        let pads = self.pads.saturating_add_signed(pads_delta as isize);
        let changed = remote_active != self.remote_active || pads != self.pads;
        self.remote_active = remote_active;
        self.pads = pads;
        changed
    }

    pub fn pads(&self) -> usize {
        self.pads
    }

    /// Indicator labels, left to right.
    pub fn tray_items(&self) -> Vec<&'static str> {
        let mut items = Vec::new();
        if self.remote_active {
            items.push("CEC");
        }
        if self.pads > 0 {
            items.push("PAD");
        }
        items
    }

    /// Draw the panel anchored to the top-right corner of a `screen_w` wide screen.
    pub fn draw(&self, backend: &mut dyn RenderBackend, screen_w: u32) -> Result<()> {
        let tray = self.tray_items();
        let widths: Vec<u32> = tray
            .iter()
            .map(|t| backend.measure_text(t, PANEL_FONT_SIZE))
            .collect();
        let clock_w = backend.measure_text(&self.clock_text, PANEL_FONT_SIZE);
        let content_w = widths.iter().map(|w| w + ITEM_GAP).sum::<u32>() + clock_w;
        let panel_w = content_w + 2 * PANEL_PAD;
        let panel_h = u32::from(PANEL_FONT_SIZE) + 2 * PANEL_PAD;
        let x = screen_w as i32 - panel_w as i32 - PANEL_MARGIN;
        let y = PANEL_MARGIN;

        backend.fill_rect(x, y, panel_w, panel_h, PANEL_BG)?;
        let mut cx = x + PANEL_PAD as i32;
        let ty = y + PANEL_PAD as i32;
        for (item, w) in tray.iter().zip(&widths) {
            backend.draw_text(item, cx, ty, PANEL_FONT_SIZE, TRAY_COLOR)?;
            cx += (w + ITEM_GAP) as i32;
        }
        backend.draw_text(&self.clock_text, cx, ty, PANEL_FONT_SIZE, Color::WHITE)
    }
}
