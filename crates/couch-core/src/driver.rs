//! The render loop.
//!
//! One [`Driver::tick`] reads all input sources through the multiplexer,
//! applies navigation, resolves activation, refreshes the status panel, and
//! redraws only when something visible changed. Launching an entry tears
//! down the display surface, blocks on the child, then rebuilds the
//! surface and re-uploads every texture.

use std::thread;
use std::time::{Duration, Instant};

use crate::backend::{Color, DisplayBackend, RenderBackend, TextureId};
use crate::bitmap::Bitmap;
use crate::entry::{Builtin, Command};
use crate::error::Result;
use crate::launch::{Launcher, ProcessLauncher};
use crate::layout::{GridLayout, HIGHLIGHT_STROKE, LABEL_FONT_SIZE, truncate_label};
use crate::multiplex::{InputMultiplexer, Signal};
use crate::nav::{Grid, Navigator};
use crate::remote::RemoteControl;
use crate::statusbar::{Clock, LocalClock, StatusPanel};

/// Cleared to when no background image is available.
const BACKGROUND: Color = Color::rgb(16, 16, 24);
const LABEL_COLOR: Color = Color::WHITE;

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    /// A child process owns the screen.
    Launching,
    Done,
}

/// Everything the draw pass needs besides the grid and the backend.
#[derive(Debug)]
pub struct RenderContext {
    layout: GridLayout,
    /// First visible grid row.
    first_row: usize,
    background: Option<Bitmap>,
    background_tex: Option<TextureId>,
    icon_textures: Vec<Option<TextureId>>,
    /// False after the surface was torn down.
    textures_valid: bool,
    status: StatusPanel,
    dirty: bool,
}

impl RenderContext {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            first_row: 0,
            background: None,
            background_tex: None,
            icon_textures: Vec::new(),
            textures_valid: false,
            status: StatusPanel::new(),
            dirty: true,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forget every texture handle; they are re-uploaded on the next draw.
    pub fn invalidate_textures(&mut self) {
        self.background_tex = None;
        self.icon_textures.clear();
        self.textures_valid = false;
    }

    fn upload_textures(&mut self, backend: &mut dyn RenderBackend, grid: &Grid) {
        if self.textures_valid {
            return;
        }
        self.background_tex = self.background.as_ref().and_then(|bg| upload(backend, bg));
        self.icon_textures = grid
            .entries()
            .iter()
            .map(|e| e.icon.as_ref().and_then(|icon| upload(backend, icon)))
            .collect();
        self.textures_valid = true;
        log::debug!(
            "Uploaded {} icon textures",
            self.icon_textures.iter().flatten().count()
        );
    }

    fn draw(
        &mut self,
        backend: &mut dyn RenderBackend,
        grid: &Grid,
        selection: usize,
    ) -> Result<()> {
        self.upload_textures(backend, grid);
        let layout = self.layout;
        self.first_row = layout.scroll_for(selection, self.first_row);

        backend.clear(BACKGROUND)?;
        if let Some(tex) = self.background_tex {
            backend.blit(tex, 0, 0, layout.screen.0, layout.screen.1)?;
        }

        let cell_w = layout.cell_width();
        for (i, entry) in grid.entries().iter().enumerate() {
            let Some(rect) = layout.icon_rect(i, self.first_row) else {
                continue;
            };
            if let Some(Some(tex)) = self.icon_textures.get(i) {
                backend.blit(*tex, rect.x, rect.y, rect.w, rect.h)?;
            }
            let label = truncate_label(&entry.name, cell_w, |t| {
                backend.measure_text(t, LABEL_FONT_SIZE)
            });
            if label.is_empty() {
                continue;
            }
            let text_w = backend.measure_text(&label, LABEL_FONT_SIZE) as i32;
            let x = rect.x + (rect.w as i32 - text_w) / 2;
            backend.draw_text(&label, x, layout.label_y(&rect), LABEL_FONT_SIZE, LABEL_COLOR)?;
        }

        if !grid.is_empty()
            && let Some(rect) = layout.icon_rect(selection, self.first_row)
        {
            backend.stroke_rect(rect.x, rect.y, rect.w, rect.h, HIGHLIGHT_STROKE, Color::GRAY)?;
        }

        self.status.draw(backend, layout.screen.0)?;
        backend.swap_buffers()?;
        self.dirty = false;
        Ok(())
    }
}

fn upload(backend: &mut dyn RenderBackend, bmp: &Bitmap) -> Option<TextureId> {
    match backend.load_texture(bmp.width(), bmp.height(), bmp.pixels()) {
        Ok(tex) => Some(tex),
        Err(e) => {
            log::warn!("Texture upload failed: {e}");
            None
        },
    }
}

/// Owns the loop state and every input source.
pub struct Driver<B, L = ProcessLauncher, C = LocalClock> {
    backend: B,
    grid: Grid,
    nav: Navigator,
    mux: InputMultiplexer,
    remote: RemoteControl,
    launcher: L,
    clock: C,
    ctx: RenderContext,
    state: LoopState,
    frame: Duration,
}

impl<B: DisplayBackend> Driver<B> {
    /// Driver with real process launching and the local wall clock.
    pub fn new(
        backend: B,
        grid: Grid,
        remote: RemoteControl,
        screen: (u32, u32),
        icon: u32,
    ) -> Self {
        Self::with_parts(backend, grid, remote, screen, icon, ProcessLauncher, LocalClock)
    }
}

impl<B: DisplayBackend, L: Launcher, C: Clock> Driver<B, L, C> {
    pub fn with_parts(
        backend: B,
        grid: Grid,
        remote: RemoteControl,
        screen: (u32, u32),
        icon: u32,
        launcher: L,
        clock: C,
    ) -> Self {
        let layout = GridLayout::new(screen, icon, grid.columns());
        Self {
            backend,
            nav: Navigator::new(&grid),
            grid,
            mux: InputMultiplexer::default(),
            remote,
            launcher,
            clock,
            ctx: RenderContext::new(layout),
            state: LoopState::Idle,
            frame: frame_duration(15),
        }
    }

    /// Target tick rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frame = frame_duration(fps);
        self
    }

    /// Stick threshold for the multiplexer.
    pub fn with_axis_threshold(mut self, threshold: f32) -> Self {
        self.mux = InputMultiplexer::new(threshold);
        self
    }

    pub fn with_background(mut self, background: Option<Bitmap>) -> Self {
        self.ctx.background = background;
        self.ctx.invalidate_textures();
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn selection(&self) -> usize {
        self.nav.selection()
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn remote(&self) -> &RemoteControl {
        &self.remote
    }

    /// Run ticks at the configured rate until the loop is done.
    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Entering launcher loop: {} entries, {} columns",
            self.grid.len(),
            self.grid.columns()
        );
        while self.state != LoopState::Done {
            let started = Instant::now();
            self.tick()?;
            if self.state == LoopState::Done {
                break;
            }
            if let Some(rest) = self.frame.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        log::info!("Launcher loop finished");
        Ok(())
    }

    /// One iteration: input, navigation, activation, status, redraw.
    pub fn tick(&mut self) -> Result<LoopState> {
        if self.state == LoopState::Done {
            return Ok(LoopState::Done);
        }

        let remote_keys = self.remote.drain();
        let events = self.backend.poll_events();
        let input = self.mux.tick(&remote_keys, &events);

        if input.is_quit() {
            self.finish();
            return Ok(self.state);
        }

        for dir in &input.intents {
            if self.nav.apply(*dir) {
                self.ctx.dirty = true;
            }
        }
        if self
            .ctx
            .status
            .update_tray(self.remote.is_active(), input.pads_delta)
        {
            self.ctx.dirty = true;
        }

        if input.signal == Some(Signal::Activate) {
            self.activate()?;
            if self.state == LoopState::Done {
                return Ok(self.state);
            }
        }

        if self.ctx.status.update_clock(&self.clock) {
            self.ctx.dirty = true;
        }
        if self.ctx.dirty {
            self.ctx
                .draw(&mut self.backend, &self.grid, self.nav.selection())?;
        }
        Ok(self.state)
    }

    fn activate(&mut self) -> Result<()> {
        let Some(command) = self.nav.activate(&self.grid).cloned() else {
            return Ok(());
        };
        match command {
            Command::Builtin(Builtin::Desktop) => {
                log::info!("Returning to desktop");
                self.finish();
                Ok(())
            },
            Command::Builtin(Builtin::Unknown(name)) => {
                log::warn!("Ignoring unknown builtin '@{name}'");
                Ok(())
            },
            Command::Shell(argv) if argv.is_empty() => {
                log::warn!("Entry {} has an empty command", self.nav.selection());
                Ok(())
            },
            Command::Shell(argv) => self.launch(&argv),
        }
    }

    /// Suspend, run `argv` to completion, and resume.
    fn launch(&mut self, argv: &[String]) -> Result<()> {
        self.state = LoopState::Launching;
        self.backend.set_pointer_visible(false);
        self.backend.suspend()?;
        self.ctx.invalidate_textures();

        match self.launcher.launch(argv) {
            Ok(Some(0)) => log::info!("{} exited normally", argv[0]),
            Ok(Some(code)) => log::warn!("{} exited with status {code}", argv[0]),
            Ok(None) => log::warn!("{} terminated by signal", argv[0]),
            Err(e) => log::warn!("Launch failed: {e}"),
        }

        self.backend.resume()?;
        self.backend.set_pointer_visible(false);
        // Input that piled up while the child had focus is stale.
        let stale = self.backend.poll_events().len() + self.remote.drain().len();
        if stale > 0 {
            log::debug!("Discarded {stale} queued inputs after launch");
        }
        self.mux.reset();
        self.ctx.dirty = true;
        self.state = LoopState::Idle;
        Ok(())
    }

    fn finish(&mut self) {
        self.state = LoopState::Done;
        self.remote.stop();
    }
}

fn frame_duration(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}
