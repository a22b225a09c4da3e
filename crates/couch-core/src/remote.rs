//! Remote-control input via an HDMI-CEC bridge process.
//!
//! The bridge (`cec-client` by default) prints one line per event. A
//! background worker reads those lines and records button presses in a
//! mutex-guarded [`ButtonState`]; the render loop drains the recorded
//! presses once per tick.
//!
//! Press/release policy: a press stays latched until the next
//! [`ButtonState::drain`], even if its release arrives first. A quick tap
//! that begins and ends between two ticks is therefore seen exactly once.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::error::{CouchError, Result};

const PRESSED_MARKER: &str = "key pressed: ";
const RELEASED_MARKER: &str = "key released: ";

/// Written to the bridge on startup: register as the active source.
const INIT_LINE: &[u8] = b"as\n";

/// A remote-control button, identified by the bridge's token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoteKey {
    Left,
    Right,
    Up,
    Down,
    Select,
    Back,
    Exit,
    Other(String),
}

impl RemoteKey {
    pub fn from_token(token: &str) -> Self {
        match token {
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            "select" => Self::Select,
            "back" => Self::Back,
            "exit" => Self::Exit,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One recognized bridge line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Pressed(RemoteKey),
    Released(RemoteKey),
}

/// Parse a bridge output line. Unrecognized lines yield `None`.
pub fn parse_bridge_line(line: &str) -> Option<BridgeEvent> {
    if let Some(token) = token_after(line, PRESSED_MARKER) {
        return Some(BridgeEvent::Pressed(RemoteKey::from_token(token)));
    }
    if let Some(token) = token_after(line, RELEASED_MARKER) {
        return Some(BridgeEvent::Released(RemoteKey::from_token(token)));
    }
    None
}

/// The token between `marker` and the next whitespace.
fn token_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    let rest = &line[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let token = &rest[..end];
    (!token.is_empty()).then_some(token)
}

#[derive(Debug, Default)]
struct Buttons {
    /// Buttons currently held down.
    held: Vec<RemoteKey>,
    /// Presses not yet consumed, in arrival order, without duplicates.
    pending: Vec<RemoteKey>,
}

/// Button state shared between the bridge worker and the render loop.
#[derive(Debug, Clone, Default)]
pub struct ButtonState {
    inner: Arc<Mutex<Buttons>>,
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Buttons> {
        // A panicking writer leaves the sets consistent; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a press.
    pub fn press(&self, key: RemoteKey) {
        let mut b = self.lock();
        if !b.held.contains(&key) {
            b.held.push(key.clone());
        }
        if !b.pending.contains(&key) {
            b.pending.push(key);
        }
    }

    /// Record a release. A pending press of the same key is kept.
    pub fn release(&self, key: &RemoteKey) {
        self.lock().held.retain(|k| k != key);
    }

    /// Atomically take every press recorded since the previous drain.
    pub fn drain(&self) -> Vec<RemoteKey> {
        std::mem::take(&mut self.lock().pending)
    }

    /// Buttons currently held, in press order.
    pub fn current(&self) -> Vec<RemoteKey> {
        self.lock().held.clone()
    }

    /// Forget all held and pending buttons.
    pub fn clear(&self) {
        let mut b = self.lock();
        b.held.clear();
        b.pending.clear();
    }

    fn apply(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::Pressed(key) => {
                log::debug!("remote: pressed {key:?}");
                self.press(key);
            },
            BridgeEvent::Released(key) => {
                log::debug!("remote: released {key:?}");
                self.release(&key);
            },
        }
    }
}

/// Worker body: apply every recognized line until end of stream.
fn pump_lines<R: BufRead>(reader: R, state: &ButtonState) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if let Some(event) = parse_bridge_line(&line) {
                    state.apply(event);
                }
            },
            Err(e) => {
                log::warn!("remote: bridge read failed: {e}");
                break;
            },
        }
    }
    log::info!("remote: bridge output closed");
}

fn spawn_worker<R: BufRead + Send + 'static>(
    reader: R,
    state: ButtonState,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("cec-bridge".into())
        .spawn(move || pump_lines(reader, &state))
}

/// Handle to the remote-control adapter.
pub struct RemoteControl {
    state: ButtonState,
    child: Option<Child>,
    worker: Option<JoinHandle<()>>,
}

impl RemoteControl {
    /// Spawn the bridge and its reader thread.
    ///
    /// Failure to start the bridge is logged and yields a disabled adapter:
    /// the remote simply contributes no input.
    pub fn start(command: &str) -> Self {
        match Self::try_start(command) {
            Ok(rc) => rc,
            Err(e) => {
                log::warn!("Remote control unavailable: {e}");
                Self::disabled()
            },
        }
    }

    fn try_start(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CouchError::Bridge("empty bridge command".into()))?;
        let child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CouchError::Bridge(format!("{program}: {e}")))?;

        let rc = Self::attach(child)?;
        log::info!("Remote control bridge started: {command}");
        Ok(rc)
    }

    /// Take ownership of a spawned bridge, send the init line and start
    /// reading its output. On error the child is killed and reaped.
    fn attach(child: Child) -> Result<Self> {
        let mut rc = Self::disabled();
        let child = rc.child.insert(child);
        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(INIT_LINE)?;
            stdin.flush()?;
        }
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CouchError::Bridge("bridge stdout not captured".into()))?;
        rc.worker = Some(spawn_worker(BufReader::new(stdout), rc.state.clone())?);
        Ok(rc)
    }

    /// Run the reader thread over an arbitrary line source.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Result<Self> {
        Self::spawn_reader(reader)
    }

    fn spawn_reader<R: BufRead + Send + 'static>(reader: R) -> Result<Self> {
        let mut rc = Self::disabled();
        rc.worker = Some(spawn_worker(reader, rc.state.clone())?);
        Ok(rc)
    }

    /// An adapter with no bridge. Buttons can still be injected through
    /// [`RemoteControl::buttons`].
    pub fn disabled() -> Self {
        Self {
            state: ButtonState::new(),
            child: None,
            worker: None,
        }
    }

    /// Whether a bridge process or reader is attached and still running.
    pub fn is_active(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn buttons(&self) -> &ButtonState {
        &self.state
    }

    pub fn current_buttons(&self) -> Vec<RemoteKey> {
        self.state.current()
    }

    pub fn drain(&self) -> Vec<RemoteKey> {
        self.state.drain()
    }

    pub fn clear(&self) {
        self.state.clear();
    }

    /// Terminate the bridge and release its pipes.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            // InvalidInput means the process already exited.
            if let Err(e) = child.kill()
                && e.kind() != std::io::ErrorKind::InvalidInput
            {
                log::warn!("remote: failed to stop bridge: {e}");
            }
            drop(child.stdin.take());
            let _ = child.wait();
            log::info!("Remote control bridge stopped");
        }
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                log::debug!("remote: reader still draining, detaching");
            }
        }
    }
}

impl Drop for RemoteControl {
    fn drop(&mut self) {
        self.stop();
    }
}
