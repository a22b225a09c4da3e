//! Per-tick merge of remote, keyboard/controller, and analog stick input.
//!
//! Sources are read in a fixed order (remote presses, then platform events)
//! and reduced to a list of navigation intents plus at most one terminal
//! signal. Quit always wins over activation.

use crate::input::{Axis, Button, InputEvent};
use crate::nav::Direction;
use crate::remote::RemoteKey;

/// Stick deflection needed to trigger a navigation intent.
pub const DEFAULT_AXIS_THRESHOLD: f32 = 0.75;

/// Terminal outcome of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Activate,
    Quit,
}

/// Everything a tick produced, ready for the navigator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Intents to apply in order.
    pub intents: Vec<Direction>,
    pub signal: Option<Signal>,
    /// Net change in connected controllers seen this tick.
    pub pads_delta: i32,
}

impl TickInput {
    fn push(&mut self, dir: Direction) {
        // Intents after an activation are dropped: the loop leaves to launch.
        if self.signal.is_none() {
            self.intents.push(dir);
        }
    }

    fn activate(&mut self) {
        if self.signal.is_none() {
            self.signal = Some(Signal::Activate);
        }
    }

    fn quit(&mut self) {
        self.signal = Some(Signal::Quit);
    }

    pub fn is_quit(&self) -> bool {
        self.signal == Some(Signal::Quit)
    }
}

/// Debounce state for the analog axes.
#[derive(Debug, Clone)]
pub struct InputMultiplexer {
    threshold: f32,
    /// Latched direction per axis: -1, 0 or +1.
    latch: [i8; 2],
}

impl Default for InputMultiplexer {
    fn default() -> Self {
        Self::new(DEFAULT_AXIS_THRESHOLD)
    }
}

impl InputMultiplexer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.abs(),
            latch: [0; 2],
        }
    }

    pub fn latch(&self, axis: Axis) -> i8 {
        self.latch[axis.index()]
    }

    /// Re-arm both axes.
    pub fn reset(&mut self) {
        self.latch = [0; 2];
    }

    /// Reduce one tick's worth of input.
    pub fn tick(&mut self, remote: &[RemoteKey], events: &[InputEvent]) -> TickInput {
        let mut out = TickInput::default();

        for key in remote {
            match key {
                RemoteKey::Left => out.push(Direction::Left),
                RemoteKey::Right => out.push(Direction::Right),
                RemoteKey::Up => out.push(Direction::Up),
                RemoteKey::Down => out.push(Direction::Down),
                RemoteKey::Back | RemoteKey::Exit => {
                    out.quit();
                    return out;
                },
                RemoteKey::Select => out.activate(),
                RemoteKey::Other(_) => {},
            }
        }

        for event in events {
            match *event {
                InputEvent::Quit | InputEvent::ButtonPress(Button::Cancel) => {
                    out.quit();
                    return out;
                },
                InputEvent::ButtonPress(Button::Confirm) | InputEvent::PadButton => out.activate(),
                InputEvent::ButtonPress(Button::Left) => out.push(Direction::Left),
                InputEvent::ButtonPress(Button::Right) => out.push(Direction::Right),
                InputEvent::ButtonPress(Button::Up) => out.push(Direction::Up),
                InputEvent::ButtonPress(Button::Down) => out.push(Direction::Down),
                InputEvent::AxisMotion { axis, value } => {
                    if let Some(dir) = self.axis_motion(axis, value) {
                        out.push(dir);
                    }
                },
                InputEvent::PadAdded => out.pads_delta += 1,
                InputEvent::PadRemoved => out.pads_delta -= 1,
                InputEvent::ButtonRelease(_) => {},
            }
        }
        out
    }

    /// Debounce one axis sample. Returns an intent only on a fresh crossing.
    fn axis_motion(&mut self, axis: Axis, value: f32) -> Option<Direction> {
        let latch = &mut self.latch[axis.index()];
        let dir: i8 = if value > self.threshold {
            1
        } else if value < -self.threshold {
            -1
        } else {
            *latch = 0;
            return None;
        };
        if *latch == dir {
            return None;
        }
        *latch = dir;
        Some(match (axis, dir) {
            (Axis::Horizontal, 1) => Direction::Right,
            (Axis::Horizontal, _) => Direction::Left,
            (Axis::Vertical, 1) => Direction::Down,
            (Axis::Vertical, _) => Direction::Up,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(axis: Axis, value: f32) -> InputEvent {
        InputEvent::AxisMotion { axis, value }
    }

    #[test]
    fn remote_arrows_become_intents() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[RemoteKey::Right, RemoteKey::Down], &[]);
        assert_eq!(out.intents, vec![Direction::Right, Direction::Down]);
        assert_eq!(out.signal, None);
    }

    #[test]
    fn remote_back_short_circuits() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(
            &[RemoteKey::Left, RemoteKey::Back, RemoteKey::Right],
            &[InputEvent::ButtonPress(Button::Down)],
        );
        assert!(out.is_quit());
        assert_eq!(out.intents, vec![Direction::Left]);
    }

    #[test]
    fn remote_exit_is_quit() {
        let mut mux = InputMultiplexer::default();
        assert!(mux.tick(&[RemoteKey::Exit], &[]).is_quit());
    }

    #[test]
    fn remote_select_drops_later_moves() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[RemoteKey::Select, RemoteKey::Right], &[]);
        assert_eq!(out.signal, Some(Signal::Activate));
        assert!(out.intents.is_empty());
    }

    #[test]
    fn remote_back_after_select_quits() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[RemoteKey::Select, RemoteKey::Left, RemoteKey::Back], &[]);
        assert!(out.is_quit());
        assert!(out.intents.is_empty());

        let out = mux.tick(&[RemoteKey::Select, RemoteKey::Exit], &[]);
        assert!(out.is_quit());
    }

    #[test]
    fn intents_after_activation_are_discarded() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(
            &[RemoteKey::Down],
            &[
                InputEvent::ButtonPress(Button::Confirm),
                InputEvent::ButtonPress(Button::Right),
            ],
        );
        assert_eq!(out.intents, vec![Direction::Down]);
        assert_eq!(out.signal, Some(Signal::Activate));
    }

    #[test]
    fn quit_overrides_activation() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[RemoteKey::Select], &[InputEvent::Quit]);
        assert!(out.is_quit());
    }

    #[test]
    fn keyboard_cancel_quits() {
        let mut mux = InputMultiplexer::default();
        assert!(
            mux.tick(&[], &[InputEvent::ButtonPress(Button::Cancel)])
                .is_quit()
        );
    }

    #[test]
    fn releases_are_ignored() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[], &[InputEvent::ButtonRelease(Button::Left)]);
        assert_eq!(out, TickInput::default());
    }

    #[test]
    fn pad_button_activates() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[], &[InputEvent::PadButton]);
        assert_eq!(out.signal, Some(Signal::Activate));
    }

    #[test]
    fn held_stick_triggers_once() {
        let mut mux = InputMultiplexer::default();
        let mut intents = Vec::new();
        for _ in 0..10 {
            intents.extend(mux.tick(&[], &[axis(Axis::Horizontal, 0.9)]).intents);
        }
        assert_eq!(intents, vec![Direction::Right]);
        assert_eq!(mux.latch(Axis::Horizontal), 1);
    }

    #[test]
    fn returning_to_center_rearms() {
        let mut mux = InputMultiplexer::default();
        let events = [
            axis(Axis::Vertical, 0.8),
            axis(Axis::Vertical, 0.95),
            axis(Axis::Vertical, 0.1),
            axis(Axis::Vertical, 0.8),
        ];
        let out = mux.tick(&[], &events);
        assert_eq!(out.intents, vec![Direction::Down, Direction::Down]);
    }

    #[test]
    fn flipping_direction_triggers_without_center() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(
            &[],
            &[axis(Axis::Horizontal, -0.9), axis(Axis::Horizontal, 0.9)],
        );
        assert_eq!(out.intents, vec![Direction::Left, Direction::Right]);
    }

    #[test]
    fn below_threshold_does_nothing() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(&[], &[axis(Axis::Vertical, -0.74), axis(Axis::Vertical, 0.5)]);
        assert!(out.intents.is_empty());
        assert_eq!(mux.latch(Axis::Vertical), 0);
    }

    #[test]
    fn axes_latch_independently() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(
            &[],
            &[axis(Axis::Horizontal, 0.9), axis(Axis::Vertical, -0.9)],
        );
        assert_eq!(out.intents, vec![Direction::Right, Direction::Up]);
    }

    #[test]
    fn reset_rearms_held_stick() {
        let mut mux = InputMultiplexer::default();
        mux.tick(&[], &[axis(Axis::Horizontal, 0.9)]);
        mux.reset();
        let out = mux.tick(&[], &[axis(Axis::Horizontal, 0.9)]);
        assert_eq!(out.intents, vec![Direction::Right]);
    }

    #[test]
    fn pad_hotplug_counted() {
        let mut mux = InputMultiplexer::default();
        let out = mux.tick(
            &[],
            &[InputEvent::PadAdded, InputEvent::PadAdded, InputEvent::PadRemoved],
        );
        assert_eq!(out.pads_delta, 1);
    }
}
