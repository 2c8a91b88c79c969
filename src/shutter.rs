// Shutter sequence as an explicit state machine.
//
//   Previewing --Fire--> Capturing --Captured--> Compositing
//       ^                                            |
//       |                                       Composited
//     Close                                          v
//       |                                   Revealing { at }
//   AwaitingClose <-------Tick(now >= at)-----------'
//
// Any event that does not fit the current state is ignored.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterState {
    Previewing,
    Capturing,
    Compositing,
    /// Result is ready; the dialog opens at `at`.
    Revealing { at: Instant },
    AwaitingClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterEvent {
    Fire,
    Captured,
    Composited(Instant),
    Tick(Instant),
    Close,
}

#[derive(Debug, Clone)]
pub struct Shutter {
    state: ShutterState,
    delay: Duration,
}

impl Shutter {
    pub fn new(delay: Duration) -> Self {
        Self { state: ShutterState::Previewing, delay }
    }

    pub fn state(&self) -> ShutterState {
        self.state
    }

    pub fn is_previewing(&self) -> bool {
        self.state == ShutterState::Previewing
    }

    /// Feed one event; returns true when it moved the machine.
    pub fn on(&mut self, event: ShutterEvent) -> bool {
        use ShutterEvent as E;
        use ShutterState as S;
        let next = match (self.state, event) {
            (S::Previewing, E::Fire) => S::Capturing,
            (S::Capturing, E::Captured) => S::Compositing,
            (S::Compositing, E::Composited(now)) => S::Revealing { at: now + self.delay },
            (S::Revealing { at }, E::Tick(now)) if now >= at => S::AwaitingClose,
            (S::AwaitingClose, E::Close) => S::Previewing,
            (state, event) => {
                if !matches!(event, E::Tick(_)) {
                    log::debug!("shutter: {event:?} ignored in {state:?}");
                }
                return false;
            }
        };
        log::debug!("shutter: {:?} -> {next:?}", self.state);
        self.state = next;
        true
    }

    /// 0.0 right after the shot, 1.0 when the dialog opens. `None` outside
    /// the reveal window.
    pub fn reveal_progress(&self, now: Instant) -> Option<f32> {
        match self.state {
            ShutterState::Revealing { at } => {
                if self.delay.is_zero() {
                    return Some(1.0);
                }
                let left = at.saturating_duration_since(now).as_secs_f32();
                Some((1.0 - left / self.delay.as_secs_f32()).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}
