//! Non-blocking, timestamp-driven button debouncer.
//!
//! ## Hardware
//!
//! Active-low momentary switch with external pull-up.  The GPIO fires on
//! any edge; the ISR pushes [`Event::ButtonEdge`](crate::events::Event)
//! carrying the pin level and a millisecond timestamp, nothing more.  The
//! main loop then runs [`Debouncer::on_edge`] once per queued edge.
//!
//! ## Debounce rule
//!
//! After an accepted edge, every further edge is ignored until the
//! quiescence window has elapsed.  The first edge ever seen is accepted.
//! An accepted edge at the pressed level yields one [`ButtonPress`].

/// Default quiescence window.
pub const DEBOUNCE_MS: u32 = 300;

/// One debounced press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress {
    pub at_ms: u32,
}

/// Debounce bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState {
    /// Level of the last accepted edge (`true` = high).
    pub last_level: bool,
    /// Timestamp of the last accepted edge, `None` before the first.
    pub last_accepted_ms: Option<u32>,
}

pub struct Debouncer {
    quiescence_ms: u32,
    pressed_level: bool,
    state: DebounceState,
}

impl Debouncer {
    /// Active-low debouncer with the given quiescence window.
    pub fn new(quiescence_ms: u32) -> Self {
        Self::with_pressed_level(quiescence_ms, false)
    }

    pub fn with_pressed_level(quiescence_ms: u32, pressed_level: bool) -> Self {
        Self {
            quiescence_ms,
            pressed_level,
            state: DebounceState {
                last_level: !pressed_level,
                last_accepted_ms: None,
            },
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one raw edge.  `level` is the pin level after the edge.
    pub fn on_edge(&mut self, level: bool, now_ms: u32) -> Option<ButtonPress> {
        if let Some(last) = self.state.last_accepted_ms {
            if now_ms.wrapping_sub(last) < self.quiescence_ms {
                return None;
            }
        }

        self.state = DebounceState {
            last_level: level,
            last_accepted_ms: Some(now_ms),
        };

        (level == self.pressed_level).then_some(ButtonPress { at_ms: now_ms })
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}
