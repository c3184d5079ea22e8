//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - the button GPIO ISR (raw edges)
//! - the scheduler delegate (periodic task ticks)
//!
//! and consumed by the main loop, one at a time, in FIFO order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISR    │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Scheduler   │────▶│  (lock-free) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use heapless::mpmc::Q32;

use crate::app::ports::TaskId;

/// System event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Raw button edge recorded by the ISR; not yet debounced.
    ButtonEdge { level_high: bool, at_ms: u32 },
    /// Power meter sample due.
    PowerSampleTick,
    /// Fan controller temperature / duty sample due.
    FanSampleTick,
    /// Tachometer telemetry burst due.
    TachSampleTick,
    /// RPM band validation due.
    ValidateTick,
    /// Remote request mailbox poll due.
    RemotePollTick,
}

impl From<TaskId> for Event {
    fn from(task: TaskId) -> Self {
        match task {
            TaskId::PowerSample => Self::PowerSampleTick,
            TaskId::FanSample => Self::FanSampleTick,
            TaskId::TachSample => Self::TachSampleTick,
            TaskId::RpmValidate => Self::ValidateTick,
            TaskId::RemotePoll => Self::RemotePollTick,
        }
    }
}

/// Lock-free MPMC queue; safe to push from ISR and task context alike.
static EVENT_QUEUE: Q32<Event> = Q32::new();

/// Push an event into the queue.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    EVENT_QUEUE.enqueue(event).is_ok()
}

/// Pop the next event, or `None` when empty.
pub fn pop_event() -> Option<Event> {
    EVENT_QUEUE.dequeue()
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}
