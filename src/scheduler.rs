//! Cooperative periodic-task scheduler.
//!
//! The scheduler notifies a [`SchedulerDelegate`] when a task is due; the
//! main loop implements the delegate to push events into the ISR queue.
//!
//! ```text
//!   MonotonicClock::now_ms ──▶ Scheduler::tick ──▶ SchedulerDelegate
//!                                                     │
//!                                                     ▼
//!                                               Event queue ──▶ AppService
//! ```
//!
//! A task fires at most once per `tick`.  When the loop falls behind, the
//! next deadline is re-based on the current time instead of replaying the
//! missed intervals.

use crate::app::ports::{SchedulerDelegate, TaskId};
use crate::config::SystemConfig;
use log::{info, warn};

/// Maximum number of periodic tasks (stack-allocated).
const MAX_TASKS: usize = 8;

/// A single periodic task.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    /// Human-readable label used in logs.
    pub label: &'static str,
    pub task: TaskId,
    pub interval_ms: u32,
}

#[derive(Debug, Clone)]
struct TaskEntry {
    def: PeriodicTask,
    next_due_ms: u32,
}

pub struct Scheduler {
    tasks: heapless::Vec<TaskEntry, MAX_TASKS>,
    /// Time origin for newly added tasks.
    now_ms: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
            now_ms: 0,
        }
    }

    /// Scheduler pre-loaded with the firmware's periodic tasks.
    pub fn from_config(config: &SystemConfig, now_ms: u32) -> Self {
        let mut s = Self::new();
        s.now_ms = now_ms;
        for (label, task, interval_ms) in [
            ("power", TaskId::PowerSample, config.power_sample_interval_ms),
            ("fan", TaskId::FanSample, config.fan_sample_interval_ms),
            ("tach", TaskId::TachSample, config.tach_sample_interval_ms),
            ("validate", TaskId::RpmValidate, config.validate_interval_ms),
            ("remote", TaskId::RemotePoll, config.request_poll_interval_ms),
        ] {
            s.add(PeriodicTask { label, task, interval_ms });
        }
        s
    }

    /// Add a task; the first fire is one interval from the last tick.
    /// Returns the slot index, or `None` if full.
    pub fn add(&mut self, task: PeriodicTask) -> Option<usize> {
        let next_due_ms = self.now_ms.wrapping_add(task.interval_ms);
        let label = task.label;
        let interval = task.interval_ms;
        match self.tasks.push(TaskEntry { def: task, next_due_ms }) {
            Ok(()) => {
                info!("SCHED | added '{}' every {} ms", label, interval);
                Some(self.tasks.len() - 1)
            }
            Err(_) => {
                warn!("SCHED | no slot for '{}'", label);
                None
            }
        }
    }

    /// Fire every due task once.
    pub fn tick(&mut self, now_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        self.now_ms = now_ms;
        for entry in self.tasks.iter_mut() {
            let late_by = now_ms.wrapping_sub(entry.next_due_ms);
            if late_by >= u32::MAX / 2 {
                continue; // not yet due
            }
            delegate.on_task_due(entry.def.label, entry.def.task);
            entry.next_due_ms = if late_by >= entry.def.interval_ms {
                now_ms.wrapping_add(entry.def.interval_ms)
            } else {
                entry.next_due_ms.wrapping_add(entry.def.interval_ms)
            };
        }
    }
}
