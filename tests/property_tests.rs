//! Property tests for the speed controller, smoothing, validation and
//! the scheduler.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use fanctl::app::events::AppEvent;
use fanctl::app::ports::{EventSink, FanPort, SchedulerDelegate, TaskId};
use fanctl::control::smoothing::{MAX_WINDOW, MovingAverage};
use fanctl::control::speed::{SpeedController, SpeedState};
use fanctl::control::speed_table::SpeedTable;
use fanctl::control::validator::{RpmValidator, Verdict};
use fanctl::remote::surface::{Method, Route, RouteError, route};
use fanctl::scheduler::{PeriodicTask, Scheduler};
use proptest::prelude::*;

#[derive(Default)]
struct Fan {
    writes: Vec<u8>,
}

impl FanPort for Fan {
    fn read_temperature_kelvin(&mut self) -> f32 {
        300.0
    }
    fn read_rpm(&mut self) -> u32 {
        0
    }
    fn set_duty_cycle(&mut self, percent: u8) {
        self.writes.push(percent);
    }
    fn duty_cycle(&mut self) -> u8 {
        self.writes.last().copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct Events(Vec<AppEvent>);

impl EventSink for Events {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

fn controller() -> SpeedController {
    SpeedController::new(SpeedTable::default_table(), SpeedState::new())
}

// ── Speed selection ───────────────────────────────────────────

proptest! {
    /// Each press advances by one modulo N and writes exactly once.
    #[test]
    fn cycling_wraps_modulo_table_length(start in 0i64..4, presses in 0usize..40) {
        let mut c = controller();
        let mut fan = Fan::default();
        c.set(start, &mut fan).unwrap();
        fan.writes.clear();

        for _ in 0..presses {
            c.cycle(&mut fan);
        }
        prop_assert_eq!(i64::from(c.current().index), (start + presses as i64) % 4);
        prop_assert_eq!(fan.writes.len(), presses);
    }

    #[test]
    fn out_of_range_never_writes(start in 0i64..4, bad in prop_oneof![i64::MIN..0, 4i64..]) {
        let mut c = controller();
        let mut fan = Fan::default();
        c.set(start, &mut fan).unwrap();
        let before = fan.writes.clone();

        prop_assert!(c.set(bad, &mut fan).is_err());
        prop_assert_eq!(fan.writes, before);
        prop_assert_eq!(i64::from(c.current().index), start);
    }

    #[test]
    fn accepted_index_writes_its_table_duty(index in 0i64..4) {
        let mut c = controller();
        let mut fan = Fan::default();
        let s = c.set(index, &mut fan).unwrap();
        let entry = SpeedTable::default_table().get(index as u8).copied().unwrap();
        prop_assert_eq!(fan.writes, vec![entry.duty_cycle_percent]);
        prop_assert_eq!(s.duty_cycle_percent, entry.duty_cycle_percent);
    }
}

// ── Validation ────────────────────────────────────────────────

proptest! {
    /// A reading inside the commanded band never causes a write.
    #[test]
    fn in_band_reading_is_quiet(index in 0u8..4, frac in 0.0f32..=1.0) {
        let table = SpeedTable::default_table();
        let band = table.get(index).and_then(|e| e.band).unwrap();
        let rpm = band.low as f32 + frac * (band.high - band.low) as f32;

        let mut c = controller();
        let mut fan = Fan::default();
        c.set(i64::from(index), &mut fan).unwrap();
        fan.writes.clear();

        let mut sink = Events::default();
        let verdict = RpmValidator::new(table).check(rpm, &mut c, &mut fan, &mut sink);
        prop_assert!(matches!(verdict, Verdict::InBand { .. }), "{:?}", verdict);
        prop_assert!(fan.writes.is_empty());
        prop_assert!(sink.0.is_empty());
    }

    /// Out of band: exactly one re-write of the same duty, index unchanged.
    #[test]
    fn out_of_band_reasserts_once(index in 1u8..4, above in any::<bool>(), delta in 1u32..500) {
        let table = SpeedTable::default_table();
        let band = table.get(index).and_then(|e| e.band).unwrap();
        let rpm = (if above { band.high + delta } else { band.low.saturating_sub(delta) }) as f32;

        let mut c = controller();
        let mut fan = Fan::default();
        let s = c.set(i64::from(index), &mut fan).unwrap();
        fan.writes.clear();

        let mut sink = Events::default();
        RpmValidator::new(table).check(rpm, &mut c, &mut fan, &mut sink);
        prop_assert_eq!(fan.writes, vec![s.duty_cycle_percent]);
        prop_assert_eq!(c.current().index, index);
        prop_assert_eq!(sink.0.len(), 1);
    }
}

// ── Smoothing ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn first_sample_is_returned_unchanged(window in 1usize..=MAX_WINDOW, x in -1.0e4f32..1.0e4) {
        let mut m = MovingAverage::new(window, 1.0);
        prop_assert_eq!(m.update(x), x);
    }

    /// After `window` identical samples the output equals that sample.
    #[test]
    fn converges_to_constant_input(
        window in 1usize..=MAX_WINDOW,
        seed in -100.0f32..100.0,
        x in -100.0f32..100.0,
    ) {
        let mut m = MovingAverage::new(window, 1.0);
        m.update(seed);
        let mut out = 0.0;
        for _ in 0..window {
            out = m.update(x);
        }
        prop_assert!((out - x).abs() < 1e-3, "{} vs {}", out, x);
    }

    #[test]
    fn output_stays_within_input_range(samples in proptest::collection::vec(0.0f32..50.0, 1..100)) {
        let mut m = MovingAverage::new(15, 1.0);
        for s in &samples {
            let v = m.update(*s);
            prop_assert!((-1e-3..=50.0 + 1e-3).contains(&v));
        }
    }
}

// ── Routing ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn unknown_paths_are_404(path in "/[a-zA-Z]{1,12}") {
        prop_assume!(path != "/status" && path != "/setFanSpeed");
        prop_assert_eq!(route(Method::Get, &path), Err(RouteError::NotFound));
    }

    #[test]
    fn query_string_is_ignored(q in "[a-z0-9=&]{0,16}") {
        let path = format!("/status?{}", q);
        prop_assert_eq!(route(Method::Get, &path), Ok(Route::Status));
    }
}

// ── Scheduler ─────────────────────────────────────────────────

#[derive(Default)]
struct Fired(Vec<TaskId>);

impl SchedulerDelegate for Fired {
    fn on_task_due(&mut self, _label: &str, task: TaskId) {
        self.0.push(task);
    }
}

proptest! {
    /// However coarse the ticking, a task fires at most once per tick and
    /// never more often than its interval allows.
    #[test]
    fn never_bursts_to_catch_up(interval in 10u32..2_000, steps in proptest::collection::vec(1u32..5_000, 1..60)) {
        let mut sched = Scheduler::new();
        sched.add(PeriodicTask {
            label: "power",
            task: TaskId::PowerSample,
            interval_ms: interval,
        });

        let mut now = 0u32;
        let mut fired = Fired::default();
        for step in steps {
            now += step;
            let before = fired.0.len();
            sched.tick(now, &mut fired);
            prop_assert!(fired.0.len() - before <= 1);
        }
        prop_assert!(fired.0.len() as u32 <= now / interval);
    }
}
