//! AppService against the mock fan: commands, button, tach validation
//! and telemetry.

use fanctl::app::commands::AppCommand;
use fanctl::app::events::{AppEvent, SpeedSource};
use fanctl::app::telemetry::{DUTY, POWER, RPM, SPEED, TelemetryValue};
use fanctl::config::SystemConfig;
use fanctl::control::tach_burst::{BurstPurpose, BurstReading};
use fanctl::error::CommandError;
use fanctl::events::{self, Event};

use crate::mock_hw::{MockFan, Rig};

fn set(rig: &mut Rig, index: i64) -> Result<u8, CommandError> {
    rig.app
        .handle_command(
            AppCommand::SetSpeed { index, source: SpeedSource::Remote },
            &mut rig.fan,
            &mut rig.sink,
            &mut rig.telemetry,
        )
        .map(|s| s.index)
}

/// Poll a default burst (9 samples, 50 ms apart) to completion.
fn run_burst(rig: &mut Rig, started_ms: u32) -> Option<BurstReading> {
    let mut reading = None;
    for i in 1..=9 {
        reading = rig.app.poll_tach(
            started_ms + 50 * i,
            &mut rig.fan,
            &mut rig.sink,
            &mut rig.telemetry,
        );
    }
    reading
}

// ── Startup and commands ──────────────────────────────────────

#[test]
fn startup_asserts_off() {
    let rig = Rig::new();
    assert_eq!(rig.fan.duty_writes, vec![0]);
    assert_eq!(rig.app.current_speed().index, 0);
    assert!(matches!(rig.sink.events[0], AppEvent::Started(s) if s.index == 0));
}

#[test]
fn set_speed_writes_duty_and_publishes() {
    let mut rig = Rig::new();
    assert_eq!(set(&mut rig, 2), Ok(2));
    assert_eq!(rig.fan.last_write(), Some(70));
    assert_eq!(rig.app.speed_reader().index(), 2);
    assert!(rig.sink.events.contains(&AppEvent::SpeedChanged {
        from: 0,
        to: rig.app.current_speed(),
        source: SpeedSource::Remote,
    }));
    assert_eq!(rig.telemetry.values_for(SPEED.path), vec![TelemetryValue::Int(2)]);
    assert_eq!(rig.telemetry.values_for(DUTY.path), vec![TelemetryValue::Int(70)]);
}

#[test]
fn out_of_range_is_rejected_without_side_effects() {
    let mut rig = Rig::new();
    set(&mut rig, 1).unwrap();
    let writes = rig.fan.duty_writes.len();

    for bad in [4, 9, -1, i64::MAX] {
        assert_eq!(
            set(&mut rig, bad),
            Err(CommandError::SpeedOutOfRange { requested: bad, max: 3 })
        );
    }
    assert_eq!(rig.fan.duty_writes.len(), writes);
    assert_eq!(rig.app.current_speed().index, 1);
}

// ── Button ────────────────────────────────────────────────────

#[test]
fn debounced_presses_cycle_and_wrap() {
    let mut rig = Rig::new();
    let edge = |rig: &mut Rig, level_high: bool, at: u32| {
        rig.app
            .on_button_edge(level_high, at, &mut rig.fan, &mut rig.sink, &mut rig.telemetry)
            .map(|s| s.index)
    };

    assert_eq!(edge(&mut rig, false, 1_000), Some(1));
    // Contact bounce inside the quiescence window.
    assert_eq!(edge(&mut rig, true, 1_020), None);
    assert_eq!(edge(&mut rig, false, 1_040), None);
    // Release, then three more presses.
    assert_eq!(edge(&mut rig, true, 1_500), None);
    assert_eq!(edge(&mut rig, false, 2_000), Some(2));
    assert_eq!(edge(&mut rig, true, 2_400), None);
    assert_eq!(edge(&mut rig, false, 2_800), Some(3));
    assert_eq!(edge(&mut rig, true, 3_200), None);
    assert_eq!(edge(&mut rig, false, 3_600), Some(0));

    assert_eq!(rig.fan.last_write(), Some(0));
    let presses = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ButtonPressed))
        .count();
    assert_eq!(presses, 4);
}

fn drain_button_edges(rig: &mut Rig) {
    events::drain_events(|event| {
        if let Event::ButtonEdge { level_high, at_ms } = event {
            rig.app
                .on_button_edge(level_high, at_ms, &mut rig.fan, &mut rig.sink, &mut rig.telemetry);
        }
    });
}

/// Edges go through the event queue the way the ISR delivers them, with the
/// loop draining in the middle of a bounce.  The event queue is
/// process-wide; no other test in this binary touches it.
#[test]
fn bounce_split_across_drains_still_presses_once() {
    let mut rig = Rig::new();
    events::drain_events(|_| {});

    assert!(events::push_event(Event::ButtonEdge { level_high: false, at_ms: 1_000 }));
    assert!(events::push_event(Event::ButtonEdge { level_high: true, at_ms: 1_002 }));
    drain_button_edges(&mut rig);
    assert!(events::push_event(Event::ButtonEdge { level_high: false, at_ms: 1_004 }));
    drain_button_edges(&mut rig);

    assert_eq!(rig.app.current_speed().index, 1);
    assert_eq!(rig.fan.duty_writes, vec![0, 63]);
}

// ── Tach validation ───────────────────────────────────────────

#[test]
fn out_of_band_rpm_reasserts_duty() {
    let mut rig = Rig::new();
    set(&mut rig, 2).unwrap();
    rig.fan = std::mem::take(&mut rig.fan).spinning_at(500);
    rig.fan.duty_writes.clear();

    rig.app.request_burst(BurstPurpose::Validation, 10_000);
    let reading = run_burst(&mut rig, 10_000).expect("burst completes");
    assert_eq!(reading.mean_rpm, 500.0);

    assert_eq!(rig.fan.duty_writes, vec![70]);
    assert_eq!(rig.app.current_speed().index, 2);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::RpmCorrection { setting, .. } if setting.index == 2
    )));
    // Validation alone publishes nothing.
    assert!(rig.telemetry.values_for(RPM.path).is_empty());
}

#[test]
fn in_band_rpm_leaves_fan_alone() {
    let mut rig = Rig::new();
    set(&mut rig, 3).unwrap();
    let writes = rig.fan.duty_writes.clone();
    rig.fan.rpm = [1_800].into();

    rig.app.request_burst(BurstPurpose::Validation, 0);
    run_burst(&mut rig, 0).expect("burst completes");
    assert_eq!(rig.fan.duty_writes, writes);
    assert!(!rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::RpmCorrection { .. })));
}

#[test]
fn burst_averages_and_publishes_rpm() {
    let mut rig = Rig::new();
    rig.fan.rpm = [1_000, 1_100, 1_200, 1_000, 1_100, 1_200, 1_000, 1_100, 1_200].into();

    rig.app.request_burst(BurstPurpose::Telemetry, 0);
    assert!(rig.app.is_sampling_tach());
    let reading = run_burst(&mut rig, 0).expect("burst completes");
    assert!(!rig.app.is_sampling_tach());
    assert_eq!(reading.mean_rpm, 1_100.0);
    assert_eq!(rig.telemetry.values_for(RPM.path), vec![TelemetryValue::Int(1_100)]);
    assert_eq!(rig.app.status().current_rpm, 1_100.0);
}

#[test]
fn overlapping_requests_share_one_burst() {
    let mut rig = Rig::new();
    rig.app.request_burst(BurstPurpose::Telemetry, 0);
    rig.app.request_burst(BurstPurpose::Validation, 20);
    let reading = run_burst(&mut rig, 0).expect("burst completes");
    assert!(reading.purposes.contains(BurstPurpose::Telemetry));
    assert!(reading.purposes.contains(BurstPurpose::Validation));
    assert_eq!(rig.telemetry.values_for(RPM.path).len(), 1);
}

// ── Sensors ───────────────────────────────────────────────────

#[test]
fn power_is_smoothed_from_first_sample() {
    let mut rig = Rig::new();
    rig.fan.power_w = 10.0;
    rig.app.sample_power(&mut rig.fan, &mut rig.telemetry);
    rig.fan.power_w = 40.0;
    rig.app.sample_power(&mut rig.fan, &mut rig.telemetry);

    let v = rig.telemetry.values_for(POWER.path);
    assert_eq!(v[0], TelemetryValue::Float(10.0));
    // 14 seeded samples of 10 W plus one of 40 W over a 15-sample window.
    let TelemetryValue::Float(second) = v[1] else {
        panic!("power is published as a float");
    };
    assert!((second - 12.0).abs() < 1e-4);
}

#[test]
fn status_reports_celsius_and_latest_readings() {
    let mut rig = Rig::new();
    set(&mut rig, 1).unwrap();
    rig.fan.temperature_k = 308.15;
    rig.app.sample_fan(&mut rig.fan, &mut rig.telemetry);

    let status = rig.app.status();
    assert_eq!(status.current_speed, 1);
    assert!((status.current_temp - 35.0).abs() < 1e-3);
}

#[test]
fn rpm_filter_publishes_float_when_enabled() {
    let config = SystemConfig { rpm_avg_window: 4, ..SystemConfig::default() };
    let mut rig = Rig::with_config(&config);
    rig.fan = MockFan::new().spinning_at(800);

    rig.app.request_burst(BurstPurpose::Telemetry, 0);
    run_burst(&mut rig, 0).expect("burst completes");
    assert_eq!(rig.telemetry.values_for(RPM.path), vec![TelemetryValue::Float(800.0)]);
}

#[test]
fn rpm_ema_smooths_successive_bursts() {
    let config = SystemConfig { rpm_ema_alpha: 0.5, ..SystemConfig::default() };
    let mut rig = Rig::with_config(&config);
    rig.fan = MockFan::new().spinning_at(800);

    rig.app.request_burst(BurstPurpose::Telemetry, 0);
    run_burst(&mut rig, 0).expect("first burst completes");
    rig.fan.rpm = [1_000].into();
    rig.app.request_burst(BurstPurpose::Telemetry, 1_200);
    run_burst(&mut rig, 1_200).expect("second burst completes");

    assert_eq!(
        rig.telemetry.values_for(RPM.path),
        vec![TelemetryValue::Float(800.0), TelemetryValue::Float(900.0)]
    );
}
