//! Fuzz target: `PUT /setFanSpeed` through `ControlSurface::handle`
//!
//! Feeds arbitrary bodies to the set-speed route and asserts that the
//! response is always 200 or 400, that a 400 never changes the commanded
//! speed, and that the commanded index always stays inside the table.
//!
//! cargo fuzz run fuzz_set_speed_body

#![no_main]

use fanctl::app::events::AppEvent;
use fanctl::app::ports::{EventSink, FanPort, TelemetrySink};
use fanctl::app::service::AppService;
use fanctl::app::telemetry::{TelemetryChannel, TelemetryValue};
use fanctl::config::SystemConfig;
use fanctl::control::speed_table::SpeedTable;
use fanctl::remote::surface::{ControlSurface, Method, RemoteRequest};
use libfuzzer_sys::fuzz_target;

struct Fan(u8);

impl FanPort for Fan {
    fn read_temperature_kelvin(&mut self) -> f32 {
        300.0
    }
    fn read_rpm(&mut self) -> u32 {
        0
    }
    fn set_duty_cycle(&mut self, percent: u8) {
        self.0 = percent;
    }
    fn duty_cycle(&mut self) -> u8 {
        self.0
    }
}

struct Null;

impl EventSink for Null {
    fn emit(&mut self, _event: &AppEvent) {}
}

impl TelemetrySink for Null {
    fn publish(&mut self, _channel: &TelemetryChannel, _value: TelemetryValue) {}
}

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    let mut app = AppService::new(&SystemConfig::default(), SpeedTable::default_table());
    let mut fan = Fan(0);
    app.start(&mut fan, &mut Null);
    let before = app.current_speed();

    let req = RemoteRequest::new(1, Method::Put, "/setFanSpeed", &body);
    let resp = ControlSurface::handle(&req, &mut app, &mut fan, &mut Null, &mut Null);

    let max = app.speed_table().max_index();
    assert!(app.current_speed().index <= max);
    match resp.status {
        200 => assert_eq!(fan.0, app.current_speed().duty_cycle_percent),
        400 => assert_eq!(app.current_speed(), before),
        other => panic!("unexpected status {other}"),
    }
});
