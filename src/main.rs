//! Stepped fan controller firmware: main entry point.
//!
//! Hexagonal architecture with a single-threaded, event-driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink      SignalKSink          │
//! │  (PowerMeter + Fan)     (EventSink)       (TelemetrySink)      │
//! │  WifiAdapter  MdnsAdapter  EspHttpServer ── remote::channels   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  SpeedController · RpmValidator · TachBurst · filters  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · button ISR → event queue        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use fanctl::adapters::hardware::HardwareAdapter;
use fanctl::adapters::log_sink::{LogEventSink, LogTelemetrySink};
use fanctl::adapters::mdns::MdnsAdapter;
use fanctl::adapters::signalk::{Resolver, SignalKSink, UdpTransport};
use fanctl::adapters::time::MonotonicClock;
use fanctl::adapters::wifi::{ConnectivityPort, WifiAdapter};
use fanctl::app::ports::{SchedulerDelegate, TaskId, TelemetrySink};
use fanctl::app::service::AppService;
use fanctl::app::telemetry::{TelemetryChannel, TelemetryValue};
use fanctl::config::SystemConfig;
use fanctl::control::speed_table::SpeedTable;
use fanctl::control::tach_burst::BurstPurpose;
use fanctl::drivers::emc2101::Emc2101;
use fanctl::drivers::ina260::Ina260;
use fanctl::drivers::{hw_init, watchdog::Watchdog};
use fanctl::error::Error;
use fanctl::events::{self, Event, push_event};
use fanctl::pins;
use fanctl::remote::{self, channels, surface::ControlSurface};
use fanctl::scheduler::Scheduler;

/// Delay between Signal K connection attempts while on the log fallback.
const SIGNALK_RETRY_MS: u32 = 30_000;

// ── Scheduler delegate ────────────────────────────────────────
//
// The scheduler knows nothing about the event system; this impl turns a
// due task into the matching event on the lock-free queue.

struct EventQueueDelegate;

impl SchedulerDelegate for EventQueueDelegate {
    fn on_task_due(&mut self, _label: &str, task: TaskId) {
        if !push_event(Event::from(task)) {
            warn!("SCHED | event queue full, dropped {:?}", task);
        }
    }
}

// ── Telemetry routing ─────────────────────────────────────────

/// Signal K once the server is reachable, the serial log until then.
enum Telemetry {
    SignalK(SignalKSink<UdpTransport>),
    Log(LogTelemetrySink),
}

impl Telemetry {
    fn open(addr: SocketAddr, config: &SystemConfig) -> Self {
        match UdpTransport::open(addr) {
            Ok(t) => Self::SignalK(SignalKSink::new(t, &config.hostname)),
            Err(e) => {
                warn!("TELEM | Signal K socket to {} unavailable ({}), logging only", addr, e);
                Self::Log(LogTelemetrySink)
            }
        }
    }

    fn is_fallback(&self) -> bool {
        matches!(self, Self::Log(_))
    }
}

impl TelemetrySink for Telemetry {
    fn publish(&mut self, channel: &TelemetryChannel, value: TelemetryValue) {
        match self {
            Self::SignalK(s) => s.publish(channel, value),
            Self::Log(s) => s.publish(channel, value),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("fanctl v{} starting", env!("CARGO_PKG_VERSION"));

    let config = SystemConfig::load().map_err(Error::from)?;
    let clock = MonotonicClock::new();

    // ── 2. Hardware ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    let i2c = hw_init::init_i2c(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
    )?;
    let mut hw = HardwareAdapter::new(
        i2c,
        Ina260::new(pins::INA260_ADDRESS),
        Emc2101::new(pins::EMC2101_ADDRESS),
    );
    if let Err(e) = hw.init() {
        // Keep running: reads fall back to last-good values and the
        // duty writes are retried on every command.
        warn!("BUS | device init failed: {}", e);
    }
    if let Err(e) = hw_init::init_button_isr() {
        warn!("BUTTON | ISR unavailable ({}), button disabled", e);
    }
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 3. Network ────────────────────────────────────────────
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;
    let mut mdns = MdnsAdapter::new(&config.hostname, config.http_port);
    if config.wifi_ssid.is_empty() {
        warn!("WiFi: no SSID configured, running offline");
    } else {
        wifi.set_credentials(&config.wifi_ssid, &config.wifi_password)?;
        if wifi.connect(clock.now_ms()).is_err() {
            warn!("WiFi: offline at boot, retrying in the background");
        }
    }

    // Name lookup happens off the loop; until it lands, telemetry goes to
    // the serial log.
    let resolver = Resolver::spawn(
        &config.signalk_host,
        config.signalk_udp_port,
        Duration::from_millis(u64::from(SIGNALK_RETRY_MS)),
    )?;
    let mut signalk_addr: Option<SocketAddr> = None;
    let mut telemetry = Telemetry::Log(LogTelemetrySink);
    let mut last_signalk_attempt = clock.now_ms();

    let _http = remote::http::start(config.http_port, config.request_timeout_ms)?;

    // ── 4. Application core ───────────────────────────────────
    let mut log_sink = LogEventSink::new();
    let mut app = AppService::new(&config, SpeedTable::default_table());
    app.start(&mut hw, &mut log_sink);

    let mut sched = Scheduler::from_config(&config, clock.now_ms());
    let mut sched_delegate = EventQueueDelegate;

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();
        sched.tick(now_ms, &mut sched_delegate);

        events::drain_events(|event| match event {
            Event::ButtonEdge { level_high, at_ms } => {
                app.on_button_edge(level_high, at_ms, &mut hw, &mut log_sink, &mut telemetry);
            }
            Event::PowerSampleTick => app.sample_power(&mut hw, &mut telemetry),
            Event::FanSampleTick => app.sample_fan(&mut hw, &mut telemetry),
            Event::TachSampleTick => app.request_burst(BurstPurpose::Telemetry, now_ms),
            Event::ValidateTick => app.request_burst(BurstPurpose::Validation, now_ms),
            Event::RemotePollTick => {
                channels::drain(|req| {
                    ControlSurface::handle(req, &mut app, &mut hw, &mut log_sink, &mut telemetry)
                });
            }
        });

        app.poll_tach(now_ms, &mut hw, &mut log_sink, &mut telemetry);

        wifi.poll(now_ms);
        if wifi.is_connected() {
            mdns.start();
        }
        if telemetry.is_fallback() {
            if let Some(addr) = resolver.try_take() {
                signalk_addr = Some(addr);
                last_signalk_attempt = now_ms;
                telemetry = Telemetry::open(addr, &config);
            } else if let Some(addr) = signalk_addr {
                if now_ms.wrapping_sub(last_signalk_attempt) >= SIGNALK_RETRY_MS {
                    last_signalk_attempt = now_ms;
                    telemetry = Telemetry::open(addr, &config);
                }
            }
        }

        watchdog.feed();
        FreeRtos::delay_ms(config.loop_tick_ms);
    }
}
