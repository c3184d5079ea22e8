//! Signal K delta publisher.
//!
//! Implements [`TelemetrySink`] by serialising each publication as a
//! Signal K delta and handing it to a [`DeltaTransport`]:
//!
//! ```json
//! {"context":"vessels.self",
//!  "updates":[{"$source":"stb_fan_control",
//!              "values":[{"path":"sensors.stb_fan_power","value":12.5}],
//!              "meta":[{"path":"sensors.stb_fan_power",
//!                       "value":{"units":"W","description":"Stb Fan Watts"}}]}]}
//! ```
//!
//! The `meta` entry is only sent with the first publication of each path.
//!
//! Resolving the server name can block for seconds, so it runs on its own
//! thread ([`Resolver`]) and the control loop only ever polls for the
//! result.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::TelemetrySink;
use crate::app::telemetry::{TelemetryChannel, TelemetryValue};

const CONTEXT: &str = "vessels.self";

/// Paths remembered as announced.
const MAX_PATHS: usize = 8;

/// Datagram-oriented delta transport.
pub trait DeltaTransport {
    type Error: core::fmt::Display;

    fn send(&mut self, delta: &[u8]) -> Result<(), Self::Error>;
}

// ── Wire format ───────────────────────────────────────────────

#[derive(Serialize)]
struct Delta<'a> {
    context: &'a str,
    updates: [Update<'a>; 1],
}

#[derive(Serialize)]
struct Update<'a> {
    #[serde(rename = "$source")]
    source: &'a str,
    values: [PathValue<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<[Meta<'a>; 1]>,
}

#[derive(Serialize)]
struct PathValue<'a> {
    path: &'a str,
    value: TelemetryValue,
}

#[derive(Serialize)]
struct Meta<'a> {
    path: &'a str,
    value: MetaValue<'a>,
}

#[derive(Serialize)]
struct MetaValue<'a> {
    units: &'a str,
    description: &'a str,
}

/// Serialise one delta for `channel`, with metadata when `with_meta`.
pub fn encode_delta(
    source: &str,
    channel: &TelemetryChannel,
    value: TelemetryValue,
    with_meta: bool,
) -> serde_json::Result<Vec<u8>> {
    let meta = with_meta.then(|| {
        [Meta {
            path: channel.path,
            value: MetaValue {
                units: channel.unit,
                description: channel.description,
            },
        }]
    });
    serde_json::to_vec(&Delta {
        context: CONTEXT,
        updates: [Update {
            source,
            values: [PathValue { path: channel.path, value }],
            meta,
        }],
    })
}

// ── Sink ──────────────────────────────────────────────────────

pub struct SignalKSink<T: DeltaTransport> {
    transport: T,
    source: heapless::String<32>,
    announced: heapless::Vec<&'static str, MAX_PATHS>,
    failing: bool,
}

impl<T: DeltaTransport> SignalKSink<T> {
    pub fn new(transport: T, source: &str) -> Self {
        let mut label = heapless::String::new();
        for c in source.chars() {
            if label.push(c).is_err() {
                break;
            }
        }
        Self {
            transport,
            source: label,
            announced: heapless::Vec::new(),
            failing: false,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn needs_meta(&self, path: &str) -> bool {
        !self.announced.iter().any(|p| *p == path)
    }
}

impl<T: DeltaTransport> TelemetrySink for SignalKSink<T> {
    fn publish(&mut self, channel: &TelemetryChannel, value: TelemetryValue) {
        let with_meta = self.needs_meta(channel.path);
        let delta = match encode_delta(&self.source, channel, value, with_meta) {
            Ok(d) => d,
            Err(e) => {
                warn!("TELEM | encode {} failed: {}", channel.path, e);
                return;
            }
        };

        match self.transport.send(&delta) {
            Ok(()) => {
                if with_meta {
                    // Unknown paths beyond capacity just keep re-sending meta.
                    let _ = self.announced.push(channel.path);
                }
                if self.failing {
                    info!("TELEM | Signal K delivery restored");
                    self.failing = false;
                }
            }
            Err(e) => {
                if !self.failing {
                    warn!("TELEM | Signal K send failed: {}", e);
                    self.failing = true;
                }
            }
        }
    }
}

// ── UDP transport ─────────────────────────────────────────────

/// Sends each delta as one datagram to the Signal K server.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind an ephemeral local port aimed at an already-resolved server.
    /// Never touches DNS.
    pub fn open(addr: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(addr)?;
        socket.set_nonblocking(true)?;
        info!("TELEM | Signal K deltas -> udp://{}", addr);
        Ok(Self { socket })
    }
}

/// First IPv4 address for `host:port`.  Blocking.
pub fn resolve(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no IPv4 address"))
}

// ── Background resolver ───────────────────────────────────────

/// Resolves the Signal K server on a helper thread, retrying every
/// `retry` until a lookup succeeds, then exits.
pub struct Resolver {
    found: Arc<Signal<CriticalSectionRawMutex, SocketAddr>>,
}

impl Resolver {
    pub fn spawn(host: &str, port: u16, retry: Duration) -> std::io::Result<Self> {
        let found = Arc::new(Signal::new());
        let tx = Arc::clone(&found);
        let host = host.to_owned();
        std::thread::Builder::new()
            .name("signalk-dns".into())
            .stack_size(6 * 1024)
            .spawn(move || loop {
                match resolve(&host, port) {
                    Ok(addr) => {
                        debug!("TELEM | {} resolved to {}", host, addr);
                        tx.signal(addr);
                        break;
                    }
                    Err(e) => {
                        debug!("TELEM | resolving {} failed: {}", host, e);
                        std::thread::sleep(retry);
                    }
                }
            })?;
        Ok(Self { found })
    }

    /// The resolved address, once.  Never blocks.
    pub fn try_take(&self) -> Option<SocketAddr> {
        self.found.try_take()
    }
}

impl DeltaTransport for UdpTransport {
    type Error = std::io::Error;

    fn send(&mut self, delta: &[u8]) -> Result<(), Self::Error> {
        self.socket.send(delta).map(|_| ())
    }
}
