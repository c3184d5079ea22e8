//! HTTP control surface, independent of any server.
//!
//! | Method | Path           | Result                                   |
//! |--------|----------------|------------------------------------------|
//! | GET    | `/`            | static control page                      |
//! | PUT    | `/setFanSpeed` | body = speed index; 200 or 400           |
//! | GET    | `/status`      | JSON snapshot of speed, rpm, temp, power |
//!
//! A known path with the wrong method yields 405, anything else 404.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::commands::AppCommand;
use crate::app::events::{AppEvent, SpeedSource};
use crate::app::ports::{EventSink, FanPort, TelemetrySink};
use crate::app::service::AppService;
use crate::error::CommandError;

/// Static control page.
pub const CONTROL_PAGE: &str = include_str!("../../assets/control.html");

pub const PATH_LEN: usize = 32;
pub const BODY_LEN: usize = 64;
pub const RESPONSE_LEN: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    SetFanSpeed,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

impl RouteError {
    pub fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }
}

/// Resolve a request line to a route.
pub fn route(method: Method, path: &str) -> Result<Route, RouteError> {
    // Ignore any query string.
    let path = path.split('?').next().unwrap_or(path);
    let (route, allowed) = match path {
        "/" => (Route::Index, Method::Get),
        "/setFanSpeed" => (Route::SetFanSpeed, Method::Put),
        "/status" => (Route::Status, Method::Get),
        _ => return Err(RouteError::NotFound),
    };
    if method == allowed {
        Ok(route)
    } else {
        Err(RouteError::MethodNotAllowed)
    }
}

/// Inbound request as handed to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    /// Correlates the response with the waiting handler.
    pub seq: u32,
    pub method: Method,
    pub path: heapless::String<PATH_LEN>,
    pub body: heapless::String<BODY_LEN>,
    /// The body did not fit in `BODY_LEN` bytes; `body` holds only a prefix.
    pub body_overflow: bool,
}

impl RemoteRequest {
    /// Build a request; path and body are truncated to capacity.
    pub fn new(seq: u32, method: Method, path: &str, body: &str) -> Self {
        let kept: heapless::String<BODY_LEN> = truncated(body);
        Self {
            seq,
            method,
            path: truncated(path),
            body_overflow: kept.len() < body.len(),
            body: kept,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Static(&'static str),
    Text(heapless::String<RESPONSE_LEN>),
}

impl ResponseBody {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Static(s) => s,
            Self::Text(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub seq: u32,
    pub status: u16,
    pub content_type: &'static str,
    pub body: ResponseBody,
}

impl RemoteResponse {
    pub fn text(seq: u32, status: u16, body: &str) -> Self {
        Self {
            seq,
            status,
            content_type: "text/plain",
            body: ResponseBody::Text(truncated(body)),
        }
    }

    pub fn page(seq: u32) -> Self {
        Self {
            seq,
            status: 200,
            content_type: "text/html",
            body: ResponseBody::Static(CONTROL_PAGE),
        }
    }

    pub fn json(seq: u32, body: heapless::String<RESPONSE_LEN>) -> Self {
        Self {
            seq,
            status: 200,
            content_type: "application/json",
            body: ResponseBody::Text(body),
        }
    }

    pub fn route_error(seq: u32, err: RouteError) -> Self {
        let msg = match err {
            RouteError::NotFound => "Not found",
            RouteError::MethodNotAllowed => "Method not allowed",
        };
        Self::text(seq, err.status(), msg)
    }

    /// The control loop did not answer in time.
    pub fn unavailable(seq: u32) -> Self {
        Self::text(seq, 503, "Controller busy, try again")
    }
}

// ───────────────────────────────────────────────────────────────
// ControlSurface
// ───────────────────────────────────────────────────────────────

pub struct ControlSurface;

impl ControlSurface {
    /// Serve one request against the application core.  Runs on the
    /// control loop.
    pub fn handle(
        req: &RemoteRequest,
        app: &mut AppService,
        fan: &mut impl FanPort,
        sink: &mut impl EventSink,
        telemetry: &mut impl TelemetrySink,
    ) -> RemoteResponse {
        match route(req.method, &req.path) {
            Ok(Route::Index) => RemoteResponse::page(req.seq),
            Ok(Route::SetFanSpeed) => Self::set_fan_speed(req, app, fan, sink, telemetry),
            Ok(Route::Status) => Self::status(req.seq, app),
            Err(e) => {
                info!("HTTP | {:?} {} -> {}", req.method, req.path, e.status());
                RemoteResponse::route_error(req.seq, e)
            }
        }
    }

    fn set_fan_speed(
        req: &RemoteRequest,
        app: &mut AppService,
        fan: &mut impl FanPort,
        sink: &mut impl EventSink,
        telemetry: &mut impl TelemetrySink,
    ) -> RemoteResponse {
        let max = app.speed_table().max_index();
        let raw = req.body.trim();

        // A cut-off body could parse to a different, valid index.
        let parsed = if req.body_overflow { None } else { raw.parse::<i64>().ok() };
        let Some(index) = parsed else {
            warn!("HTTP | malformed speed body '{}' (overflow: {})", raw, req.body_overflow);
            sink.emit(&AppEvent::CommandRejected(
                CommandError::MalformedSpeed { max },
            ));
            let mut msg = heapless::String::<RESPONSE_LEN>::new();
            if req.body_overflow {
                let _ = write!(msg, "Speed value too long. Valid range is 0 to {max}");
            } else {
                let _ = write!(msg, "Invalid speed value '{raw}'. Valid range is 0 to {max}");
            }
            return RemoteResponse::text(req.seq, 400, &msg);
        };

        let cmd = AppCommand::SetSpeed { index, source: SpeedSource::Remote };
        let mut msg = heapless::String::<RESPONSE_LEN>::new();
        match app.handle_command(cmd, fan, sink, telemetry) {
            Ok(s) => {
                let _ = write!(
                    msg,
                    "Fan speed set to {} ({}% duty)",
                    s.index, s.duty_cycle_percent
                );
                RemoteResponse::text(req.seq, 200, &msg)
            }
            Err(_) => {
                let _ = write!(msg, "Invalid speed {index}. Valid range is 0 to {max}");
                RemoteResponse::text(req.seq, 400, &msg)
            }
        }
    }

    fn status(seq: u32, app: &AppService) -> RemoteResponse {
        match serde_json::to_string(&app.status()) {
            Ok(json) => RemoteResponse::json(seq, truncated(&json)),
            Err(e) => {
                warn!("HTTP | status serialisation failed: {}", e);
                RemoteResponse::text(seq, 500, "Status unavailable")
            }
        }
    }
}

/// Copy as much of `s` as fits, cutting on a char boundary.
fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
