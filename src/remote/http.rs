//! ESP-IDF HTTP server adapter.
//!
//! Handlers run on the httpd task.  The static page is written straight
//! from flash; every other request is forwarded through
//! [`channels::submit`] and answered by the control loop.  Unregistered
//! paths get the server's own 404.

use core::time::Duration;

use esp_idf_svc::http::Method as HttpMethod;
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::io::{Read, Write};
use log::info;

use super::channels;
use super::surface::{BODY_LEN, CONTROL_PAGE, Method};

/// Paths routed to the control loop; both methods are registered so the
/// surface can answer 405 itself.
const FORWARDED: [&str; 2] = ["/setFanSpeed", "/status"];

pub fn start(port: u16, timeout_ms: u32) -> anyhow::Result<EspHttpServer<'static>> {
    let config = Configuration {
        http_port: port,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&config)?;
    let timeout = Duration::from_millis(u64::from(timeout_ms));

    server.fn_handler("/", HttpMethod::Get, |req| {
        req.into_response(200, None, &[("Content-Type", "text/html")])?
            .write_all(CONTROL_PAGE.as_bytes())
    })?;
    server.fn_handler("/", HttpMethod::Put, move |req| forward(req, Method::Put, timeout))?;

    for path in FORWARDED {
        server.fn_handler(path, HttpMethod::Get, move |req| forward(req, Method::Get, timeout))?;
        server.fn_handler(path, HttpMethod::Put, move |req| forward(req, Method::Put, timeout))?;
    }

    info!("HTTP | control surface listening on :{}", port);
    Ok(server)
}

fn forward(
    mut req: Request<&mut EspHttpConnection<'_>>,
    method: Method,
    timeout: Duration,
) -> Result<(), esp_idf_svc::io::EspIOError> {
    // One byte past capacity so an oversized body is flagged, not cut.
    let mut buf = [0u8; BODY_LEN + 1];
    let mut len = 0;
    while len < buf.len() {
        let n = req.read(&mut buf[len..])?;
        if n == 0 {
            break;
        }
        len += n;
    }
    let body = core::str::from_utf8(&buf[..len]).unwrap_or("");

    let path = req.uri().split('?').next().unwrap_or("/");
    let mut path_buf = heapless::String::<{ super::surface::PATH_LEN }>::new();
    let _ = path_buf.push_str(path);

    let resp = channels::submit(method, &path_buf, body, timeout);
    req.into_response(resp.status, None, &[("Content-Type", resp.content_type)])?
        .write_all(resp.body.as_str().as_bytes())
}
