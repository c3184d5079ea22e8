//! HTTP control surface end to end, minus the socket.

use fanctl::app::events::AppEvent;
use fanctl::error::CommandError;
use fanctl::remote::surface::{ControlSurface, Method, RemoteRequest, RemoteResponse};

use crate::mock_hw::Rig;

fn send(rig: &mut Rig, method: Method, path: &str, body: &str) -> RemoteResponse {
    let req = RemoteRequest::new(7, method, path, body);
    ControlSurface::handle(&req, &mut rig.app, &mut rig.fan, &mut rig.sink, &mut rig.telemetry)
}

fn status(rig: &mut Rig) -> serde_json::Value {
    let resp = send(rig, Method::Get, "/status", "");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "application/json");
    serde_json::from_str(resp.body.as_str()).unwrap()
}

#[test]
fn put_speed_then_read_status() {
    let mut rig = Rig::new();
    let resp = send(&mut rig, Method::Put, "/setFanSpeed", "2");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.seq, 7);
    assert_eq!(resp.body.as_str(), "Fan speed set to 2 (70% duty)");
    assert_eq!(rig.fan.last_write(), Some(70));

    let s = status(&mut rig);
    assert_eq!(s["currentSpeed"], 2);
    assert!(s.get("currentRPM").is_some());
    assert!(s.get("currentTemp").is_some());
    assert!(s.get("currentPower").is_some());
}

#[test]
fn body_whitespace_is_ignored() {
    let mut rig = Rig::new();
    let resp = send(&mut rig, Method::Put, "/setFanSpeed", " 3\r\n");
    assert_eq!(resp.status, 200);
    assert_eq!(rig.app.current_speed().index, 3);
}

#[test]
fn out_of_range_speed_names_valid_range() {
    let mut rig = Rig::new();
    send(&mut rig, Method::Put, "/setFanSpeed", "1");

    let resp = send(&mut rig, Method::Put, "/setFanSpeed", "9");
    assert_eq!(resp.status, 400);
    assert!(resp.body.as_str().contains("0 to 3"), "{}", resp.body.as_str());
    assert_eq!(status(&mut rig)["currentSpeed"], 1);
}

#[test]
fn malformed_speed_is_rejected_not_zeroed() {
    let mut rig = Rig::new();
    send(&mut rig, Method::Put, "/setFanSpeed", "3");
    let writes = rig.fan.duty_writes.len();

    for body in ["fast", "", "1.5", "0x2"] {
        let resp = send(&mut rig, Method::Put, "/setFanSpeed", body);
        assert_eq!(resp.status, 400, "body {:?}", body);
        assert!(resp.body.as_str().contains("0 to 3"));
    }
    assert_eq!(rig.fan.duty_writes.len(), writes);
    assert_eq!(rig.app.current_speed().index, 3);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::CommandRejected(CommandError::MalformedSpeed { max: 3 })));
}

#[test]
fn oversized_body_is_rejected_not_cut() {
    use fanctl::remote::surface::BODY_LEN;

    let mut rig = Rig::new();
    send(&mut rig, Method::Put, "/setFanSpeed", "2");
    let writes = rig.fan.duty_writes.len();

    // Parses to 3 in full, but its first BODY_LEN bytes parse to 0.
    let body = format!("{}3", "0".repeat(BODY_LEN));
    let resp = send(&mut rig, Method::Put, "/setFanSpeed", &body);
    assert_eq!(resp.status, 400);
    assert!(resp.body.as_str().contains("0 to 3"), "{}", resp.body.as_str());
    assert_eq!(rig.fan.duty_writes.len(), writes);
    assert_eq!(rig.app.current_speed().index, 2);

    // Leading zeros that still fit are an ordinary integer.
    let body = format!("{}3", "0".repeat(BODY_LEN - 1));
    assert_eq!(send(&mut rig, Method::Put, "/setFanSpeed", &body).status, 200);
    assert_eq!(rig.app.current_speed().index, 3);
}

#[test]
fn index_serves_control_page() {
    let mut rig = Rig::new();
    let resp = send(&mut rig, Method::Get, "/", "");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "text/html");
    assert!(resp.body.as_str().contains("setFanSpeed"));
}

#[test]
fn unknown_path_and_wrong_method() {
    let mut rig = Rig::new();
    assert_eq!(send(&mut rig, Method::Get, "/nope", "").status, 404);
    assert_eq!(send(&mut rig, Method::Get, "/setFanSpeed", "").status, 405);
    assert_eq!(send(&mut rig, Method::Put, "/status", "").status, 405);
    assert_eq!(send(&mut rig, Method::Put, "/", "2").status, 405);
    assert_eq!(rig.app.current_speed().index, 0);
}
