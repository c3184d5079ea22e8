//! The httpd-task ↔ control-loop bridge over the static channels.
//!
//! The channels are process-wide, so everything touching them lives in
//! one test.

use std::thread;
use std::time::{Duration, Instant};

use fanctl::remote::channels;
use fanctl::remote::surface::{ControlSurface, Method};

use crate::mock_hw::Rig;

#[test]
fn submitted_requests_are_answered_by_the_loop() {
    let client = thread::spawn(|| {
        let set = channels::submit(Method::Put, "/setFanSpeed", "2", Duration::from_secs(5));
        let status = channels::submit(Method::Get, "/status", "", Duration::from_secs(5));
        (set, status)
    });

    let mut rig = Rig::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut served = 0;
    while served < 2 && Instant::now() < deadline {
        served += channels::drain(|req| {
            ControlSurface::handle(req, &mut rig.app, &mut rig.fan, &mut rig.sink, &mut rig.telemetry)
        });
        thread::sleep(Duration::from_millis(5));
    }

    let (set, status) = client.join().unwrap();
    assert_eq!(served, 2);
    assert_eq!(set.status, 200);
    assert_eq!(status.status, 200);
    assert_ne!(set.seq, status.seq);
    let body: serde_json::Value = serde_json::from_str(status.body.as_str()).unwrap();
    assert_eq!(body["currentSpeed"], 2);

    // Nobody drains: the caller gives up with 503, and the loop must not
    // apply the command once it gets around to the mailbox.
    let writes = rig.fan.duty_writes.len();
    let late = channels::submit(Method::Put, "/setFanSpeed", "3", Duration::from_millis(50));
    assert_eq!(late.status, 503);
    let served = channels::drain(|req| {
        ControlSurface::handle(req, &mut rig.app, &mut rig.fan, &mut rig.sink, &mut rig.telemetry)
    });
    assert_eq!(served, 0);
    assert_eq!(rig.app.current_speed().index, 2);
    assert_eq!(rig.fan.duty_writes.len(), writes);
}
