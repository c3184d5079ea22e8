//! Inter-task channels between the HTTP server task and the control loop.
//!
//! Uses `embassy-sync` bounded channels so the httpd task never touches
//! controller state.  Both sides share these static channels without
//! heap allocation.
//!
//! ```text
//! ┌──────────────┐ RemoteRequest  ┌──────────────┐
//! │  httpd task  │──────────────▶│ Control Loop │
//! │  (blocking)  │◀──────────────│  (RemotePoll) │
//! └──────────────┘ RemoteResponse └──────────────┘
//! ```
//!
//! The ESP-IDF httpd runs handlers one at a time, so at most one caller
//! waits on the response channel.  A response whose sequence number does
//! not match (left behind by a caller that already timed out) is dropped.
//! A request whose caller timed out is discarded unserved, so a client told
//! 503 never sees its command applied later.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use super::surface::{Method, RemoteRequest, RemoteResponse};

/// Channel depth for requests (inbound).
const REQ_DEPTH: usize = 4;

/// Channel depth for responses (outbound).
const RESP_DEPTH: usize = 4;

/// Inbound request channel: httpd task → control loop.
pub static REQ_CHANNEL: Channel<CriticalSectionRawMutex, RemoteRequest, REQ_DEPTH> = Channel::new();

/// Outbound response channel: control loop → httpd task.
pub static RESP_CHANNEL: Channel<CriticalSectionRawMutex, RemoteResponse, RESP_DEPTH> = Channel::new();

static NEXT_SEQ: AtomicU32 = AtomicU32::new(1);

/// Highest sequence number whose caller gave up waiting.  Sequence numbers
/// rise monotonically and the httpd task submits one at a time, so every
/// request at or below this mark is abandoned.
static ABANDONED_THROUGH: AtomicU32 = AtomicU32::new(0);

/// Post a request and block until the control loop answers or `timeout`
/// elapses.  A full mailbox or a timeout yields `503`.
pub fn submit(method: Method, path: &str, body: &str, timeout: Duration) -> RemoteResponse {
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    let request = RemoteRequest::new(seq, method, path, body);

    if REQ_CHANNEL.try_send(request).is_err() {
        warn!("HTTP | request mailbox full, rejecting seq {}", seq);
        return RemoteResponse::unavailable(seq);
    }

    let wait = async {
        loop {
            let resp = RESP_CHANNEL.receive().await;
            if resp.seq == seq {
                break Some(resp);
            }
            debug!("HTTP | dropping stale response seq {} (want {})", resp.seq, seq);
        }
    };
    let timer = async {
        async_io_mini::Timer::after(timeout).await;
        None
    };

    futures_lite::future::block_on(futures_lite::future::or(wait, timer)).unwrap_or_else(|| {
        warn!("HTTP | control loop did not answer seq {} in {:?}", seq, timeout);
        ABANDONED_THROUGH.fetch_max(seq, Ordering::AcqRel);
        RemoteResponse::unavailable(seq)
    })
}

/// Control-loop side: answer every pending request.  Abandoned requests are
/// dropped without reaching `handler` and are not counted.
pub fn drain(mut handler: impl FnMut(&RemoteRequest) -> RemoteResponse) -> usize {
    let mut served = 0;
    while let Ok(request) = REQ_CHANNEL.try_receive() {
        if request.seq <= ABANDONED_THROUGH.load(Ordering::Acquire) {
            debug!("HTTP | discarding abandoned request seq {}", request.seq);
            continue;
        }
        let response = handler(&request);
        if RESP_CHANNEL.try_send(response).is_err() {
            warn!("HTTP | response channel full, dropping seq {}", request.seq);
        }
        served += 1;
    }
    served
}
