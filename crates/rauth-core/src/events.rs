//! Notifications emitted to the caller.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use zeroize::Zeroizing;

pub use rauth_proto::UserIdentity;

/// Access token issued at the end of a successful login.
///
/// `Debug` is redacted; use [`AccessToken::expose`] to read the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// What a caller needs to hand the challenge to an external solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeRequest {
    /// Solver site key
    pub sitekey: String,
    /// Page the challenge is presented on
    pub page_url: String,
    /// Opaque data the solver must submit
    pub required_data: String,
    /// User agent the redemption requests are sent with
    pub user_agent: String,
    /// 0 for the first challenge of a ticket, incremented on each repeat
    pub retry_count: u32,
}

/// Why the session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CloseReason {
    /// The gateway closed the connection
    ClosedByPeer,
    /// The caller asked to disconnect
    Disconnected,
    /// An error ended the session
    Fatal(String),
}

/// Notifications from a running session, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteAuthEvent {
    /// Display this fingerprint (usually as a QR code of `url`).
    FingerprintReady { fingerprint: String, url: String },
    /// The companion device scanned the code.
    IdentityRevealed(UserIdentity),
    /// Redemption is blocked on a challenge; answer with `solve_challenge`.
    ChallengeRequired(ChallengeRequest),
    /// Login finished.
    TokenIssued(AccessToken),
    /// A redemption attempt failed; the connection stays open.
    LoginFailed { reason: String },
    /// The companion device canceled the login.
    Canceled,
    /// The session is over; no further events follow.
    Closed { reason: CloseReason },
    /// Every inbound frame, verbatim.
    RawFrame(serde_json::Value),
}

impl RemoteAuthEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteAuthEvent::FingerprintReady { .. } => "fingerprint_ready",
            RemoteAuthEvent::IdentityRevealed(_) => "identity_revealed",
            RemoteAuthEvent::ChallengeRequired(_) => "challenge_required",
            RemoteAuthEvent::TokenIssued(_) => "token_issued",
            RemoteAuthEvent::LoginFailed { .. } => "login_failed",
            RemoteAuthEvent::Canceled => "canceled",
            RemoteAuthEvent::Closed { .. } => "closed",
            RemoteAuthEvent::RawFrame(_) => "raw_frame",
        }
    }
}

/// Snapshot of session state for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub socket_state: crate::channel::SocketState,
    pub handshake: crate::handshake::HandshakeState,
    pub canceled: bool,
    /// Round trip of the last acknowledged liveness signal
    pub latency: Option<Duration>,
    /// Retry count of the outstanding challenge, if any
    pub challenge_retries: Option<u32>,
}

/// Sending half of the event stream.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<RemoteAuthEvent>,
}

/// Receiving half of the event stream.
pub type EventStream = mpsc::UnboundedReceiver<RemoteAuthEvent>;

impl EventSink {
    pub fn channel() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver an event. Dropped silently if the caller stopped listening.
    pub fn emit(&self, event: RemoteAuthEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            tracing::trace!(kind, "event receiver dropped");
        }
    }
}
