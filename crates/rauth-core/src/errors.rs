//! Error types for the remote auth core.
//!
//! Each concern has its own error enum; [`CoreError`] unifies them for the
//! session driver and the caller-facing handle.

use thiserror::Error;

use rauth_crypto::CryptoError;
use rauth_proto::FrameError;

// ============================================================================
// Channel Errors
// ============================================================================

/// Failures of the persistent duplex connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Could not establish the connection (DNS, TCP, TLS, upgrade)
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Writing a frame failed
    #[error("send failed: {0}")]
    Send(String),

    /// Reading a frame failed
    #[error("receive failed: {0}")]
    Receive(String),

    /// Operation on a channel that is already closed
    #[error("channel closed")]
    Closed,
}

// ============================================================================
// Protocol Errors
// ============================================================================

/// Frames that do not conform to the gateway protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame could not be decoded
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// `hello` announced a zero heartbeat interval
    #[error("hello announced a zero heartbeat interval")]
    ZeroHeartbeatInterval,
}

// ============================================================================
// Login Exchange Errors
// ============================================================================

/// Failures of one ticket redemption. None of these close the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Request could not be sent or the response could not be read
    #[error("login request failed: {0}")]
    Http(String),

    /// Endpoint answered with a status this client does not handle
    #[error("login endpoint returned status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Expected status but the body did not match
    #[error("bad login response: {0}")]
    BadResponse(String),

    /// Endpoint asked for a challenge from a service this client cannot solve
    #[error("unsupported challenge service: {0}")]
    UnsupportedChallengeService(String),
}

// ============================================================================
// Challenge Errors
// ============================================================================

/// Caller-side challenge resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    /// `solve_challenge` was called without a challenge outstanding
    #[error("no challenge is pending")]
    NoChallengePending,

    /// The companion device canceled; no further login attempts are made
    #[error("session was canceled")]
    SessionCanceled,

    /// An answer was already submitted and its retry has not completed
    #[error("a challenge answer is already being checked")]
    RetryInFlight,
}

// ============================================================================
// Config Errors
// ============================================================================

/// Invalid client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A URL field has the wrong scheme or is empty
    #[error("invalid {field}: {reason}")]
    InvalidUrl {
        /// Config field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

// ============================================================================
// Unified Core Error
// ============================================================================

/// Unified error type for remote auth operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Transport failure
    #[error("connection error: {0}")]
    Channel(#[from] ChannelError),

    /// Key or ciphertext failure
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Non-conforming frame
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Ticket redemption failure
    #[error("login exchange error: {0}")]
    Login(#[from] LoginError),

    /// Challenge resolution misuse
    #[error("challenge error: {0}")]
    Challenge(#[from] ChallengeError),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The session task has already stopped
    #[error("session closed")]
    SessionClosed,
}

impl From<FrameError> for CoreError {
    fn from(e: FrameError) -> Self {
        CoreError::Protocol(ProtocolError::Frame(e))
    }
}

impl CoreError {
    /// Errors confined to a single inbound frame.
    ///
    /// With debug observability on these are logged and skipped; otherwise
    /// they end the session.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, CoreError::Crypto(_) | CoreError::Protocol(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_local_classification() {
        assert!(CoreError::Crypto(CryptoError::DecryptionFailed).is_frame_local());
        assert!(CoreError::from(FrameError::MissingOp).is_frame_local());
        assert!(CoreError::Protocol(ProtocolError::ZeroHeartbeatInterval).is_frame_local());

        assert!(!CoreError::Channel(ChannelError::Closed).is_frame_local());
        assert!(!CoreError::Login(LoginError::Http("reset".into())).is_frame_local());
        assert!(!CoreError::Challenge(ChallengeError::NoChallengePending).is_frame_local());
    }

    #[test]
    fn test_frame_error_converts_to_protocol() {
        let err: CoreError = FrameError::Json("eof".into()).into();
        assert!(matches!(
            err,
            CoreError::Protocol(ProtocolError::Frame(FrameError::Json(_)))
        ));
    }

    #[test]
    fn test_display_messages() {
        let err = CoreError::Login(LoginError::UnexpectedStatus {
            status: 429,
            body: "slow down".into(),
        });
        assert_eq!(
            err.to_string(),
            "login exchange error: login endpoint returned status 429: slow down"
        );
        assert_eq!(
            CoreError::Challenge(ChallengeError::NoChallengePending).to_string(),
            "challenge error: no challenge is pending"
        );
    }
}
