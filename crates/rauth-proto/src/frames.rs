//! Gateway frames.
//!
//! Every frame is a JSON object tagged by its `op` field. Inbound frames that
//! carry an unrecognised `op` decode to [`InboundFrame::Unknown`] rather than
//! failing, so they can still be traced by the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while decoding or encoding a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame text is not valid JSON
    #[error("frame is not valid JSON: {0}")]
    Json(String),

    /// Frame is JSON but has no string `op` field
    #[error("frame has no op tag")]
    MissingOp,

    /// A known frame is missing a field or has one of the wrong type
    #[error("malformed {op} frame: {reason}")]
    Malformed {
        /// Tag of the offending frame
        op: String,
        /// Decoder message
        reason: String,
    },

    /// Outbound frame could not be serialized
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Frames sent by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InboundFrame {
    /// First frame of a connection; starts the handshake.
    Hello {
        /// Liveness signal period in milliseconds
        heartbeat_interval: u64,
        /// Server side session lifetime in milliseconds
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Nonce encrypted to the advertised public key.
    NonceProof {
        /// Base64 RSA-OAEP ciphertext
        encrypted_nonce: String,
    },
    /// Fingerprint for the companion device to scan.
    PendingRemoteInit {
        /// Opaque fingerprint string
        fingerprint: String,
    },
    /// Companion device scanned the code; carries the user record.
    PendingTicket {
        /// Base64 RSA-OAEP ciphertext of `id:discriminator:avatar:username`
        encrypted_user_payload: String,
    },
    /// Companion device confirmed the login.
    PendingLogin {
        /// One-time ticket to redeem for a token
        ticket: String,
    },
    /// Companion device rejected the login.
    Cancel,
    /// Reply to a liveness signal.
    HeartbeatAck,
    /// Any tag this client does not understand.
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Decode a parsed JSON value into a typed frame.
    pub fn from_raw(raw: &Value) -> Result<Self, FrameError> {
        let op = op_of(raw).ok_or(FrameError::MissingOp)?;
        InboundFrame::deserialize(raw).map_err(|e| FrameError::Malformed {
            op: op.to_string(),
            reason: e.to_string(),
        })
    }

    /// Tag name for logging. Unknown frames report `"unknown"`.
    pub fn op(&self) -> &'static str {
        match self {
            InboundFrame::Hello { .. } => "hello",
            InboundFrame::NonceProof { .. } => "nonce_proof",
            InboundFrame::PendingRemoteInit { .. } => "pending_remote_init",
            InboundFrame::PendingTicket { .. } => "pending_ticket",
            InboundFrame::PendingLogin { .. } => "pending_login",
            InboundFrame::Cancel => "cancel",
            InboundFrame::HeartbeatAck => "heartbeat_ack",
            InboundFrame::Unknown => "unknown",
        }
    }
}

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Advertises the session public key (SPKI DER, base64, no PEM armour).
    Init {
        /// Single-line public key encoding
        encoded_public_key: String,
    },
    /// Proves possession of the private key.
    NonceProof {
        /// Unpadded URL-safe base64 SHA-256 of the decrypted nonce
        proof: String,
    },
    /// Liveness signal.
    Heartbeat,
}

impl OutboundFrame {
    /// Serialize to frame text.
    pub fn encode(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(|e| FrameError::Encode(e.to_string()))
    }

    /// Tag name for logging.
    pub fn op(&self) -> &'static str {
        match self {
            OutboundFrame::Init { .. } => "init",
            OutboundFrame::NonceProof { .. } => "nonce_proof",
            OutboundFrame::Heartbeat => "heartbeat",
        }
    }
}

/// Parse frame text into a JSON object.
///
/// The raw value is kept alongside the typed frame so the caller can observe
/// the frame verbatim.
pub fn decode_frame(text: &str) -> Result<Value, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(|e| FrameError::Json(e.to_string()))?;
    if op_of(&value).is_none() {
        return Err(FrameError::MissingOp);
    }
    Ok(value)
}

/// Read the `op` tag of a raw frame.
pub fn op_of(raw: &Value) -> Option<&str> {
    raw.get("op").and_then(Value::as_str)
}
