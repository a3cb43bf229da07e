//! Key-possession handshake with the gateway.
//!
//! ```text
//! AwaitingHello --hello--> AwaitingNonce --nonce_proof--> Established
//! ```
//!
//! On `hello` the client starts its liveness signal and advertises its public
//! key; on `nonce_proof` it decrypts the nonce and answers with its hash.
//! Every other (state, frame) pair is an explicit no-op here; the session
//! state machine sees the frame regardless.

use std::time::Duration;

use tracing::{debug, info};

use rauth_crypto::hash::nonce_proof;
use rauth_crypto::SessionKeyPair;
use rauth_proto::{InboundFrame, OutboundFrame};

use crate::errors::{CoreError, ProtocolError};
use crate::session::SessionAction;

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for `hello`
    AwaitingHello,
    /// Public key sent, waiting for the encrypted nonce
    AwaitingNonce,
    /// Proof sent; only the liveness signal remains
    Established,
}

/// Handshake state machine.
#[derive(Debug)]
pub struct HandshakeProtocol {
    state: HandshakeState,
}

impl Default for HandshakeProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeProtocol {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::AwaitingHello,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Feed one inbound frame.
    ///
    /// A failure leaves the state unchanged.
    pub fn handle(
        &mut self,
        frame: &InboundFrame,
        keys: &SessionKeyPair,
    ) -> Result<Vec<SessionAction>, CoreError> {
        match (self.state, frame) {
            (HandshakeState::AwaitingHello, InboundFrame::Hello { heartbeat_interval, .. }) => {
                if *heartbeat_interval == 0 {
                    return Err(ProtocolError::ZeroHeartbeatInterval.into());
                }
                let interval = Duration::from_millis(*heartbeat_interval);
                debug!(interval_ms = *heartbeat_interval, "hello received, sending public key");
                self.state = HandshakeState::AwaitingNonce;
                Ok(vec![
                    SessionAction::StartHeartbeat(interval),
                    SessionAction::Send(OutboundFrame::Init {
                        encoded_public_key: keys.encoded_public_key().to_string(),
                    }),
                ])
            }

            (HandshakeState::AwaitingNonce, InboundFrame::NonceProof { encrypted_nonce }) => {
                let nonce = keys.decrypt(encrypted_nonce)?;
                let proof = nonce_proof(&nonce);
                self.state = HandshakeState::Established;
                info!("handshake established");
                Ok(vec![SessionAction::Send(OutboundFrame::NonceProof { proof })])
            }

            // hello after the first one, or a nonce before we sent our key
            (HandshakeState::AwaitingNonce | HandshakeState::Established, InboundFrame::Hello { .. })
            | (HandshakeState::AwaitingHello | HandshakeState::Established, InboundFrame::NonceProof { .. }) => {
                debug!(op = frame.op(), state = ?self.state, "handshake frame out of order, ignored");
                Ok(Vec::new())
            }

            // not a handshake frame
            (_, _) => Ok(Vec::new()),
        }
    }
}
