//! Remote auth core - handshake, session state and ticket redemption.
//!
//! This crate implements:
//! - Key-possession handshake with the gateway
//! - Session state machine (fingerprint, identity, login, cancel, liveness)
//! - Ticket redemption with challenge retry
//! - The session driver task and its caller-facing handle
//! - Channel and HTTP abstractions with real implementations behind features

#![forbid(unsafe_code)]

// Core state machines
pub mod handshake;
pub mod session;

// Services
pub mod client;
pub mod login;

// Supporting modules
pub mod channel;
pub mod config;
pub mod errors;
pub mod events;
pub mod harness;

// Optional implementations
#[cfg(feature = "http")]
pub mod http_client;

#[cfg(feature = "websocket")]
pub mod ws_channel;

#[cfg(test)]
mod proptests;

pub use client::{ClientHandle, RemoteAuthClient};
pub use config::ClientConfig;
pub use errors::CoreError;
pub use events::{AccessToken, ChallengeRequest, CloseReason, EventStream, RemoteAuthEvent};
