//! Wire types for the remote auth protocol.
//!
//! - `frames`: JSON text frames exchanged with the remote auth gateway
//! - `login`: request and response bodies of the ticket redemption endpoint
//! - `identity`: the colon-delimited user record carried by `pending_ticket`

#![forbid(unsafe_code)]

pub mod frames;
pub mod identity;
pub mod login;

#[cfg(test)]
mod proptests;

pub use frames::{decode_frame, FrameError, InboundFrame, OutboundFrame};
pub use identity::UserIdentity;
pub use login::{ChallengeDescriptor, LoginRequest, LoginSuccess};
