#![forbid(unsafe_code)]

pub mod error;
pub mod hash;
pub mod keypair;

#[cfg(test)]
mod proptests;

pub use error::CryptoError;
pub use keypair::SessionKeyPair;
pub use rsa::RsaPublicKey;
