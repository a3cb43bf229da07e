//! Ticket redemption endpoint bodies and headers.

use serde::{Deserialize, Deserializer, Serialize};

/// Header carrying the solved challenge answer on a retry.
pub const HEADER_CHALLENGE_KEY: &str = "x-captcha-key";
/// Header carrying the challenge session token on a retry.
pub const HEADER_CHALLENGE_RQTOKEN: &str = "x-captcha-rqtoken";

/// Indicator: the endpoint wants a challenge solved before honouring the ticket.
pub const CHALLENGE_REQUIRED: &str = "captcha-required";
/// Indicator: the submitted challenge answer was rejected.
pub const CHALLENGE_INVALID_RESPONSE: &str = "invalid-response";

/// The only challenge service this client can hand to a solver.
pub const SUPPORTED_CHALLENGE_SERVICE: &str = "hcaptcha";

/// POST body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// One-time ticket from `pending_login`
    pub ticket: String,
}

/// HTTP 200 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSuccess {
    /// Base64 RSA-OAEP ciphertext of the access token
    pub encrypted_token: String,
}

/// HTTP 400 body when a challenge is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeDescriptor {
    /// Reason codes, e.g. `captcha-required`
    #[serde(deserialize_with = "one_or_many")]
    pub captcha_key: Vec<String>,
    /// Challenge service name
    pub captcha_service: String,
    /// Public site key for the solver
    pub captcha_sitekey: String,
    /// Opaque data the solver must submit with its answer
    #[serde(default)]
    pub captcha_rqdata: String,
    /// Challenge session token echoed back on retry
    #[serde(default)]
    pub captcha_rqtoken: String,
}

impl ChallengeDescriptor {
    /// Whether the reason codes ask for a (new) challenge answer.
    pub fn requires_challenge(&self) -> bool {
        self.captcha_key
            .iter()
            .any(|k| k == CHALLENGE_REQUIRED || k == CHALLENGE_INVALID_RESPONSE)
    }

    /// Whether the named service is one this client supports.
    pub fn is_supported_service(&self) -> bool {
        self.captcha_service == SUPPORTED_CHALLENGE_SERVICE
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
