//! Ticket redemption.
//!
//! HTTP execution is a supplied capability ([`HttpExecutor`]); this module
//! builds the request and interprets the response, so the same code runs
//! against [`crate::http_client::ReqwestExecutor`] and the scripted test
//! double in [`crate::harness`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use rauth_proto::login::{HEADER_CHALLENGE_KEY, HEADER_CHALLENGE_RQTOKEN};
use rauth_proto::{ChallengeDescriptor, LoginRequest, LoginSuccess};

use crate::config::ClientConfig;
use crate::errors::LoginError;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// One JSON POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Lower-case header names, in send order
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Secure HTTP execution.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Send `request` as a POST and read the whole response.
    ///
    /// Only transport failures are errors; any status is a response.
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, LoginError>;
}

/// Caller's answer to a challenge, sent back as headers.
#[derive(Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub key: String,
    pub rqtoken: String,
}

impl std::fmt::Debug for ChallengeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeResponse")
            .field("key", &"<redacted>")
            .field("rqtoken", &self.rqtoken)
            .finish()
    }
}

/// One redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemRequest {
    pub ticket: String,
    pub challenge: Option<ChallengeResponse>,
}

/// Successful interpretation of the endpoint's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Encrypted access token, still base64
    Token(String),
    /// The endpoint wants a challenge solved first
    ChallengeRequired(ChallengeDescriptor),
}

/// Redemption endpoint client.
#[derive(Clone)]
pub struct LoginExchange {
    http: Arc<dyn HttpExecutor>,
    login_url: String,
    origin: String,
    referer: String,
    user_agent: String,
}

impl LoginExchange {
    pub fn new(config: &ClientConfig, http: Arc<dyn HttpExecutor>) -> Self {
        Self {
            http,
            login_url: config.login_url.clone(),
            origin: config.origin.clone(),
            referer: config.page_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Build the POST for `request` with browser-like headers.
    pub fn build_request(&self, request: &RedeemRequest) -> Result<HttpRequest, LoginError> {
        let body = serde_json::to_string(&LoginRequest {
            ticket: request.ticket.clone(),
        })
        .map_err(|e| LoginError::Http(e.to_string()))?;

        let mut headers: Vec<(String, String)> = [
            ("accept", "*/*"),
            ("accept-language", "en-US,en;q=0.8"),
            ("cache-control", "no-cache"),
            ("content-type", "application/json"),
            ("origin", self.origin.as_str()),
            ("pragma", "no-cache"),
            ("referer", self.referer.as_str()),
            ("sec-fetch-dest", "empty"),
            ("sec-fetch-mode", "cors"),
            ("sec-fetch-site", "same-origin"),
            ("sec-gpc", "1"),
            ("user-agent", self.user_agent.as_str()),
        ]
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();

        if let Some(challenge) = &request.challenge {
            headers.push((HEADER_CHALLENGE_KEY.to_string(), challenge.key.clone()));
            headers.push((HEADER_CHALLENGE_RQTOKEN.to_string(), challenge.rqtoken.clone()));
        }

        Ok(HttpRequest {
            url: self.login_url.clone(),
            headers,
            body,
        })
    }

    /// Issue one redemption.
    pub async fn redeem(&self, request: &RedeemRequest) -> Result<LoginOutcome, LoginError> {
        let http_request = self.build_request(request)?;
        let response = self.http.post_json(http_request).await?;
        debug!(status = response.status, "redemption response");
        interpret(&response)
    }
}

/// Map an endpoint response to an outcome.
///
/// - 200 with `encrypted_token`: [`LoginOutcome::Token`]
/// - 400 whose `captcha_key` asks for a challenge: [`LoginOutcome::ChallengeRequired`],
///   or [`LoginError::UnsupportedChallengeService`] for a foreign service
/// - anything else: [`LoginError::UnexpectedStatus`]
pub fn interpret(response: &HttpResponse) -> Result<LoginOutcome, LoginError> {
    match response.status {
        200 => {
            let success: LoginSuccess = serde_json::from_str(&response.body)
                .map_err(|e| LoginError::BadResponse(format!("no encrypted_token: {}", e)))?;
            Ok(LoginOutcome::Token(success.encrypted_token))
        }
        400 => match serde_json::from_str::<ChallengeDescriptor>(&response.body) {
            Ok(descriptor) if descriptor.requires_challenge() => {
                if !descriptor.is_supported_service() {
                    return Err(LoginError::UnsupportedChallengeService(
                        descriptor.captcha_service,
                    ));
                }
                Ok(LoginOutcome::ChallengeRequired(descriptor))
            }
            _ => Err(unexpected(response)),
        },
        _ => Err(unexpected(response)),
    }
}

fn unexpected(response: &HttpResponse) -> LoginError {
    let mut body = response.body.clone();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    LoginError::UnexpectedStatus {
        status: response.status,
        body,
    }
}
