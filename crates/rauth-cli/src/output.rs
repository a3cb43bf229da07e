//! Output formatting for CLI results
//!
//! Three output formats:
//! - Table: human-readable text and tables (default)
//! - JSON: one JSON object per line, for scripting
//! - Quiet: only the issued token

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use rauth_core::events::{CloseReason, RemoteAuthEvent, UserIdentity};
use rauth_core::ChallengeRequest;

use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text and tables
    #[default]
    Table,
    /// JSON lines for scripting
    Json,
    /// Token only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response with exit code context
    pub fn error_with_code(message: &str, code: ExitCode) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(code.name().to_string()),
        }
    }
}

/// JSON shape of a session event.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventOutput<'a> {
    FingerprintReady {
        fingerprint: &'a str,
        url: &'a str,
    },
    IdentityRevealed {
        #[serde(flatten)]
        identity: &'a UserIdentity,
    },
    ChallengeRequired {
        #[serde(flatten)]
        challenge: &'a ChallengeRequest,
    },
    TokenIssued {
        token: &'a str,
    },
    LoginFailed {
        reason: &'a str,
    },
    Canceled,
    Closed {
        reason: String,
    },
    RawFrame {
        frame: &'a serde_json::Value,
    },
}

impl<'a> From<&'a RemoteAuthEvent> for EventOutput<'a> {
    fn from(event: &'a RemoteAuthEvent) -> Self {
        match event {
            RemoteAuthEvent::FingerprintReady { fingerprint, url } => {
                EventOutput::FingerprintReady { fingerprint, url }
            }
            RemoteAuthEvent::IdentityRevealed(identity) => EventOutput::IdentityRevealed { identity },
            RemoteAuthEvent::ChallengeRequired(challenge) => {
                EventOutput::ChallengeRequired { challenge }
            }
            RemoteAuthEvent::TokenIssued(token) => EventOutput::TokenIssued {
                token: token.expose(),
            },
            RemoteAuthEvent::LoginFailed { reason } => EventOutput::LoginFailed { reason },
            RemoteAuthEvent::Canceled => EventOutput::Canceled,
            RemoteAuthEvent::Closed { reason } => EventOutput::Closed {
                reason: close_reason(reason),
            },
            RemoteAuthEvent::RawFrame(frame) => EventOutput::RawFrame { frame },
        }
    }
}

fn close_reason(reason: &CloseReason) -> String {
    match reason {
        CloseReason::ClosedByPeer => "closed by gateway".to_string(),
        CloseReason::Disconnected => "disconnected".to_string(),
        CloseReason::Fatal(e) => e.clone(),
    }
}

/// Result of `keygen-check`.
#[derive(Debug, Serialize)]
pub struct KeyCheckOutput {
    pub modulus_bits: usize,
    pub encoded_public_key: String,
    pub encoded_len: usize,
    pub generation_ms: u64,
    pub self_test_passed: bool,
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Render one session event, or `None` if it is not shown in this mode.
    pub fn format_event(&self, event: &RemoteAuthEvent) -> Option<String> {
        if matches!(event, RemoteAuthEvent::RawFrame(_)) && !self.verbose {
            return None;
        }
        match self.format {
            OutputFormat::Table => Some(self.event_text(event)),
            OutputFormat::Json => Some(self.to_json_response(&EventOutput::from(event), "login")),
            OutputFormat::Quiet => match event {
                RemoteAuthEvent::TokenIssued(token) => Some(token.expose().to_string()),
                _ => None,
            },
        }
    }

    /// Render the `keygen-check` result.
    pub fn format_key_check(&self, check: &KeyCheckOutput) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Property", "Value"]);
                table.add_row(vec!["Modulus", &format!("{} bits", check.modulus_bits)]);
                table.add_row(vec!["Encoded length", &check.encoded_len.to_string()]);
                table.add_row(vec!["Generation time", &format!("{} ms", check.generation_ms)]);
                table.add_row(vec![
                    "OAEP self-test",
                    if check.self_test_passed { "passed" } else { "FAILED" },
                ]);
                format!("{table}\n{}", check.encoded_public_key)
            }
            OutputFormat::Json => self.to_json_response(check, "keygen-check"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format an error with exit code context
    pub fn format_error_with_code(&self, error: &dyn std::fmt::Display, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {error}"),
            OutputFormat::Json => self.to_json(&JsonResponse::error_with_code(&error.to_string(), code)),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Progress message on stderr, table mode only
    pub fn progress(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("{message}");
        }
    }

    fn event_text(&self, event: &RemoteAuthEvent) -> String {
        match event {
            RemoteAuthEvent::FingerprintReady { url, .. } => {
                format!("Scan this with the mobile app:\n  {url}")
            }
            RemoteAuthEvent::IdentityRevealed(identity) => identity_table(identity),
            RemoteAuthEvent::ChallengeRequired(challenge) => challenge_table(challenge),
            RemoteAuthEvent::TokenIssued(token) => format!("Token: {}", token.expose()),
            RemoteAuthEvent::LoginFailed { reason } => format!("Login attempt failed: {reason}"),
            RemoteAuthEvent::Canceled => "Login canceled on the mobile app".to_string(),
            RemoteAuthEvent::Closed { reason } => {
                format!("Connection closed: {}", close_reason(reason))
            }
            RemoteAuthEvent::RawFrame(frame) => format!("<- {frame}"),
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        self.to_json(&JsonResponse::success_with_command(value, command))
    }
}

fn identity_table(identity: &UserIdentity) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec!["User ID", identity.id.as_str()]);
    table.add_row(vec!["Username", identity.username.as_str()]);
    table.add_row(vec!["Discriminator", identity.discriminator.as_str()]);
    table.add_row(vec!["Avatar", identity.avatar.as_str()]);
    format!("Scanned by:\n{table}")
}

fn challenge_table(challenge: &ChallengeRequest) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec!["Site key", challenge.sitekey.as_str()]);
    table.add_row(vec!["Page URL", challenge.page_url.as_str()]);
    table.add_row(vec!["Request data", challenge.required_data.as_str()]);
    table.add_row(vec!["User agent", challenge.user_agent.as_str()]);
    table.add_row(vec!["Attempt", &(challenge.retry_count + 1).to_string()]);
    format!(
        "Challenge required:\n{table}\nSolve it and paste the answer on a single line:"
    )
}
