//! rauth - command-line remote auth client
//!
//! This crate provides a command-line interface for:
//! - Logging in by scanning a fingerprint code with an already signed-in device
//! - Answering login challenges from the terminal
//! - Checking session key generation on this machine

pub mod cli;
pub mod config;
pub mod keycheck;
pub mod login;
pub mod output;

#[cfg(test)]
mod proptests;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

/// Exit codes for CLI operations
///
/// - 0: Success - token issued / check passed
/// - 1: General error - unspecified error occurred
/// - 2: Canceled - the login was rejected on the companion device
/// - 3: Timeout - no token before the deadline
/// - 4: Connection failed - gateway unreachable or closed early
/// - 5: Invalid input - bad arguments or configuration
/// - 6: Login failed - the session ended on a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Login canceled on the companion device (exit code 2)
    Canceled = 2,
    /// Operation timed out (exit code 3)
    Timeout = 3,
    /// Connection failed (exit code 4)
    ConnectionFailed = 4,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
    /// Session ended on a fatal error (exit code 6)
    LoginFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::Canceled => "CANCELED",
            ExitCode::Timeout => "TIMEOUT",
            ExitCode::ConnectionFailed => "CONNECTION_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::LoginFailed => "LOGIN_FAILED",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::Canceled => "Login was canceled on the companion device",
            ExitCode::Timeout => "Operation timed out",
            ExitCode::ConnectionFailed => "Could not reach or stay connected to the gateway",
            ExitCode::InvalidInput => "Invalid arguments or configuration",
            ExitCode::LoginFailed => "The login session ended on an error",
        }
    }
}
