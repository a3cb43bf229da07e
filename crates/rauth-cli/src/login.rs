//! `login`: run one remote auth session in the terminal.
//!
//! Events are printed as they arrive. When a challenge is required, the
//! answer is read from stdin, one line per attempt.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use rauth_core::{ClientConfig, CloseReason, CoreError, RemoteAuthClient, RemoteAuthEvent};

use crate::output::OutputFormatter;
use crate::ExitCode;

/// Exit code an event settles the run with, if it ends it.
pub fn exit_code_for(event: &RemoteAuthEvent) -> Option<ExitCode> {
    match event {
        RemoteAuthEvent::TokenIssued(_) => Some(ExitCode::Success),
        RemoteAuthEvent::Canceled => Some(ExitCode::Canceled),
        RemoteAuthEvent::Closed {
            reason: CloseReason::Fatal(_),
        } => Some(ExitCode::LoginFailed),
        RemoteAuthEvent::Closed { .. } => Some(ExitCode::ConnectionFailed),
        _ => None,
    }
}

/// Exit code for an error raised before the session started.
pub fn exit_code_for_error(error: &CoreError) -> ExitCode {
    match error {
        CoreError::Channel(_) => ExitCode::ConnectionFailed,
        CoreError::Config(_) => ExitCode::InvalidInput,
        _ => ExitCode::GeneralError,
    }
}

pub async fn run(
    config: ClientConfig,
    formatter: &OutputFormatter,
    timeout: Duration,
) -> anyhow::Result<ExitCode> {
    let gateway = config.gateway_url.clone();
    let client = match RemoteAuthClient::with_defaults(config) {
        Ok(client) => client,
        Err(e) => return Ok(report(formatter, &e)),
    };

    formatter.progress(&format!("Connecting to {gateway}..."));
    let (handle, mut events) = match client.connect().await {
        Ok(connected) => connected,
        Err(e) => return Ok(report(formatter, &e)),
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut awaiting_answer = false;
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let code = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break ExitCode::ConnectionFailed;
                };
                if let Some(text) = formatter.format_event(&event) {
                    println!("{text}");
                }
                if matches!(event, RemoteAuthEvent::ChallengeRequired(_)) {
                    awaiting_answer = true;
                }
                if let Some(code) = exit_code_for(&event) {
                    break code;
                }
            }
            line = lines.next_line(), if awaiting_answer && stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let answer = line.trim();
                        if answer.is_empty() {
                            continue;
                        }
                        match handle.solve_challenge(answer).await {
                            Ok(()) => awaiting_answer = false,
                            Err(e) => warn!(error = %e, "challenge answer rejected"),
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
            _ = &mut deadline => {
                let message = format!("no token after {}s", timeout.as_secs());
                let rendered = formatter.format_error_with_code(&message, ExitCode::Timeout);
                if !rendered.is_empty() {
                    eprintln!("{rendered}");
                }
                break ExitCode::Timeout;
            }
            _ = tokio::signal::ctrl_c() => {
                formatter.progress("Interrupted");
                break ExitCode::GeneralError;
            }
        }
    };

    if let Err(e) = handle.disconnect().await {
        debug!(error = %e, "disconnect after login");
    }
    Ok(code)
}

fn report(formatter: &OutputFormatter, error: &CoreError) -> ExitCode {
    let code = exit_code_for_error(error);
    let rendered = formatter.format_error_with_code(error, code);
    if !rendered.is_empty() {
        eprintln!("{rendered}");
    }
    code
}
