//! CLI command definitions and argument parsing

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// rauth - log in by scanning a code with a signed-in device
#[derive(Parser, Debug)]
#[command(name = "rauth")]
#[command(version, about = "Remote auth client - QR code login from the terminal")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output (also print raw gateway frames)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode (traffic tracing, malformed frames skipped)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true, env = "RAUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Gateway WebSocket URL
    #[arg(long, global = true)]
    pub gateway_url: Option<String>,
}

impl Cli {
    /// Execute the CLI command with a resolved configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let format = match config.output.format.parse::<OutputFormat>() {
            Ok(format) => format,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(ExitCode::InvalidInput);
            }
        };
        let formatter = OutputFormatter::new(format, config.output.verbose);

        match self.command {
            Commands::Login(args) => args.execute(&config, &formatter).await,
            Commands::KeygenCheck => crate::keycheck::run(&formatter).await,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a login code, wait for it to be scanned and print the token
    Login(LoginArgs),
    /// Generate a session key and run an encryption self-test
    KeygenCheck,
}

/// Arguments for the login command
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Give up after this many seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

impl LoginArgs {
    pub async fn execute(self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        if self.timeout == 0 {
            eprintln!("Error: --timeout must be greater than 0");
            return Ok(ExitCode::InvalidInput);
        }
        crate::login::run(
            config.client.clone(),
            formatter,
            Duration::from_secs(self.timeout),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_with_globals() {
        let cli = Cli::try_parse_from([
            "rauth",
            "login",
            "--timeout",
            "60",
            "--output",
            "json",
            "--debug",
            "--gateway-url",
            "wss://localhost:9000/",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.gateway_url.as_deref(), Some("wss://localhost:9000/"));
        match cli.command {
            Commands::Login(args) => assert_eq!(args.timeout, 60),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_keygen_check() {
        let cli = Cli::try_parse_from(["rauth", "keygen-check", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.output.is_none());
        assert!(matches!(cli.command, Commands::KeygenCheck));
    }

    #[test]
    fn test_default_timeout() {
        let cli = Cli::try_parse_from(["rauth", "login"]).unwrap();
        match cli.command {
            Commands::Login(args) => assert_eq!(args.timeout, 300),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["rauth", "login", "--output", "xml"]).is_err());
    }
}
