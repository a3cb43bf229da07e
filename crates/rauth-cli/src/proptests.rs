//! Property-based tests for the rauth CLI

use proptest::prelude::*;

use rauth_core::events::UserIdentity;
use rauth_core::RemoteAuthEvent;

use crate::config::{CliOverrides, Config};
use crate::output::{OutputFormat, OutputFormatter};

fn format_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("table"), Just("json"), Just("quiet")].prop_map(String::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Whatever the gateway sends, JSON mode emits one parseable line that
    // carries the text unchanged.
    #[test]
    fn test_json_event_lines_are_valid(reason in ".{0,120}", username in "\\PC{0,40}") {
        let formatter = OutputFormatter::new(OutputFormat::Json, false);

        let line = formatter
            .format_event(&RemoteAuthEvent::LoginFailed { reason: reason.clone() })
            .unwrap();
        prop_assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(value["data"]["event"].as_str(), Some("login_failed"));
        prop_assert_eq!(value["data"]["reason"].as_str(), Some(reason.as_str()));

        let identity = UserIdentity {
            id: "1".into(),
            discriminator: "0".into(),
            avatar: String::new(),
            username: username.clone(),
        };
        let line = formatter
            .format_event(&RemoteAuthEvent::IdentityRevealed(identity))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(value["data"]["username"].as_str(), Some(username.as_str()));
    }

    // Command-line flags always win over file values; unset flags never
    // touch them.
    #[test]
    fn test_overrides_precedence(
        file_format in format_name(),
        flag_format in prop::option::of(format_name()),
        file_verbose in any::<bool>(),
        flag_verbose in prop::option::of(Just(true)),
        debug in prop::option::of(Just(true)),
    ) {
        let mut config = Config::default();
        config.output.format = file_format.clone();
        config.output.verbose = file_verbose;

        let overrides = CliOverrides {
            output_format: flag_format.clone(),
            verbose: flag_verbose,
            debug,
            gateway_url: None,
        };
        let merged = config.clone().with_overrides(&overrides);

        prop_assert!(merged.validate().is_ok());
        prop_assert_eq!(&merged.output.format, &flag_format.unwrap_or(file_format));
        prop_assert_eq!(merged.output.verbose, flag_verbose.unwrap_or(file_verbose));
        prop_assert_eq!(merged.client.debug, debug.is_some());
        prop_assert_eq!(&merged.client.gateway_url, &config.client.gateway_url);
    }
}
