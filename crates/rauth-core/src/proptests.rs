//! Property tests for the session state machine.

use proptest::prelude::*;
use tokio::time::Instant;

use rauth_proto::ChallengeDescriptor;

use crate::errors::LoginError;
use crate::events::RemoteAuthEvent;
use crate::harness::{shared_keys, test_config};
use crate::login::LoginOutcome;
use crate::session::{ChallengeState, Session, SessionAction};

fn session() -> Session {
    Session::new(test_config(), shared_keys().clone())
}

fn descriptor(rqtoken: &str) -> ChallengeDescriptor {
    ChallengeDescriptor {
        captcha_key: vec!["captcha-required".into()],
        captcha_service: "hcaptcha".into(),
        captcha_sitekey: "site".into(),
        captcha_rqdata: "data".into(),
        captcha_rqtoken: rqtoken.into(),
    }
}

#[derive(Debug, Clone)]
enum Input {
    Frame(&'static str),
    Challenge,
    Failure,
}

fn input() -> impl Strategy<Value = Input> {
    prop_oneof![
        Just(Input::Frame(r#"{"op":"pending_login","ticket":"t-1"}"#)),
        Just(Input::Frame(r#"{"op":"pending_remote_init","fingerprint":"fp"}"#)),
        Just(Input::Frame(r#"{"op":"heartbeat_ack"}"#)),
        Just(Input::Frame(r#"{"op":"cancel"}"#)),
        Just(Input::Frame(r#"{"op":"mystery"}"#)),
        Just(Input::Challenge),
        Just(Input::Failure),
    ]
}

proptest! {
    #[test]
    fn prop_retry_count_tracks_repeats(repeats in 1usize..12) {
        let mut s = session();
        for i in 0..repeats {
            s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(descriptor(&format!("rq-{}", i)))));
            s.solve_challenge(format!("answer-{}", i)).unwrap();
        }
        match s.challenge() {
            ChallengeState::Pending(p) => {
                prop_assert_eq!(&p.ticket, "t-1");
                prop_assert_eq!(p.retry_count as usize, repeats - 1);
                prop_assert_eq!(p.rqtoken.clone(), format!("rq-{}", repeats - 1));
            }
            ChallengeState::NoChallenge => prop_assert!(false, "challenge missing"),
        }
    }

    #[test]
    fn prop_nothing_redeemed_or_issued_after_cancel(
        before in prop::collection::vec(input(), 0..8),
        after in prop::collection::vec(input(), 0..8),
    ) {
        let mut s = session();
        let now = Instant::now();
        let feed = |s: &mut Session, input: &Input| -> Vec<SessionAction> {
            match input {
                Input::Frame(text) => s.handle_frame(text, now).actions,
                Input::Challenge => {
                    s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(descriptor("rq"))))
                }
                Input::Failure => s.handle_login_result("t-1", Err(LoginError::Http("reset".into()))),
            }
        };

        for i in &before {
            feed(&mut s, i);
        }
        s.handle_frame(r#"{"op":"cancel"}"#, now);
        prop_assert!(s.is_canceled());

        for i in &after {
            let actions = feed(&mut s, i);
            for action in actions {
                let allowed = matches!(action, SessionAction::Emit(RemoteAuthEvent::RawFrame(_)))
                    || matches!(action, SessionAction::Emit(RemoteAuthEvent::FingerprintReady { .. }));
                prop_assert!(allowed, "unexpected action after cancel: {:?}", action);
            }
        }
        prop_assert!(s.solve_challenge("late".into()).is_err());
    }

    #[test]
    fn prop_arbitrary_text_never_panics(text in ".{0,200}") {
        let mut s = session();
        let _ = s.handle_frame(&text, Instant::now());
    }
}
