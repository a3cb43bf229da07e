//! Session state machine.
//!
//! A [`Session`] is the single mutable root for one connection attempt. It
//! never performs I/O itself: every input (inbound frame, liveness tick,
//! redemption completion, caller command) returns a list of
//! [`SessionAction`]s that the driver in [`crate::client`] carries out in
//! order.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use rauth_crypto::SessionKeyPair;
use rauth_proto::frames::decode_frame;
use rauth_proto::{InboundFrame, OutboundFrame, UserIdentity};

use crate::channel::SocketState;
use crate::config::ClientConfig;
use crate::errors::{ChallengeError, CoreError, LoginError};
use crate::events::{AccessToken, ChallengeRequest, RemoteAuthEvent, SessionSnapshot};
use crate::handshake::{HandshakeProtocol, HandshakeState};
use crate::login::{ChallengeResponse, LoginOutcome, RedeemRequest};

/// Side effects requested by the session, executed by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Write a frame to the channel
    Send(OutboundFrame),
    /// Start the recurring liveness signal
    StartHeartbeat(Duration),
    /// Deliver a notification to the caller
    Emit(RemoteAuthEvent),
    /// Start a ticket redemption in the background
    Redeem(RedeemRequest),
}

/// Result of feeding one inbound frame.
///
/// Actions produced before a failure are kept, so the raw trace of a
/// malformed-but-parseable frame is still delivered.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub actions: Vec<SessionAction>,
    pub error: Option<CoreError>,
}

/// A login attempt blocked on a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    /// Ticket of the blocked attempt; fixed for the whole cycle
    pub ticket: String,
    /// Challenge service name
    pub service: String,
    /// 0 on the first challenge, incremented on each repeat
    pub retry_count: u32,
    /// Latest challenge session token from the endpoint
    pub rqtoken: String,
    /// Answer supplied by the caller, cleared when a new challenge arrives
    pub solved_key: Option<String>,
    /// A retry carrying `solved_key` has been sent and not yet answered
    pub retry_in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeState {
    NoChallenge,
    Pending(PendingChallenge),
}

pub struct Session {
    config: ClientConfig,
    keys: SessionKeyPair,
    handshake: HandshakeProtocol,
    socket_state: SocketState,
    last_heartbeat_sent_at: Option<Instant>,
    latency: Option<Duration>,
    canceled: bool,
    challenge: ChallengeState,
}

impl Session {
    /// New session owning `keys` for its whole lifetime.
    pub fn new(config: ClientConfig, keys: SessionKeyPair) -> Self {
        Self {
            config,
            keys,
            handshake: HandshakeProtocol::new(),
            socket_state: SocketState::Idle,
            last_heartbeat_sent_at: None,
            latency: None,
            canceled: false,
            challenge: ChallengeState::NoChallenge,
        }
    }

    pub fn keys(&self) -> &SessionKeyPair {
        &self.keys
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    pub fn challenge(&self) -> &ChallengeState {
        &self.challenge
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake.state()
    }

    pub fn socket_state(&self) -> SocketState {
        self.socket_state
    }

    pub fn set_socket_state(&mut self, state: SocketState) {
        debug!(from = ?self.socket_state, to = ?state, "socket state");
        self.socket_state = state;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            socket_state: self.socket_state,
            handshake: self.handshake.state(),
            canceled: self.canceled,
            latency: self.latency,
            challenge_retries: match &self.challenge {
                ChallengeState::Pending(p) => Some(p.retry_count),
                ChallengeState::NoChallenge => None,
            },
        }
    }

    // ------------------------------------------------------------------
    // Inbound frames
    // ------------------------------------------------------------------

    /// Process one inbound text frame received at `now`.
    pub fn handle_frame(&mut self, text: &str, now: Instant) -> FrameOutcome {
        let raw = match decode_frame(text) {
            Ok(raw) => raw,
            Err(e) => {
                return FrameOutcome {
                    actions: Vec::new(),
                    error: Some(e.into()),
                }
            }
        };

        let mut outcome = FrameOutcome::default();
        match InboundFrame::from_raw(&raw) {
            Ok(frame) => {
                if let Err(e) = self.dispatch(&frame, now, &mut outcome.actions) {
                    outcome.error = Some(e);
                }
            }
            Err(e) => outcome.error = Some(e.into()),
        }

        outcome.actions.push(SessionAction::Emit(RemoteAuthEvent::RawFrame(raw)));
        outcome
    }

    fn dispatch(
        &mut self,
        frame: &InboundFrame,
        now: Instant,
        actions: &mut Vec<SessionAction>,
    ) -> Result<(), CoreError> {
        actions.extend(self.handshake.handle(frame, &self.keys)?);

        match frame {
            InboundFrame::PendingRemoteInit { fingerprint } => {
                info!("fingerprint ready");
                actions.push(SessionAction::Emit(RemoteAuthEvent::FingerprintReady {
                    fingerprint: fingerprint.clone(),
                    url: self.config.fingerprint_url(fingerprint),
                }));
            }

            InboundFrame::PendingTicket {
                encrypted_user_payload,
            } => {
                let payload = self.keys.decrypt_text(encrypted_user_payload)?;
                let identity = UserIdentity::parse(&payload)?;
                info!(user_id = %identity.id, "identity revealed");
                actions.push(SessionAction::Emit(RemoteAuthEvent::IdentityRevealed(identity)));
            }

            InboundFrame::PendingLogin { ticket } => {
                if let Some(request) = self.login_attempt(ticket) {
                    actions.push(SessionAction::Redeem(request));
                }
            }

            InboundFrame::Cancel => {
                if !self.canceled {
                    self.canceled = true;
                    info!("login canceled by companion device");
                    actions.push(SessionAction::Emit(RemoteAuthEvent::Canceled));
                }
            }

            InboundFrame::HeartbeatAck => match self.last_heartbeat_sent_at {
                Some(sent) => {
                    let latency = now.saturating_duration_since(sent);
                    debug!(latency_ms = latency.as_millis() as u64, "heartbeat acknowledged");
                    self.latency = Some(latency);
                }
                None => debug!("heartbeat_ack without a prior heartbeat"),
            },

            InboundFrame::Unknown => debug!("unrecognised frame"),

            InboundFrame::Hello { .. } | InboundFrame::NonceProof { .. } => {}
        }

        Ok(())
    }

    /// Build the redemption for `ticket`, attaching a solved challenge of
    /// the same cycle. `None` once canceled.
    fn login_attempt(&self, ticket: &str) -> Option<RedeemRequest> {
        if self.canceled {
            debug!("pending_login after cancel, not redeeming");
            return None;
        }

        let challenge = match &self.challenge {
            ChallengeState::Pending(p) if p.ticket == ticket => {
                p.solved_key.as_ref().map(|key| ChallengeResponse {
                    key: key.clone(),
                    rqtoken: p.rqtoken.clone(),
                })
            }
            _ => None,
        };

        debug!(
            ticket_len = ticket.len(),
            with_challenge = challenge.is_some(),
            "redeeming ticket"
        );
        Some(RedeemRequest {
            ticket: ticket.to_string(),
            challenge,
        })
    }

    // ------------------------------------------------------------------
    // Liveness
    // ------------------------------------------------------------------

    /// Record a liveness signal sent at `now` and return the frame.
    pub fn heartbeat(&mut self, now: Instant) -> OutboundFrame {
        self.last_heartbeat_sent_at = Some(now);
        OutboundFrame::Heartbeat
    }

    // ------------------------------------------------------------------
    // Redemption completion
    // ------------------------------------------------------------------

    /// Re-enter the session with the result of a redemption of `ticket`.
    ///
    /// Results arriving after a cancel are dropped. Failures, including a
    /// token that cannot be decrypted, stay local to this login attempt.
    pub fn handle_login_result(
        &mut self,
        ticket: &str,
        result: Result<LoginOutcome, LoginError>,
    ) -> Vec<SessionAction> {
        if self.canceled {
            debug!("redemption finished after cancel, result suppressed");
            return Vec::new();
        }

        match result {
            Ok(LoginOutcome::Token(encrypted_token)) => {
                match self.keys.decrypt_text(&encrypted_token) {
                    Ok(token) => {
                        self.challenge = ChallengeState::NoChallenge;
                        info!("token issued");
                        vec![SessionAction::Emit(RemoteAuthEvent::TokenIssued(
                            AccessToken::new(token.as_str()),
                        ))]
                    }
                    Err(e) => {
                        self.settle_retry(ticket);
                        let e = CoreError::from(e);
                        warn!(error = %e, "issued token could not be decrypted");
                        vec![SessionAction::Emit(RemoteAuthEvent::LoginFailed {
                            reason: e.to_string(),
                        })]
                    }
                }
            }

            Ok(LoginOutcome::ChallengeRequired(descriptor)) => {
                let retry_count = match &mut self.challenge {
                    ChallengeState::Pending(p) if p.ticket == ticket => {
                        p.retry_count += 1;
                        p.rqtoken = descriptor.captcha_rqtoken.clone();
                        p.service = descriptor.captcha_service.clone();
                        p.solved_key = None;
                        p.retry_in_flight = false;
                        p.retry_count
                    }
                    // first challenge, or a different ticket replaces the old cycle
                    current => {
                        *current = ChallengeState::Pending(PendingChallenge {
                            ticket: ticket.to_string(),
                            service: descriptor.captcha_service.clone(),
                            retry_count: 0,
                            rqtoken: descriptor.captcha_rqtoken.clone(),
                            solved_key: None,
                            retry_in_flight: false,
                        });
                        0
                    }
                };

                info!(retry_count, service = %descriptor.captcha_service, "challenge required");
                vec![SessionAction::Emit(RemoteAuthEvent::ChallengeRequired(
                    ChallengeRequest {
                        sitekey: descriptor.captcha_sitekey,
                        page_url: self.config.page_url.clone(),
                        required_data: descriptor.captcha_rqdata,
                        user_agent: self.config.user_agent.clone(),
                        retry_count,
                    },
                ))]
            }

            Err(e) => {
                self.settle_retry(ticket);
                warn!(error = %e, "login attempt failed");
                vec![SessionAction::Emit(RemoteAuthEvent::LoginFailed {
                    reason: e.to_string(),
                })]
            }
        }
    }

    /// A retry for `ticket` ended without a new challenge; the caller may
    /// answer again.
    fn settle_retry(&mut self, ticket: &str) {
        if let ChallengeState::Pending(p) = &mut self.challenge {
            if p.ticket == ticket {
                p.retry_in_flight = false;
            }
        }
    }

    // ------------------------------------------------------------------
    // Caller commands
    // ------------------------------------------------------------------

    /// Store the caller's answer and retry the blocked ticket.
    pub fn solve_challenge(&mut self, solved: String) -> Result<Vec<SessionAction>, ChallengeError> {
        if self.canceled {
            return Err(ChallengeError::SessionCanceled);
        }
        let ticket = match &mut self.challenge {
            ChallengeState::Pending(p) if p.retry_in_flight => {
                return Err(ChallengeError::RetryInFlight)
            }
            ChallengeState::Pending(p) => {
                p.solved_key = Some(solved);
                p.ticket.clone()
            }
            ChallengeState::NoChallenge => return Err(ChallengeError::NoChallengePending),
        };

        let actions: Vec<SessionAction> = self
            .login_attempt(&ticket)
            .map(SessionAction::Redeem)
            .into_iter()
            .collect();
        if !actions.is_empty() {
            if let ChallengeState::Pending(p) = &mut self.challenge {
                p.retry_in_flight = true;
            }
        }
        Ok(actions)
    }

    /// The channel is gone: forget the challenge and the liveness state.
    pub fn on_closed(&mut self) {
        self.challenge = ChallengeState::NoChallenge;
        self.last_heartbeat_sent_at = None;
        self.set_socket_state(SocketState::Closed);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("handshake", &self.handshake.state())
            .field("socket_state", &self.socket_state)
            .field("canceled", &self.canceled)
            .field("latency", &self.latency)
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProtocolError;
    use crate::harness::{shared_keys, test_config};
    use rauth_crypto::keypair::encrypt_to;
    use rauth_proto::frames::FrameError;
    use rauth_proto::ChallengeDescriptor;
    use serde_json::json;

    fn session() -> Session {
        Session::new(test_config(), shared_keys().clone())
    }

    fn encrypt(session: &Session, plaintext: &str) -> String {
        encrypt_to(session.keys().public_key(), plaintext.as_bytes()).unwrap()
    }

    fn emitted(actions: &[SessionAction]) -> Vec<RemoteAuthEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Emit(RemoteAuthEvent::RawFrame(_)) => None,
                SessionAction::Emit(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    fn redeems(actions: &[SessionAction]) -> Vec<RedeemRequest> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Redeem(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn challenge(rqtoken: &str) -> ChallengeDescriptor {
        ChallengeDescriptor {
            captcha_key: vec!["captcha-required".into()],
            captcha_service: "hcaptcha".into(),
            captcha_sitekey: "site-key".into(),
            captcha_rqdata: "rq-data".into(),
            captcha_rqtoken: rqtoken.into(),
        }
    }

    #[test]
    fn test_fingerprint_ready() {
        let mut s = session();
        let out = s.handle_frame(r#"{"op":"pending_remote_init","fingerprint":"abc"}"#, Instant::now());
        assert!(out.error.is_none());
        assert_eq!(
            emitted(&out.actions),
            vec![RemoteAuthEvent::FingerprintReady {
                fingerprint: "abc".into(),
                url: "https://discordapp.com/ra/abc".into(),
            }]
        );
    }

    #[test]
    fn test_raw_frame_emitted_last() {
        let mut s = session();
        let text = r#"{"op":"pending_remote_init","fingerprint":"abc"}"#;
        let out = s.handle_frame(text, Instant::now());
        assert_eq!(
            out.actions.last(),
            Some(&SessionAction::Emit(RemoteAuthEvent::RawFrame(
                serde_json::from_str(text).unwrap()
            )))
        );
    }

    #[test]
    fn test_unknown_op_only_raw() {
        let mut s = session();
        let out = s.handle_frame(r#"{"op":"something_new","x":1}"#, Instant::now());
        assert!(out.error.is_none());
        assert_eq!(
            out.actions,
            vec![SessionAction::Emit(RemoteAuthEvent::RawFrame(
                json!({"op":"something_new","x":1})
            ))]
        );
    }

    #[test]
    fn test_identity_revealed() {
        let mut s = session();
        let payload = encrypt(&s, "42:7:abc:eve");
        let text = json!({"op":"pending_ticket","encrypted_user_payload":payload}).to_string();
        let out = s.handle_frame(&text, Instant::now());
        assert!(out.error.is_none());
        assert_eq!(
            emitted(&out.actions),
            vec![RemoteAuthEvent::IdentityRevealed(UserIdentity {
                id: "42".into(),
                discriminator: "7".into(),
                avatar: "abc".into(),
                username: "eve".into(),
            })]
        );
    }

    #[test]
    fn test_identity_wrong_field_count_is_error_but_raw_still_emitted() {
        let mut s = session();
        let payload = encrypt(&s, "42:7:eve");
        let text = json!({"op":"pending_ticket","encrypted_user_payload":payload}).to_string();
        let out = s.handle_frame(&text, Instant::now());
        assert!(matches!(
            out.error,
            Some(CoreError::Protocol(ProtocolError::Frame(FrameError::Malformed { .. })))
        ));
        assert!(emitted(&out.actions).is_empty());
        assert_eq!(out.actions.len(), 1);
    }

    #[test]
    fn test_not_json_has_no_raw_frame() {
        let mut s = session();
        let out = s.handle_frame("not json", Instant::now());
        assert!(out.actions.is_empty());
        assert!(out.error.unwrap().is_frame_local());
    }

    #[test]
    fn test_missing_field_is_frame_error() {
        let mut s = session();
        let out = s.handle_frame(r#"{"op":"pending_login"}"#, Instant::now());
        assert!(out.error.unwrap().is_frame_local());
        assert!(redeems(&out.actions).is_empty());
    }

    #[test]
    fn test_pending_login_redeems_ticket() {
        let mut s = session();
        let out = s.handle_frame(r#"{"op":"pending_login","ticket":"t-1"}"#, Instant::now());
        assert_eq!(
            redeems(&out.actions),
            vec![RedeemRequest {
                ticket: "t-1".into(),
                challenge: None
            }]
        );
    }

    #[test]
    fn test_latency_measured_from_last_heartbeat() {
        let mut s = session();
        let t0 = Instant::now();
        assert_eq!(s.heartbeat(t0), OutboundFrame::Heartbeat);
        s.handle_frame(r#"{"op":"heartbeat_ack"}"#, t0 + Duration::from_millis(50));
        assert_eq!(s.latency(), Some(Duration::from_millis(50)));
        assert_eq!(s.snapshot().latency, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_ack_without_heartbeat_has_no_latency() {
        let mut s = session();
        s.handle_frame(r#"{"op":"heartbeat_ack"}"#, Instant::now());
        assert_eq!(s.latency(), None);
    }

    #[test]
    fn test_cancel_blocks_further_logins() {
        let mut s = session();
        let out = s.handle_frame(r#"{"op":"cancel"}"#, Instant::now());
        assert_eq!(emitted(&out.actions), vec![RemoteAuthEvent::Canceled]);
        assert!(s.is_canceled());

        let again = s.handle_frame(r#"{"op":"cancel"}"#, Instant::now());
        assert!(emitted(&again.actions).is_empty());

        let out = s.handle_frame(r#"{"op":"pending_login","ticket":"t-1"}"#, Instant::now());
        assert!(redeems(&out.actions).is_empty());
    }

    #[test]
    fn test_token_after_cancel_is_suppressed() {
        let mut s = session();
        let encrypted = encrypt(&s, "secret-token");
        s.handle_frame(r#"{"op":"pending_login","ticket":"t-1"}"#, Instant::now());
        s.handle_frame(r#"{"op":"cancel"}"#, Instant::now());

        let actions = s
            .handle_login_result("t-1", Ok(LoginOutcome::Token(encrypted)));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_token_issued_clears_challenge() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        assert!(matches!(s.challenge(), ChallengeState::Pending(_)));

        let encrypted = encrypt(&s, "secret-token");
        let actions = s
            .handle_login_result("t-1", Ok(LoginOutcome::Token(encrypted)));
        assert_eq!(
            actions,
            vec![SessionAction::Emit(RemoteAuthEvent::TokenIssued(AccessToken::new(
                "secret-token"
            )))]
        );
        assert_eq!(s.challenge(), &ChallengeState::NoChallenge);
    }

    #[test]
    fn test_undecryptable_token_is_login_failure() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        s.solve_challenge("answer".into()).unwrap();

        let actions = s.handle_login_result("t-1", Ok(LoginOutcome::Token("AAAA".into())));
        match &actions[..] {
            [SessionAction::Emit(RemoteAuthEvent::LoginFailed { reason })] => {
                assert!(reason.contains("decryption failed"), "{reason}");
            }
            other => panic!("unexpected actions {:?}", other),
        }
        match s.challenge() {
            ChallengeState::Pending(p) => {
                assert_eq!(p.solved_key.as_deref(), Some("answer"));
                assert!(!p.retry_in_flight);
            }
            other => panic!("expected pending challenge, got {:?}", other),
        }
    }

    #[test]
    fn test_second_answer_rejected_while_retry_in_flight() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        assert_eq!(redeems(&s.solve_challenge("first".into()).unwrap()).len(), 1);
        assert_eq!(
            s.solve_challenge("second".into()),
            Err(ChallengeError::RetryInFlight)
        );

        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-1"))));
        let retry = s.solve_challenge("third".into()).unwrap();
        assert_eq!(
            redeems(&retry)[0].challenge,
            Some(ChallengeResponse {
                key: "third".into(),
                rqtoken: "rq-1".into()
            })
        );
    }

    #[test]
    fn test_failed_retry_allows_new_answer() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        s.solve_challenge("first".into()).unwrap();
        s.handle_login_result("t-1", Err(LoginError::Http("reset".into())));
        assert_eq!(redeems(&s.solve_challenge("second".into()).unwrap()).len(), 1);
    }

    #[test]
    fn test_challenge_retry_increments_and_replaces_token() {
        let mut s = session();

        let first = s
            .handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        match &first[..] {
            [SessionAction::Emit(RemoteAuthEvent::ChallengeRequired(req))] => {
                assert_eq!(req.retry_count, 0);
                assert_eq!(req.sitekey, "site-key");
                assert_eq!(req.required_data, "rq-data");
                assert_eq!(req.page_url, "https://discord.com/login");
            }
            other => panic!("unexpected actions {:?}", other),
        }

        let retry = s.solve_challenge("answer-0".into()).unwrap();
        assert_eq!(
            redeems(&retry),
            vec![RedeemRequest {
                ticket: "t-1".into(),
                challenge: Some(ChallengeResponse {
                    key: "answer-0".into(),
                    rqtoken: "rq-0".into()
                }),
            }]
        );

        let second = s
            .handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-1"))));
        assert!(matches!(
            &second[..],
            [SessionAction::Emit(RemoteAuthEvent::ChallengeRequired(ChallengeRequest { retry_count: 1, .. }))]
        ));

        match s.challenge() {
            ChallengeState::Pending(p) => {
                assert_eq!(p.ticket, "t-1");
                assert_eq!(p.retry_count, 1);
                assert_eq!(p.rqtoken, "rq-1");
                assert_eq!(p.solved_key, None);
            }
            other => panic!("expected pending challenge, got {:?}", other),
        }
        assert_eq!(s.snapshot().challenge_retries, Some(1));
    }

    #[test]
    fn test_pending_login_reuses_solved_challenge_for_same_ticket() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        s.solve_challenge("answer".into()).unwrap();

        let same = s.handle_frame(r#"{"op":"pending_login","ticket":"t-1"}"#, Instant::now());
        assert!(redeems(&same.actions)[0].challenge.is_some());

        let other = s.handle_frame(r#"{"op":"pending_login","ticket":"t-2"}"#, Instant::now());
        assert!(redeems(&other.actions)[0].challenge.is_none());
    }

    #[test]
    fn test_new_ticket_challenge_starts_new_cycle() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-1"))));
        s.handle_login_result("t-2", Ok(LoginOutcome::ChallengeRequired(challenge("rq-a"))));
        match s.challenge() {
            ChallengeState::Pending(p) => {
                assert_eq!(p.ticket, "t-2");
                assert_eq!(p.retry_count, 0);
            }
            other => panic!("expected pending challenge, got {:?}", other),
        }
    }

    #[test]
    fn test_solve_without_challenge() {
        let mut s = session();
        assert_eq!(
            s.solve_challenge("answer".into()),
            Err(ChallengeError::NoChallengePending)
        );
    }

    #[test]
    fn test_solve_after_cancel() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        s.handle_frame(r#"{"op":"cancel"}"#, Instant::now());
        assert_eq!(
            s.solve_challenge("answer".into()),
            Err(ChallengeError::SessionCanceled)
        );
    }

    #[test]
    fn test_login_error_reported_without_state_change() {
        let mut s = session();
        let actions = s
            .handle_login_result(
                "t-1",
                Err(LoginError::UnsupportedChallengeService("recaptcha".into())),
            );
        assert_eq!(
            actions,
            vec![SessionAction::Emit(RemoteAuthEvent::LoginFailed {
                reason: "unsupported challenge service: recaptcha".into()
            })]
        );
        assert_eq!(s.challenge(), &ChallengeState::NoChallenge);
    }

    #[test]
    fn test_on_closed_clears_challenge() {
        let mut s = session();
        s.handle_login_result("t-1", Ok(LoginOutcome::ChallengeRequired(challenge("rq-0"))));
        s.on_closed();
        assert_eq!(s.challenge(), &ChallengeState::NoChallenge);
        assert_eq!(s.socket_state(), SocketState::Closed);
    }
}
