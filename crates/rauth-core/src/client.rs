//! Caller-facing client and the session driver task.
//!
//! [`RemoteAuthClient::connect`] opens the channel and spawns one task that
//! owns the [`Session`]. The task multiplexes four inputs with
//! `tokio::select!`:
//!
//! - inbound frames, handled strictly in arrival order
//! - the liveness interval, started by `hello`
//! - completions of background ticket redemptions
//! - commands from the [`ClientHandle`]
//!
//! Redemptions run in their own tasks so a slow endpoint never blocks frame
//! delivery; their results re-enter the session through a channel and are
//! checked against the current state (e.g. `canceled`) before any event.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use rauth_crypto::{CryptoError, SessionKeyPair};
use rauth_proto::OutboundFrame;

use crate::channel::{ChannelConnector, FrameChannel, SocketState};
use crate::config::ClientConfig;
use crate::errors::{CoreError, LoginError};
use crate::events::{CloseReason, EventSink, EventStream, RemoteAuthEvent, SessionSnapshot};
use crate::login::{HttpExecutor, LoginExchange, LoginOutcome, RedeemRequest};
use crate::session::{FrameOutcome, Session, SessionAction};

const COMMAND_BUFFER: usize = 16;

/// Builds sessions against a gateway.
pub struct RemoteAuthClient {
    config: ClientConfig,
    connector: Arc<dyn ChannelConnector>,
    http: Arc<dyn HttpExecutor>,
}

impl RemoteAuthClient {
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn ChannelConnector>,
        http: Arc<dyn HttpExecutor>,
    ) -> Self {
        Self {
            config,
            connector,
            http,
        }
    }

    /// Client using the WebSocket connector and the reqwest executor.
    #[cfg(all(feature = "http", feature = "websocket"))]
    pub fn with_defaults(config: ClientConfig) -> Result<Self, CoreError> {
        let http = crate::http_client::ReqwestExecutor::new()?;
        Ok(Self::new(
            config,
            Arc::new(crate::ws_channel::WsConnector),
            Arc::new(http),
        ))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Generate a fresh key pair and connect.
    pub async fn connect(self) -> Result<(ClientHandle, EventStream), CoreError> {
        let keys = tokio::task::spawn_blocking(SessionKeyPair::generate)
            .await
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))??;
        self.connect_with_keys(keys).await
    }

    /// Connect with a caller-supplied key pair. The session owns it until it
    /// closes.
    pub async fn connect_with_keys(
        self,
        keys: SessionKeyPair,
    ) -> Result<(ClientHandle, EventStream), CoreError> {
        self.config.validate()?;

        let mut session = Session::new(self.config.clone(), keys);
        session.set_socket_state(SocketState::Connecting);

        let channel = match self
            .connector
            .open(&self.config.gateway_url, &self.config.origin)
            .await
        {
            Ok(channel) => channel,
            Err(e) => {
                session.on_closed();
                error!(error = %e, url = %self.config.gateway_url, "gateway connection failed");
                return Err(e.into());
            }
        };
        session.set_socket_state(SocketState::Open);
        info!(url = %self.config.gateway_url, "connected to gateway");

        let (events, stream) = EventSink::channel();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            debug: self.config.debug,
            exchange: LoginExchange::new(&self.config, self.http),
            session,
            channel,
            events,
            commands: command_rx,
            completion_tx,
            completions: completion_rx,
            heartbeat: None,
            disconnect_reply: None,
        };
        let task = tokio::spawn(driver.run());

        Ok((
            ClientHandle {
                commands: command_tx,
                task,
            },
            stream,
        ))
    }
}

enum Command {
    SolveChallenge {
        value: String,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running session.
///
/// Dropping the handle disconnects the session.
pub struct ClientHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<Result<(), CoreError>>,
}

impl ClientHandle {
    /// Answer the outstanding challenge and retry the blocked ticket.
    pub async fn solve_challenge(&self, value: impl Into<String>) -> Result<(), CoreError> {
        let value = value.into();
        self.request(|reply| Command::SolveChallenge { value, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, CoreError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Close the channel. Returns once `Closed` has been emitted; a no-op if
    /// the session already ended.
    pub async fn disconnect(&self) -> Result<(), CoreError> {
        match self.request(|reply| Command::Disconnect { reply }).await {
            Ok(()) | Err(CoreError::SessionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait for the session to end. `Err` if it ended on a fatal error.
    pub async fn closed(self) -> Result<(), CoreError> {
        self.task.await.map_err(|_| CoreError::SessionClosed)?
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| CoreError::SessionClosed)?;
        rx.await.map_err(|_| CoreError::SessionClosed)
    }
}

struct Completion {
    ticket: String,
    result: Result<LoginOutcome, LoginError>,
}

struct Driver {
    debug: bool,
    session: Session,
    channel: Box<dyn FrameChannel>,
    events: EventSink,
    exchange: LoginExchange,
    commands: mpsc::Receiver<Command>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    heartbeat: Option<Interval>,
    disconnect_reply: Option<oneshot::Sender<()>>,
}

impl Driver {
    async fn run(mut self) -> Result<(), CoreError> {
        let result = self.event_loop().await;
        let reason = match &result {
            Ok(reason) => reason.clone(),
            Err(e) => {
                error!(error = %e, "session failed");
                CloseReason::Fatal(e.to_string())
            }
        };
        self.shutdown(reason).await;
        result.map(|_| ())
    }

    async fn event_loop(&mut self) -> Result<CloseReason, CoreError> {
        loop {
            tokio::select! {
                inbound = self.channel.recv() => match inbound {
                    Some(Ok(text)) => self.on_text(&text).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(CloseReason::ClosedByPeer),
                },

                _ = tick(&mut self.heartbeat) => {
                    let frame = self.session.heartbeat(Instant::now());
                    self.send(frame).await?;
                }

                Some(done) = self.completions.recv() => self.on_completion(done).await?,

                command = self.commands.recv() => match command {
                    Some(Command::SolveChallenge { value, reply }) => {
                        match self.session.solve_challenge(value) {
                            Ok(actions) => {
                                let _ = reply.send(Ok(()));
                                self.apply(actions).await?;
                            }
                            Err(e) => {
                                let _ = reply.send(Err(e.into()));
                            }
                        }
                    }
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(self.session.snapshot());
                    }
                    Some(Command::Disconnect { reply }) => {
                        self.disconnect_reply = Some(reply);
                        return Ok(CloseReason::Disconnected);
                    }
                    // every handle dropped
                    None => return Ok(CloseReason::Disconnected),
                },
            }
        }
    }

    async fn on_text(&mut self, text: &str) -> Result<(), CoreError> {
        if self.debug {
            debug!("<- {}", text);
        }
        let FrameOutcome { actions, error } = self.session.handle_frame(text, Instant::now());
        self.apply(actions).await?;
        match error {
            Some(e) => self.tolerate(e),
            None => Ok(()),
        }
    }

    async fn on_completion(&mut self, done: Completion) -> Result<(), CoreError> {
        let actions = self.session.handle_login_result(&done.ticket, done.result);
        self.apply(actions).await
    }

    /// Frame-local errors are skipped in debug mode and fatal otherwise.
    fn tolerate(&self, e: CoreError) -> Result<(), CoreError> {
        if self.debug && e.is_frame_local() {
            warn!(error = %e, "malformed frame skipped");
            Ok(())
        } else {
            Err(e)
        }
    }

    async fn apply(&mut self, actions: Vec<SessionAction>) -> Result<(), CoreError> {
        for action in actions {
            match action {
                SessionAction::Send(frame) => self.send(frame).await?,
                SessionAction::StartHeartbeat(period) => self.start_heartbeat(period),
                SessionAction::Emit(event) => self.events.emit(event),
                SessionAction::Redeem(request) => self.spawn_redeem(request),
            }
        }
        Ok(())
    }

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), CoreError> {
        let text = frame.encode()?;
        if self.debug {
            debug!("-> {}", text);
        }
        self.channel.send(text).await?;
        Ok(())
    }

    fn start_heartbeat(&mut self, period: Duration) {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(interval);
        debug!(period_ms = period.as_millis() as u64, "heartbeat started");
    }

    fn spawn_redeem(&self, request: RedeemRequest) {
        let exchange = self.exchange.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = exchange.redeem(&request).await;
            // the session may have closed meanwhile
            let _ = tx.send(Completion {
                ticket: request.ticket,
                result,
            });
        });
    }

    async fn shutdown(&mut self, reason: CloseReason) {
        self.heartbeat = None;
        self.session.on_closed();
        if let Err(e) = self.channel.close().await {
            debug!(error = %e, "close failed, channel already gone");
        }
        info!(?reason, "session closed");
        self.events.emit(RemoteAuthEvent::Closed { reason });
        if let Some(reply) = self.disconnect_reply.take() {
            let _ = reply.send(());
        }
    }
}

/// Next liveness tick, or never if none was started.
async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
