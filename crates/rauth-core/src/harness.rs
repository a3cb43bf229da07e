//! Test harness for the remote auth core.
//!
//! In-memory stand-ins for the gateway and the login endpoint, plus the
//! gateway's side of the crypto, so the full flow can run inside one test
//! process.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use rauth_crypto::keypair::{encrypt_to, import_public};
use rauth_crypto::{CryptoError, RsaPublicKey, SessionKeyPair};

use crate::channel::{ChannelConnector, FrameChannel};
use crate::config::ClientConfig;
use crate::errors::{ChannelError, LoginError};
use crate::events::{EventStream, RemoteAuthEvent};
use crate::login::{HttpExecutor, HttpRequest, HttpResponse};

/// Config pointing at non-routable test endpoints.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        gateway_url: "wss://gateway.test/?v=2".to_string(),
        login_url: "https://api.test/remote-auth/login".to_string(),
        ..ClientConfig::default()
    }
}

/// One key pair shared by every test in the process; generation is slow.
pub fn shared_keys() -> &'static SessionKeyPair {
    static KEYS: OnceLock<SessionKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| SessionKeyPair::generate().expect("key generation"))
}

// ============================================================================
// Gateway channel
// ============================================================================

/// Create a connected client channel and the gateway end driving it.
pub fn memory_channel() -> (MemoryChannel, MemoryPeer) {
    let (to_client, inbound) = mpsc::unbounded_channel();
    let (outbound, from_client) = mpsc::unbounded_channel();
    let closed_by_client = Arc::new(AtomicBool::new(false));

    (
        MemoryChannel {
            inbound,
            outbound,
            open: true,
            closed_by_client: closed_by_client.clone(),
        },
        MemoryPeer {
            to_client: Some(to_client),
            from_client,
            closed_by_client,
        },
    )
}

/// Client side of an in-memory channel.
pub struct MemoryChannel {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
    open: bool,
    closed_by_client: Arc<AtomicBool>,
}

#[async_trait]
impl FrameChannel for MemoryChannel {
    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        self.outbound
            .send(text)
            .map_err(|_| ChannelError::Send("peer dropped".into()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
        if !self.open {
            return None;
        }
        match self.inbound.recv().await {
            Some(text) => Some(Ok(text)),
            None => {
                self.open = false;
                None
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.open {
            self.open = false;
            self.closed_by_client.store(true, Ordering::SeqCst);
            self.inbound.close();
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Gateway side of an in-memory channel.
pub struct MemoryPeer {
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed_by_client: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Deliver raw text to the client.
    pub fn send_text(&self, text: impl Into<String>) {
        if let Some(tx) = &self.to_client {
            let _ = tx.send(text.into());
        }
    }

    /// Deliver a JSON frame to the client.
    pub fn send(&self, frame: Value) {
        self.send_text(frame.to_string());
    }

    /// Next frame the client sent, parsed. `None` once the client is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        let text = self.from_client.recv().await?;
        Some(serde_json::from_str(&text).expect("client sent invalid JSON"))
    }

    /// Next client frame whose `op` is not `heartbeat`.
    pub async fn recv_skip_heartbeats(&mut self) -> Option<Value> {
        loop {
            let frame = self.recv().await?;
            if frame["op"] != "heartbeat" {
                return Some(frame);
            }
        }
    }

    /// Close the gateway side.
    pub fn close(&mut self) {
        self.to_client = None;
    }

    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

/// Connector handing out one prepared [`MemoryChannel`].
pub struct MemoryConnector {
    channel: Mutex<Option<MemoryChannel>>,
    opened: Mutex<Vec<(String, String)>>,
}

impl MemoryConnector {
    pub fn new(channel: MemoryChannel) -> Self {
        Self {
            channel: Mutex::new(Some(channel)),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Connector whose every `open` fails.
    pub fn unreachable() -> Self {
        Self {
            channel: Mutex::new(None),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// `(url, origin)` of every open attempt.
    pub fn opened(&self) -> Vec<(String, String)> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl ChannelConnector for MemoryConnector {
    async fn open(&self, url: &str, origin: &str) -> Result<Box<dyn FrameChannel>, ChannelError> {
        self.opened.lock().push((url.to_string(), origin.to_string()));
        match self.channel.lock().take() {
            Some(channel) => Ok(Box::new(channel)),
            None => Err(ChannelError::ConnectionFailed("connection refused".into())),
        }
    }
}

// ============================================================================
// Login endpoint
// ============================================================================

enum Scripted {
    Ready(Result<HttpResponse, LoginError>),
    Held(oneshot::Receiver<Result<HttpResponse, LoginError>>),
}

/// [`HttpExecutor`] answering from a queue of canned responses.
#[derive(Default)]
pub struct ScriptedHttp {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    seen: tokio::sync::Notify,
}

/// A queued response the test releases later.
pub struct HeldResponse {
    tx: oneshot::Sender<Result<HttpResponse, LoginError>>,
}

impl HeldResponse {
    pub fn release(self, status: u16, body: impl Into<String>) {
        let _ = self.tx.send(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
    }
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.queue.lock().push_back(Scripted::Ready(Ok(HttpResponse {
            status,
            body: body.into(),
        })));
    }

    pub fn push_error(&self, error: LoginError) {
        self.queue.lock().push_back(Scripted::Ready(Err(error)));
    }

    /// Queue a response that stays in flight until released.
    pub fn push_held(&self) -> HeldResponse {
        let (tx, rx) = oneshot::channel();
        self.queue.lock().push_back(Scripted::Held(rx));
        HeldResponse { tx }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Wait until at least `count` requests have arrived.
    pub async fn wait_for_requests(&self, count: usize) -> Vec<HttpRequest> {
        loop {
            let notified = self.seen.notified();
            let requests = self.requests();
            if requests.len() >= count {
                return requests;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl HttpExecutor for ScriptedHttp {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, LoginError> {
        self.requests.lock().push(request);
        self.seen.notify_waiters();

        let next = self.queue.lock().pop_front();
        match next {
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(LoginError::Http("held response dropped".into()))),
            None => Err(LoginError::Http("no scripted response".into())),
        }
    }
}

// ============================================================================
// Gateway crypto
// ============================================================================

/// The gateway's view of a session key: encrypts to the advertised key.
pub struct PeerKeys {
    public: RsaPublicKey,
}

impl PeerKeys {
    /// Read the key from a client `init` frame.
    pub fn from_init(frame: &Value) -> Result<Self, CryptoError> {
        let encoded = frame["encoded_public_key"]
            .as_str()
            .ok_or_else(|| CryptoError::PublicKey("init frame has no encoded_public_key".into()))?;
        Ok(Self {
            public: import_public(encoded)?,
        })
    }

    /// Base64 ciphertext of `plaintext`.
    pub fn encrypt(&self, plaintext: impl AsRef<[u8]>) -> String {
        encrypt_to(&self.public, plaintext.as_ref()).expect("encryption to session key")
    }
}

// ============================================================================
// Events
// ============================================================================

/// Next event that is not a raw frame trace.
pub async fn next_event(events: &mut EventStream) -> Option<RemoteAuthEvent> {
    loop {
        match events.recv().await? {
            RemoteAuthEvent::RawFrame(_) => continue,
            event => return Some(event),
        }
    }
}
