#![cfg(feature = "websocket")]
//! WebSocket channel to the remote auth gateway.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::channel::{ChannelConnector, FrameChannel};
use crate::errors::ChannelError;

/// Opens TLS WebSocket connections with an `Origin` header.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn open(&self, url: &str, origin: &str) -> Result<Box<dyn FrameChannel>, ChannelError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))?;
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| ChannelError::ConnectionFailed(format!("origin: {}", e)))?;
        request.headers_mut().insert(ORIGIN, origin);

        let (ws, response) = connect_async(request)
            .await
            .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))?;
        debug!(status = %response.status(), "gateway connected");

        Ok(Box::new(WsChannel { ws, open: true }))
    }
}

/// Text-frame view of a WebSocket stream.
pub struct WsChannel {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    open: bool,
}

#[async_trait]
impl FrameChannel for WsChannel {
    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        self.ws
            .send(Message::Text(text))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
        if !self.open {
            return None;
        }
        loop {
            // pings are answered by tungstenite on the next read or write
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "gateway sent close");
                    self.open = false;
                    return None;
                }
                None => {
                    self.open = false;
                    return None;
                }
                Some(Err(e)) => {
                    self.open = false;
                    return Some(Err(ChannelError::Receive(e.to_string())));
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.ws
            .close(None)
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
