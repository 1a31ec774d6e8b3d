use std::fmt;
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid origin header: {0}")]
    InvalidOrigin(String),

    #[error("Connection closed")]
    Closed,
}

/// The WebSocket the bridge opens towards one device.
///
/// Binary frames carry the opaque device protocol, the transport only moves them.
/// Cloning is cheap and every clone shares the same socket.
#[derive(Clone)]
pub struct BridgeTransport {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    write_stream: Mutex<SplitSink<WsStream, Message>>,
    read_channel: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl fmt::Debug for BridgeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeTransport")
            .field("url", &self.inner.url)
            .field("open", &self.is_open())
            .finish()
    }
}

impl BridgeTransport {
    /// Connect to the bridge socket at `url`, sending `origin` as the `Origin` header if any.
    pub async fn connect(url: &str, origin: Option<&str>) -> Result<Self, TransportError> {
        let mut request = url.into_client_request()?;
        if let Some(origin) = origin {
            let value = HeaderValue::from_str(origin)
                .map_err(|_| TransportError::InvalidOrigin(origin.to_string()))?;
            request.headers_mut().insert("Origin", value);
        }
        let (ws_stream, _) = connect_async(request).await?;
        let (write, read) = ws_stream.split();

        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(watch::Sender::new(false));
        tokio::spawn(read_loop(url.to_string(), read, tx, closed.clone()));

        tracing::debug!("connected to {url}");
        Ok(Self {
            inner: Arc::new(Inner {
                url: url.to_string(),
                write_stream: Mutex::new(write),
                read_channel: Mutex::new(rx),
                closed,
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Send `data` in a single binary frame.
    pub async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.is_open() {
            tracing::warn!("trying to write to closed socket {}", self.inner.url);
            return Err(TransportError::Closed);
        }
        tracing::debug!("\n--->\t({} bytes) {}", data.len(), hex::encode(data));
        let mut write_stream = self.inner.write_stream.lock().await;
        write_stream.send(Message::Binary(data.to_vec())).await?;
        Ok(())
    }

    /// Wait for the payload of the next binary frame.
    ///
    /// Frames already received are returned even after the socket is closed.
    pub async fn read(&self) -> Result<Vec<u8>, TransportError> {
        let mut read_channel = self.inner.read_channel.lock().await;
        tokio::select! {
            biased;

            data = read_channel.recv() => data.ok_or(TransportError::Closed),
            _ = self.closed() => read_channel.try_recv().map_err(|_| TransportError::Closed),
        }
    }

    pub fn is_open(&self) -> bool {
        !*self.inner.closed.borrow()
    }

    /// Resolves when the socket is closed, by either side.
    pub async fn closed(&self) {
        let mut closed = self.inner.closed.subscribe();
        // Err only if the sender is dropped, which can't happen while `self` is alive
        let _ = closed.wait_for(|closed| *closed).await;
    }

    pub async fn close(&self) {
        if self.inner.closed.send_replace(true) {
            return;
        }
        let mut write_stream = self.inner.write_stream.lock().await;
        if let Err(e) = write_stream.close().await {
            tracing::debug!("closing {}: {e}", self.inner.url);
        }
    }
}

async fn read_loop(
    url: String,
    mut read: SplitStream<WsStream>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    closed: Arc<watch::Sender<bool>>,
) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Binary(data)) => {
                tracing::debug!("\n<---\t({} bytes) {}", data.len(), hex::encode(&data));
                if tx.send(data).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Skip text and ping/pong frames
                continue;
            }
            Err(e) => {
                tracing::warn!("reading from {url}: {e}");
                break;
            }
        }
    }
    tracing::info!("socket {url} closed");
    closed.send_replace(true);
}
