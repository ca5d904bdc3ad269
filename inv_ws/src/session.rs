use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use inv_http::Actor;
use inv_ratelimit::RateLimitQuota;
use serde_json::Value;
use tungstenite::Message;
use tungstenite::WebSocket;
use tungstenite::stream::MaybeTlsStream;

use crate::error::Result;
use crate::error::SessionError;
use crate::router::PushRouter;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> String {
    format!("push-{}", NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    /// Frames sent right after connecting, in order
    pub subscriptions: Vec<Value>,
    /// How often the read loop wakes up to check the stop flag
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), subscriptions: Vec::new(), poll_interval: Duration::from_millis(250) }
    }

    pub fn subscribe(mut self, frame: Value) -> Self {
        self.subscriptions.push(frame);
        self
    }
}

/// One blocking push connection feeding a [`PushRouter`]
///
/// Meant to own a dedicated thread: `connect`, then `run` until the server
/// closes the socket or the running flag is cleared. With an actor attached,
/// every subscription frame is charged to the shared throttle first; each
/// connection gets its own id so connection scoped rules count per socket.
pub struct PushSession<M> {
    config: SessionConfig,
    router: Arc<PushRouter<M>>,
    websocket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    actor: Option<Actor>,
    subscribe_quotas: Vec<RateLimitQuota>,
    connection_actor: Option<Actor>,
    running: Arc<AtomicBool>,
    frames_received: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
}

impl<M: Clone> PushSession<M> {
    pub fn new(config: SessionConfig, router: Arc<PushRouter<M>>) -> Self {
        Self {
            config,
            router,
            websocket: None,
            actor: None,
            subscribe_quotas: Vec::new(),
            connection_actor: None,
            running: Arc::new(AtomicBool::new(false)),
            frames_received: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Charge `subscribe_quotas` through `actor` before each subscription frame
    pub fn with_actor(mut self, actor: Actor, subscribe_quotas: Vec<RateLimitQuota>) -> Self {
        self.actor = Some(actor);
        self.subscribe_quotas = subscribe_quotas;
        self
    }

    /// Actor bound to the current connection id, present while connected
    pub fn connection_actor(&self) -> Option<&Actor> {
        self.connection_actor.as_ref()
    }

    /// Shared stop flag, e.g. for a Ctrl-C handler
    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn router(&self) -> &Arc<PushRouter<M>> {
        &self.router
    }

    pub fn connect(&mut self) -> Result<()> {
        tracing::info!("Connecting to push endpoint: {}", self.config.url);
        let (websocket, response) = tungstenite::connect(self.config.url.as_str())?;
        tracing::info!("Connected successfully. Response status: {}", response.status());

        set_read_timeout(&websocket, self.config.poll_interval)?;
        self.websocket = Some(websocket);
        self.connection_actor = self.actor.as_ref().map(|actor| actor.clone().with_connection_id(next_connection_id()));
        self.running.store(true, Ordering::Relaxed);

        for frame in self.config.subscriptions.clone() {
            self.subscribe(&frame)?;
        }
        Ok(())
    }

    /// Send a subscription frame once its quotas are granted
    pub fn subscribe(&mut self, frame: &Value) -> Result<()> {
        if self.websocket.is_none() {
            return Err(SessionError::NotConnected);
        }

        if let Some(actor) = &self.connection_actor {
            if let Err(err) = actor.try_charge(&self.subscribe_quotas) {
                tracing::warn!("Subscription denied: {err}");
                return Err(err.into());
            }
        }
        self.send(frame)
    }

    pub fn send(&mut self, frame: &Value) -> Result<()> {
        let websocket = self.websocket.as_mut().ok_or(SessionError::NotConnected)?;
        let text = serde_json::to_string(frame)?;
        tracing::debug!("Sending frame: {text}");
        websocket.send(Message::text(text))?;
        Ok(())
    }

    /// Read frames into the router until stopped or closed
    ///
    /// The running flag is raised by `connect`; a stop requested before `run`
    /// makes it return at once.
    pub fn run(&mut self) -> Result<()> {
        let websocket = self.websocket.as_mut().ok_or(SessionError::NotConnected)?;

        while self.running.load(Ordering::Relaxed) {
            match websocket.read() {
                Ok(Message::Text(text)) => {
                    self.frames_received.fetch_add(1, Ordering::Relaxed);
                    self.bytes_received.fetch_add(text.len() as u64, Ordering::Relaxed);
                    // Failures are logged and counted by the router
                    let _ = self.router.on_text(text.as_str());
                }
                Ok(Message::Binary(data)) => {
                    self.frames_received.fetch_add(1, Ordering::Relaxed);
                    self.bytes_received.fetch_add(data.len() as u64, Ordering::Relaxed);
                    match std::str::from_utf8(&data) {
                        Ok(text) => {
                            let _ = self.router.on_text(text);
                        }
                        Err(_) => tracing::warn!("Dropping non UTF-8 binary frame ({} bytes)", data.len()),
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("WebSocket closed by server: {frame:?}");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref err)) if matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                    continue;
                }
                Err(tungstenite::Error::ConnectionClosed) => {
                    tracing::info!("WebSocket connection closed");
                    break;
                }
                Err(err) => {
                    tracing::error!("WebSocket error: {err}");
                    self.running.store(false, Ordering::Relaxed);
                    return Err(err.into());
                }
            }
        }

        self.running.store(false, Ordering::Relaxed);
        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn close(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.connection_actor = None;
        if let Some(mut websocket) = self.websocket.take() {
            if let Err(err) = websocket.close(None) {
                tracing::debug!("Close handshake failed: {err}");
            }
        }
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }
}

fn set_read_timeout(websocket: &WebSocket<MaybeTlsStream<TcpStream>>, timeout: Duration) -> Result<()> {
    match websocket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout))?,
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(timeout))?,
        _ => tracing::debug!("Read timeout not supported for this stream, stop takes effect on the next frame"),
    }
    Ok(())
}
