//! In-memory transport.
//!
//! [`MemoryConnector`] implements [`Connector`] over unbounded channels. Each
//! accepted connection shows up on the paired [`MemoryServer`] as a
//! [`ServerConn`] the test drives directly: push frames to the client, read
//! what the client sent, close or drop the connection.
//!
//! Connect outcomes are scripted with [`ConnectPlan`]. An empty script
//! accepts. Closing from the client side is acknowledged automatically, the
//! way a WebSocket peer answers a close frame.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use parley_client::{
    CLOSE_REASON, Connector, Endpoint, Frame, FrameSink, FrameStream, TransportError,
    transport::CLOSE_NORMAL,
};
use tokio::sync::mpsc;

type Inbound = Result<Frame, TransportError>;

/// Outcome of the next connect attempt.
#[derive(Debug, Clone)]
pub enum ConnectPlan {
    /// Complete the handshake.
    Accept,
    /// Fail the handshake with this error.
    Refuse(TransportError),
    /// Never complete.
    Hang,
}

#[derive(Default)]
struct Script {
    plans: VecDeque<ConnectPlan>,
    endpoints: Vec<String>,
}

/// Client half: hand this to the controller.
#[derive(Clone)]
pub struct MemoryConnector {
    script: Arc<Mutex<Script>>,
    accepted: mpsc::UnboundedSender<ServerConn>,
}

/// Test half: scripts connect outcomes and accepts connections.
pub struct MemoryServer {
    script: Arc<Mutex<Script>>,
    accepted: mpsc::UnboundedReceiver<ServerConn>,
}

impl MemoryConnector {
    /// Create a connector and its server handle.
    pub fn pair() -> (Self, MemoryServer) {
        let script = Arc::new(Mutex::new(Script::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { script: Arc::clone(&script), accepted: tx }, MemoryServer { script, accepted: rx })
    }

    fn next_plan(&self, endpoint: &Endpoint) -> ConnectPlan {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.endpoints.push(endpoint.as_str().to_owned());
        script.plans.pop_front().unwrap_or(ConnectPlan::Accept)
    }
}

impl std::fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConnector").finish_non_exhaustive()
    }
}

impl Connector for MemoryConnector {
    type Sink = MemorySink;
    type Stream = MemoryStream;

    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> Result<(Self::Sink, Self::Stream), TransportError> {
        match self.next_plan(endpoint) {
            ConnectPlan::Accept => {},
            ConnectPlan::Refuse(err) => return Err(err),
            ConnectPlan::Hang => std::future::pending::<()>().await,
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let faults = Arc::new(WriteFaults::default());

        let conn = ServerConn {
            endpoint: endpoint.as_str().to_owned(),
            to_client: to_client.clone(),
            from_client,
            faults: Arc::clone(&faults),
        };
        self.accepted.send(conn).map_err(|_| TransportError::Connect("server gone".into()))?;

        tracing::debug!(%endpoint, "memory connection accepted");
        let sink = MemorySink { to_server, echo: to_client.downgrade(), faults, closed: false };
        Ok((sink, MemoryStream { from_server }))
    }
}

impl MemoryServer {
    /// Queue the outcome of a future connect attempt.
    pub fn plan(&self, plan: ConnectPlan) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).plans.push_back(plan);
    }

    /// Endpoints of every connect attempt so far, accepted or not.
    pub fn endpoints(&self) -> Vec<String> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).endpoints.clone()
    }

    /// Wait for the next accepted connection.
    pub async fn accept(&mut self) -> Option<ServerConn> {
        self.accepted.recv().await
    }
}

impl std::fmt::Debug for MemoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryServer").finish_non_exhaustive()
    }
}

/// Server side of one accepted connection.
#[derive(Debug)]
pub struct ServerConn {
    endpoint: String,
    to_client: mpsc::UnboundedSender<Inbound>,
    from_client: mpsc::UnboundedReceiver<Frame>,
    faults: Arc<WriteFaults>,
}

/// Write faults injected from the server side.
#[derive(Debug, Default)]
struct WriteFaults {
    fail: AtomicBool,
    stall: AtomicBool,
}

impl ServerConn {
    /// Endpoint the client connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Deliver a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.to_client.send(Ok(Frame::Text(text.into())));
    }

    /// Deliver a binary frame to the client.
    pub fn send_binary(&self, data: impl Into<Vec<u8>>) {
        let _ = self.to_client.send(Ok(Frame::Binary(data.into())));
    }

    /// Start a server-side close.
    pub fn close(&self, reason: &str) {
        let _ = self
            .to_client
            .send(Ok(Frame::Close { code: CLOSE_NORMAL, reason: reason.to_owned() }));
    }

    /// Fail the client's next read.
    pub fn inject_read_error(&self, reason: &str) {
        let _ = self.to_client.send(Err(TransportError::Receive(reason.to_owned())));
    }

    /// Make every later client write fail.
    pub fn fail_writes(&self) {
        self.faults.fail.store(true, Ordering::SeqCst);
    }

    /// Make every later client write block forever, like a peer that stopped
    /// reading with a full socket buffer.
    pub fn stall_writes(&self) {
        self.faults.stall.store(true, Ordering::SeqCst);
    }

    /// Next frame the client sent. `None` once the client side is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_client.recv().await
    }

    /// Frames already sent by the client, without waiting.
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

/// Client write half.
#[derive(Debug)]
pub struct MemorySink {
    to_server: mpsc::UnboundedSender<Frame>,
    // Weak so dropping the ServerConn still ends the client's stream
    echo: mpsc::WeakUnboundedSender<Inbound>,
    faults: Arc<WriteFaults>,
    closed: bool,
}

impl FrameSink for MemorySink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.faults.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Send("injected write failure".into()));
        }
        if self.faults.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let ack = match &frame {
            Frame::Close { code, reason } => {
                self.closed = true;
                Some(Frame::Close { code: *code, reason: reason.clone() })
            },
            _ => None,
        };
        self.to_server.send(frame).map_err(|_| TransportError::Send("peer gone".into()))?;

        // Peer answers a close with a close
        if let Some((ack, echo)) = ack.zip(self.echo.upgrade()) {
            let _ = echo.send(Ok(ack));
        }
        Ok(())
    }
}

/// Client read half.
#[derive(Debug)]
pub struct MemoryStream {
    from_server: mpsc::UnboundedReceiver<Inbound>,
}

impl FrameStream for MemoryStream {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.from_server.recv().await
    }
}

/// Close frame the client sends when leaving.
pub fn client_close_frame() -> Frame {
    Frame::close(CLOSE_REASON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_plan_fails_connect() {
        let (connector, server) = MemoryConnector::pair();
        server.plan(ConnectPlan::Refuse(TransportError::Connect("refused".into())));

        let endpoint = Endpoint::for_identity(
            "ws://chat/ws",
            &parley_client::Identity::new("alice").expect("valid"),
        );
        let err = connector.connect(&endpoint).await.expect_err("refused");

        assert_eq!(err, TransportError::Connect("refused".into()));
        assert_eq!(server.endpoints(), vec!["ws://chat/ws?name=alice".to_string()]);
    }

    #[tokio::test]
    async fn close_is_acknowledged() {
        let (connector, mut server) = MemoryConnector::pair();
        let endpoint = Endpoint::for_identity(
            "ws://chat/ws",
            &parley_client::Identity::new("alice").expect("valid"),
        );
        let (mut sink, mut stream) = connector.connect(&endpoint).await.expect("accepted");
        let mut conn = server.accept().await.expect("connection");

        sink.send(client_close_frame()).await.expect("close sent");

        assert_eq!(conn.recv().await, Some(client_close_frame()));
        assert!(matches!(stream.recv().await, Some(Ok(Frame::Close { .. }))));
        assert_eq!(sink.send(Frame::Text("late".into())).await, Err(TransportError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_writes_never_complete() {
        let (connector, mut server) = MemoryConnector::pair();
        let endpoint = Endpoint::for_identity(
            "ws://chat/ws",
            &parley_client::Identity::new("alice").expect("valid"),
        );
        let (mut sink, _stream) = connector.connect(&endpoint).await.expect("accepted");
        let mut conn = server.accept().await.expect("connection");

        conn.stall_writes();
        let send = tokio::time::timeout(
            std::time::Duration::from_secs(60),
            sink.send(client_close_frame()),
        )
        .await;

        assert!(send.is_err());
        assert!(conn.drain().is_empty());
    }
}
