use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use feedscope_types::{ConnectionState, StreamStats};

use crate::error::StreamError;
use crate::sse::{DEFAULT_EVENT_TYPE, SseParser};

/// Reconnection delay used until the server sends `retry:`
pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);

/// Connection counters shared between the task and its manager
type SharedStats = Arc<RwLock<StreamStats>>;

/// What the stream task reports to the main loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A connection was established
    Open,
    /// A `message` event arrived
    Message(String),
    /// The connection failed or dropped; a retry is scheduled
    Error(String),
    /// The server answered 204; no further retries
    Closed,
}

/// How a single connection ended without an error
enum ConnectionEnd {
    /// Body finished; reconnect
    Eof,
    /// Server asked us to stop
    Closed,
    /// Nobody is listening anymore
    ReceiverGone,
}

/// Owns the background task that follows the event stream
pub struct StreamManager {
    /// Cancellation token for stopping the stream
    cancel: CancellationToken,

    /// Active stream task handle
    task: Option<tokio::task::JoinHandle<()>>,

    stats: SharedStats,
}

impl StreamManager {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            task: None,
            stats: Arc::new(RwLock::new(StreamStats::default())),
        }
    }

    /// Start following `url`, replacing any running stream
    pub fn start(
        &mut self,
        client: Client,
        url: Url,
        retry: Duration,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
    ) {
        self.stop();
        *self.stats.write() = StreamStats::default();

        let cancel = self.cancel.clone();
        let stats = Arc::clone(&self.stats);
        self.task = Some(tokio::spawn(async move {
            run_stream(client, url, retry, event_tx, cancel, stats).await;
        }));
    }

    /// Stop the stream
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Create a fresh cancellation token for future streams
        self.cancel = CancellationToken::new();
    }

    /// Snapshot of the connection counters
    pub fn stats(&self) -> StreamStats {
        self.stats.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_stream(
    client: Client,
    url: Url,
    mut retry: Duration,
    event_tx: mpsc::UnboundedSender<StreamEvent>,
    cancel: CancellationToken,
    stats: SharedStats,
) {
    let mut last_event_id: Option<String> = None;

    loop {
        stats.write().state = ConnectionState::Connecting;

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = connect_once(&client, &url, &mut last_event_id, &mut retry, &event_tx, &stats) => outcome,
        };

        let reason = match outcome {
            Ok(ConnectionEnd::ReceiverGone) => return,
            Ok(ConnectionEnd::Closed) => {
                info!(%url, "server closed the event stream");
                stats.write().state = ConnectionState::Closed;
                let _ = event_tx.send(StreamEvent::Closed);
                return;
            }
            Ok(ConnectionEnd::Eof) => "stream ended".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(%url, %reason, retry_ms = retry.as_millis() as u64, "event stream disconnected");
        {
            let mut stats = stats.write();
            stats.state = ConnectionState::Reconnecting;
            stats.failures += 1;
        }
        if event_tx.send(StreamEvent::Error(reason)).is_err() {
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(retry) => {}
        }
    }
}

/// One connection attempt. Non-2xx statuses and a wrong media type are
/// reported as errors and retried like dropped connections; only 204 stops
/// the loop.
async fn connect_once(
    client: &Client,
    url: &Url,
    last_event_id: &mut Option<String>,
    retry: &mut Duration,
    event_tx: &mpsc::UnboundedSender<StreamEvent>,
    stats: &SharedStats,
) -> Result<ConnectionEnd, StreamError> {
    let mut request = client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");
    if let Some(id) = last_event_id.as_deref().filter(|id| !id.is_empty()) {
        request = request.header("Last-Event-ID", id);
    }

    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(ConnectionEnd::Closed);
    }
    if !status.is_success() {
        return Err(StreamError::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !is_event_stream(content_type) {
        return Err(StreamError::ContentType(content_type.to_string()));
    }

    info!(%url, "connected to event stream");
    {
        let mut stats = stats.write();
        stats.state = ConnectionState::Open;
        stats.connects += 1;
    }
    if event_tx.send(StreamEvent::Open).is_err() {
        return Ok(ConnectionEnd::ReceiverGone);
    }

    let mut parser = SseParser::resume(last_event_id.clone());
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;

        for event in parser.feed(&chunk) {
            if event.event_type != DEFAULT_EVENT_TYPE {
                debug!(event_type = %event.event_type, "ignoring named event");
                continue;
            }

            stats.write().events += 1;
            if event_tx.send(StreamEvent::Message(event.data)).is_err() {
                return Ok(ConnectionEnd::ReceiverGone);
            }
        }

        if let Some(id) = parser.last_event_id() {
            if last_event_id.as_deref() != Some(id) {
                *last_event_id = Some(id.to_string());
                stats.write().last_event_id = Some(id.to_string());
            }
        }
        if let Some(delay) = parser.take_retry() {
            debug!(retry_ms = delay.as_millis() as u64, "server changed retry delay");
            *retry = delay;
        }
    }

    Ok(ConnectionEnd::Eof)
}

/// Media type check ignoring parameters and case
fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("text/event-stream"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    const SSE_HEAD: &str =
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = vec![0u8; 4096];
        let mut request = Vec::new();
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&request).to_lowercase()
    }

    async fn respond(socket: &mut TcpStream, response: String) {
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<StreamEvent>) -> StreamEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for stream event")
            .expect("stream channel closed")
    }

    #[tokio::test]
    async fn test_stream_reconnects_with_last_event_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let first = read_request(&mut socket).await;
            respond(
                &mut socket,
                format!(
                    "{}retry: 10\n: ping\n\nid: 42\ndata: hello\n\nevent: status\ndata: skip\n\ndata: {{\"a\":1}}\n\n",
                    SSE_HEAD
                ),
            )
            .await;

            let (mut socket, _) = listener.accept().await.unwrap();
            let second = read_request(&mut socket).await;
            respond(
                &mut socket,
                "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string(),
            )
            .await;

            (first, second)
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = StreamManager::new();
        let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
        manager.start(local_client(), url, Duration::from_secs(30), tx);

        assert_eq!(next_event(&mut rx).await, StreamEvent::Open);
        assert_eq!(
            next_event(&mut rx).await,
            StreamEvent::Message("hello".to_string())
        );
        assert_eq!(
            next_event(&mut rx).await,
            StreamEvent::Message("{\"a\":1}".to_string())
        );
        assert!(matches!(next_event(&mut rx).await, StreamEvent::Error(_)));
        // The server's 10ms retry replaces the 30s default
        assert_eq!(next_event(&mut rx).await, StreamEvent::Closed);

        let (first, second) = server.await.unwrap();
        assert!(first.contains("accept: text/event-stream"));
        assert!(!first.contains("last-event-id"));
        assert!(second.contains("last-event-id: 42"));

        let stats = manager.stats();
        assert_eq!(stats.state, ConnectionState::Closed);
        assert_eq!(stats.connects, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.events, 2);
        assert_eq!(stats.last_event_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_error_status_is_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            respond(
                &mut socket,
                "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    .to_string(),
            )
            .await;

            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            respond(&mut socket, format!("{}data: back\n\n", SSE_HEAD)).await;
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = StreamManager::new();
        let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
        manager.start(local_client(), url, Duration::from_millis(10), tx);

        match next_event(&mut rx).await {
            StreamEvent::Error(reason) => assert!(reason.contains("500")),
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(next_event(&mut rx).await, StreamEvent::Open);
        assert_eq!(
            next_event(&mut rx).await,
            StreamEvent::Message("back".to_string())
        );

        server.await.unwrap();
        manager.stop();
        assert!(!manager.is_running());
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            respond(
                &mut socket,
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\nConnection: close\r\n\r\nhi"
                    .to_string(),
            )
            .await;
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = StreamManager::new();
        let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
        manager.start(local_client(), url, Duration::from_secs(30), tx);

        match next_event(&mut rx).await {
            StreamEvent::Error(reason) => assert!(reason.contains("text/html")),
            other => panic!("expected error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[test]
    fn test_event_stream_media_type() {
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("Text/Event-Stream; charset=utf-8"));
        assert!(!is_event_stream("text/event-streams"));
        assert!(!is_event_stream("text/html"));
        assert!(!is_event_stream(""));
    }

    #[tokio::test]
    async fn test_unfinished_event_is_not_acknowledged() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            // Connection drops before event 2 is terminated
            respond(
                &mut socket,
                format!("{}id: 1\ndata: a\n\nid: 2\ndata: b\n", SSE_HEAD),
            )
            .await;

            let (mut socket, _) = listener.accept().await.unwrap();
            let second = read_request(&mut socket).await;
            respond(
                &mut socket,
                format!("{}id: 2\ndata: b\n\n", SSE_HEAD),
            )
            .await;

            second
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = StreamManager::new();
        let url = Url::parse(&format!("http://{}/events", addr)).unwrap();
        manager.start(local_client(), url, Duration::from_millis(10), tx);

        assert_eq!(next_event(&mut rx).await, StreamEvent::Open);
        assert_eq!(next_event(&mut rx).await, StreamEvent::Message("a".to_string()));
        assert!(matches!(next_event(&mut rx).await, StreamEvent::Error(_)));
        assert_eq!(next_event(&mut rx).await, StreamEvent::Open);
        assert_eq!(next_event(&mut rx).await, StreamEvent::Message("b".to_string()));

        let second = server.await.unwrap();
        assert!(second.contains("last-event-id: 1\r\n"));
        manager.stop();
    }
}
