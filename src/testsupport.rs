//! Shared test fixtures for engine, registry and delivery test modules.
//!
//! Fakes here stand in for the three external collaborators (terminal,
//! registry, reply endpoint) so engine behavior can be driven tick by tick
//! without tmux or a network.

use crate::delivery::{DeliveryOutcome, DeliveryRequest, ReplySink};
use crate::error::{RegistryError, TerminalError};
use crate::registry::{Session, SessionRegistry};
use crate::tmux::{PaneTarget, Terminal};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("panerelay-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Session at target `w:{name}.0` with chat id 7.
pub fn session(name: &str) -> Session {
    Session {
        name: name.to_string(),
        target: PaneTarget::format_win_id("w", name, 0),
        endpoint: "http://127.0.0.1:9".to_string(),
        chat_id: 7,
        bot_label: name.to_string(),
        group: "w".to_string(),
    }
}

/// Terminal fake replaying scripted screens per target.
///
/// Each capture pops the next queued screen; the last one stays on screen
/// for every later capture.
#[derive(Default)]
pub struct ScriptedTerminal {
    screens: Mutex<HashMap<String, VecDeque<Vec<String>>>>,
    failing: Mutex<HashSet<String>>,
    captures: Mutex<HashMap<String, usize>>,
    sent: Mutex<Vec<(String, String)>>,
    fail_keys: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTerminal {
    pub fn push_screen(&self, target: &str, lines: &[&str]) {
        self.screens
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push_back(lines.iter().map(|line| line.to_string()).collect());
    }

    /// Make every capture of `target` fail.
    pub fn fail_capture(&self, target: &str) {
        self.failing.lock().unwrap().insert(target.to_string());
    }

    pub fn set_capture_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_send_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::SeqCst);
    }

    pub fn capture_count(&self, target: &str) -> usize {
        self.captures.lock().unwrap().get(target).copied().unwrap_or(0)
    }

    /// Successfully sent `(target, key)` pairs in order.
    pub fn sent_keys(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Terminal for ScriptedTerminal {
    async fn capture(
        &self,
        target: &PaneTarget,
        max_rows: usize,
    ) -> Result<Vec<String>, TerminalError> {
        *self
            .captures
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default() += 1;
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(target.as_str()) {
            return Err(TerminalError::ExecutionFailed(format!("no pane {target}")));
        }
        let mut screens = self.screens.lock().unwrap();
        let queue = screens
            .get_mut(target.as_str())
            .ok_or_else(|| TerminalError::ExecutionFailed(format!("no pane {target}")))?;
        let screen = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        let start = if max_rows == 0 {
            0
        } else {
            screen.len().saturating_sub(max_rows)
        };
        Ok(screen[start..].to_vec())
    }

    async fn send_keys(&self, target: &PaneTarget, key: &str) -> Result<(), TerminalError> {
        if self.fail_keys.load(Ordering::SeqCst) {
            return Err(TerminalError::ExecutionFailed("send-keys refused".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), key.to_string()));
        Ok(())
    }
}

/// Registry fake with a mutable session list and a failure switch.
pub struct StaticRegistry {
    sessions: Mutex<Vec<Session>>,
    failing: AtomicBool,
}

impl StaticRegistry {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_sessions(&self, sessions: Vec<Session>) {
        *self.sessions.lock().unwrap() = sessions;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionRegistry for StaticRegistry {
    async fn load(&self) -> Result<Vec<Session>, RegistryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Invalid("registry unavailable".into()));
        }
        Ok(self.sessions.lock().unwrap().clone())
    }
}

/// Reply sink that records requests and always succeeds after an optional delay.
#[derive(Default)]
pub struct RecordingSink {
    requests: Mutex<Vec<DeliveryRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingSink {
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<DeliveryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        DeliveryOutcome {
            delivered: true,
            attempts: 1,
        }
    }
}

/// One request seen by [`HttpStub`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line and headers.
    pub head: String,
    pub body: String,
}

/// Minimal HTTP/1.1 server answering each connection with the next canned
/// status (200 once the list runs out).
pub struct HttpStub {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl HttpStub {
    pub async fn spawn(statuses: Vec<u16>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            let mut statuses = statuses.into_iter();
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Some(request) = read_request(&mut stream).await else {
                    continue;
                };
                recorded.lock().unwrap().push(request);
                let status = statuses.next().unwrap_or(200);
                let body = if status < 300 { "{\"ok\":true}" } else { "{\"error\":\"boom\"}" };
                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        Self {
            addr,
            requests,
            task,
        }
    }

    /// Server that accepts connections and never answers.
    pub async fn spawn_silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self {
            addr,
            requests: Arc::new(Mutex::new(Vec::new())),
            task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for HttpStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    Some(RecordedRequest {
        head,
        body: String::from_utf8_lossy(&buf[header_end..body_end]).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
        assert!(fixture.path().exists());
    }

    #[tokio::test]
    async fn scripted_terminal_keeps_last_screen() {
        let terminal = ScriptedTerminal::default();
        let target = PaneTarget::new("w:a.0");
        terminal.push_screen("w:a.0", &["one"]);
        terminal.push_screen("w:a.0", &["two", "three"]);
        assert_eq!(terminal.capture(&target, 10).await.unwrap(), vec!["one"]);
        assert_eq!(terminal.capture(&target, 1).await.unwrap(), vec!["three"]);
        assert_eq!(terminal.capture(&target, 0).await.unwrap(), vec!["two", "three"]);
        assert_eq!(terminal.capture_count("w:a.0"), 3);
    }
}
