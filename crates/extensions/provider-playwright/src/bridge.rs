//! Node.js Playwright bridge.
//!
//! Manages a Node.js child process that runs Playwright. Requests and
//! responses travel as JSON lines over stdin/stdout. The script also writes
//! unsolicited event lines (`{"event": "pageClosed", "pageId": ...}`), which
//! are handed to the bridge's event handler.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, RwLock, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{PlaywrightError, RemoteErrorKind};

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct PlaywrightBridgeConfig {
    /// Path to Node.js executable. Looked up on `PATH` when unset.
    pub node_path: Option<PathBuf>,
    /// Added to an operation's own timeout before the call is abandoned.
    pub response_margin: Duration,
    /// Deadline for starting the bridge and for calls without their own timeout.
    pub startup_timeout: Duration,
}

impl Default for PlaywrightBridgeConfig {
    fn default() -> Self {
        Self {
            node_path: None,
            response_margin: Duration::from_secs(5),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Unsolicited notification from the bridge script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    #[serde(rename_all = "camelCase")]
    PageClosed { page_id: String },
}

pub type EventHandler = Arc<dyn Fn(BridgeEvent) + Send + Sync>;

/// Request sent to the bridge.
#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

/// Response from the bridge.
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<BridgeErrorResponse>,
}

#[derive(Debug, Deserialize)]
struct BridgeErrorResponse {
    message: String,
    #[serde(default)]
    kind: RemoteErrorKind,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Incoming {
    Event(BridgeEvent),
    Response(BridgeResponse),
}

type PendingRequests = HashMap<u64, oneshot::Sender<Result<Value, PlaywrightError>>>;

/// Node.js Playwright bridge. The process starts on the first call and is
/// restarted on the next call if it has exited.
pub struct PlaywrightBridge {
    config: PlaywrightBridgeConfig,
    process: Mutex<Option<Child>>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    request_id: AtomicU64,
    pending: Arc<RwLock<PendingRequests>>,
    on_event: Option<EventHandler>,
}

impl PlaywrightBridge {
    pub fn new(config: PlaywrightBridgeConfig) -> Self {
        Self {
            config,
            process: Mutex::new(None),
            stdin: Arc::new(Mutex::new(None)),
            request_id: AtomicU64::new(1),
            pending: Arc::new(RwLock::new(HashMap::new())),
            on_event: None,
        }
    }

    /// Deliver event lines to `handler`. The handler runs on the reader task
    /// and must not block.
    pub fn with_event_handler(mut self, handler: EventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    pub fn config(&self) -> &PlaywrightBridgeConfig {
        &self.config
    }

    /// Call a bridge method, waiting at most the startup timeout.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, PlaywrightError> {
        self.ensure_started().await?;
        self.send(method, params, self.config.startup_timeout).await
    }

    /// Call a bridge method for an operation bounded by `timeout_ms`. The
    /// call is abandoned after the operation's timeout plus the margin.
    pub async fn call_timed(
        &self,
        method: &str,
        params: Value,
        timeout_ms: u64,
    ) -> Result<Value, PlaywrightError> {
        self.ensure_started().await?;
        let deadline = Duration::from_millis(timeout_ms) + self.config.response_margin;
        self.send(method, params, deadline).await
    }

    /// Whether the bridge process is currently alive.
    pub async fn is_running(&self) -> bool {
        match self.process.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Stop the bridge process.
    pub async fn stop(&self) {
        let mut process = self.process.lock().await;
        let Some(mut child) = process.take() else {
            return;
        };

        if let Err(e) = self.send("shutdown", Value::Null, Duration::from_secs(2)).await {
            debug!("Bridge shutdown request failed: {}", e);
        }
        if let Err(e) = child.kill().await {
            debug!("Killing bridge process failed: {}", e);
        }
        *self.stdin.lock().await = None;
        info!("Playwright bridge stopped");
    }

    async fn ensure_started(&self) -> Result<(), PlaywrightError> {
        let mut process = self.process.lock().await;
        if let Some(child) = process.as_mut() {
            match child.try_wait() {
                Ok(None) => return Ok(()),
                Ok(Some(status)) => warn!("Playwright bridge exited ({}), restarting", status),
                Err(e) => warn!("Playwright bridge state unknown ({}), restarting", e),
            }
            *process = None;
        }

        let child = self.spawn().await?;
        *process = Some(child);

        // The lock stays held until the script answers so concurrent callers
        // never write to a half-started bridge.
        let ready = match self
            .send("ping", Value::Null, self.config.startup_timeout)
            .await
        {
            Ok(ready) => ready,
            Err(e) => {
                if let Some(mut child) = process.take() {
                    let _ = child.kill().await;
                }
                return Err(match e {
                    PlaywrightError::Remote {
                        kind: RemoteErrorKind::NotInstalled,
                        ..
                    } => PlaywrightError::PlaywrightNotInstalled,
                    other => PlaywrightError::BridgeStartFailed(other.to_string()),
                });
            }
        };
        if ready.as_str() != Some("pong") {
            return Err(PlaywrightError::BridgeStartFailed(
                "Bridge did not respond correctly to ping".to_string(),
            ));
        }

        info!("Playwright bridge started");
        Ok(())
    }

    async fn spawn(&self) -> Result<Child, PlaywrightError> {
        let node_path = self.find_node()?;

        let script_path = std::env::temp_dir().join("autorpa_playwright_bridge.js");
        tokio::fs::write(&script_path, crate::bridge_script::BRIDGE_SCRIPT)
            .await
            .map_err(|e| {
                PlaywrightError::BridgeStartFailed(format!("Failed to write bridge script: {}", e))
            })?;

        info!("Starting Playwright bridge at {:?}", script_path);

        let mut child = Command::new(&node_path)
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaywrightError::BridgeStartFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlaywrightError::BridgeStartFailed("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PlaywrightError::BridgeStartFailed("Failed to get stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[Playwright Bridge] {}", line);
                }
            });
        }

        let pending = self.pending.clone();
        let stdin_slot = self.stdin.clone();
        let on_event = self.on_event.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                dispatch_line(&line, &pending, on_event.as_ref()).await;
            }

            stdin_slot.lock().await.take();
            let orphaned: Vec<_> = pending.write().await.drain().collect();
            if !orphaned.is_empty() {
                warn!("Bridge exited with {} requests in flight", orphaned.len());
            }
            for (_, sender) in orphaned {
                let _ = sender.send(Err(PlaywrightError::BridgeDied(
                    "stdout closed".to_string(),
                )));
            }
        });

        *self.stdin.lock().await = Some(stdin);
        Ok(child)
    }

    async fn send(
        &self,
        method: &str,
        params: Value,
        deadline: Duration,
    ) -> Result<Value, PlaywrightError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let line = serde_json::to_string(&BridgeRequest { id, method, params })?;
        debug!("Bridge request: {}", truncate(&line, 200));

        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(id, tx);

        let written = async {
            let mut stdin_guard = self.stdin.lock().await;
            let stdin = stdin_guard.as_mut().ok_or(PlaywrightError::NotInitialized)?;
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
            Ok::<_, PlaywrightError>(())
        }
        .await;
        if let Err(e) = written {
            self.pending.write().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(PlaywrightError::CommunicationError(
                "Response channel closed".to_string(),
            )),
            Err(_) => {
                self.pending.write().await.remove(&id);
                Err(PlaywrightError::Timeout(format!(
                    "Method {} timed out after {}ms",
                    method,
                    deadline.as_millis()
                )))
            }
        }
    }

    fn find_node(&self) -> Result<PathBuf, PlaywrightError> {
        if let Some(path) = &self.config.node_path {
            return if path.exists() {
                Ok(path.clone())
            } else {
                Err(PlaywrightError::NodeNotFound)
            };
        }
        which::which("node").map_err(|_| PlaywrightError::NodeNotFound)
    }
}

async fn dispatch_line(
    line: &str,
    pending: &RwLock<PendingRequests>,
    on_event: Option<&EventHandler>,
) {
    debug!("Bridge response: {}", truncate(line, 200));

    match serde_json::from_str::<Incoming>(line) {
        Ok(Incoming::Event(event)) => match on_event {
            Some(handler) => handler(event),
            None => debug!("Unhandled bridge event: {:?}", event),
        },
        Ok(Incoming::Response(response)) => {
            let Some(sender) = pending.write().await.remove(&response.id) else {
                debug!("Late response for request {}", response.id);
                return;
            };
            let result = match response.error {
                Some(err) => Err(PlaywrightError::Remote {
                    kind: err.kind,
                    message: err.message,
                }),
                None => Ok(response.result.unwrap_or(Value::Null)),
            };
            let _ = sender.send(result);
        }
        Err(e) => error!("Failed to parse bridge line: {} - {}", e, line),
    }
}

fn truncate(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
