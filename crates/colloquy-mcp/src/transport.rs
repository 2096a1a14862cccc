//! Stdio transport for MCP server communication.
//!
//! Spawns the server as a child process and multiplexes JSON-RPC over its
//! stdio: one writer task drains an outbound channel into stdin, one reader
//! task parses newline-delimited responses from stdout and resolves them
//! against a pending-request map keyed by id. Every request gets its own
//! deadline, so a slow or dead server rejects only the calls that waited on
//! it. When the reader sees EOF (server exited) or the transport shuts
//! down, all pending requests are drained so their callers observe
//! [`McpError::ConnectionClosed`] rather than hanging.

use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Async stdio transport for one MCP server process.
#[derive(Debug)]
pub struct StdioTransport {
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: PendingMap,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    child: Arc<Mutex<Child>>,
    timeout: Duration,
}

impl StdioTransport {
    /// Spawn the server process and start the reader/writer tasks.
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: command.to_string(),
            source: e,
        })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        // Writer task: drains the outbound channel into child stdin
        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(line) = write_rx.recv().await {
                if stdin.write_all(line.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    break;
                }
            }
        });

        // Reader task: correlates inbound lines against the pending map.
        // On EOF the map is drained, rejecting every in-flight call.
        let pending_for_reader = Arc::clone(&pending);
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let response: JsonRpcResponse = match serde_json::from_str(&line) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Dropping unparseable MCP line: {e}");
                        continue;
                    }
                };
                match response.id {
                    Some(id) => {
                        let mut pending = pending_for_reader.lock().await;
                        if let Some(tx) = pending.remove(&id) {
                            let _ = tx.send(response);
                        }
                    }
                    // Server-initiated notifications are ignored
                    None => {}
                }
            }
            pending_for_reader.lock().await.clear();
        });

        Ok(Self {
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            reader_handle,
            writer_handle,
            child: Arc::new(Mutex::new(child)),
            timeout,
        })
    }

    /// Send a request and await its correlated response.
    ///
    /// Ids are allocated from a per-transport counter and never reused.
    pub async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        let serialized = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        if self.write_tx.send(serialized).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(McpError::ConnectionClosed);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            // Sender dropped: the reader drained the map on EOF or shutdown
            Ok(Err(_)) => Err(McpError::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Send a notification; no response is expected.
    pub async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        let serialized = serde_json::to_string(&notification)?;

        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| McpError::ConnectionClosed)
    }

    /// Shut down: reject all pending calls, close stdin, wait briefly for a
    /// graceful exit, then kill.
    pub async fn shutdown(self) {
        self.pending.lock().await.clear();

        // Closing the write channel sends EOF to child stdin
        drop(self.write_tx);

        let child = self.child;
        let graceful = tokio::time::timeout(Duration::from_secs(5), async {
            let mut child = child.lock().await;
            let _ = child.wait().await;
        })
        .await;

        if graceful.is_err() {
            let mut child = child.lock().await;
            let _ = child.kill().await;
        }

        self.reader_handle.abort();
        self.writer_handle.abort();
    }
}
