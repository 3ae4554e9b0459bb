use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::instrument;

use super::CommandBridge;
use crate::error::AppError;

#[derive(Deserialize)]
struct SidecarReply {
    id: u64,
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl SidecarReply {
    fn into_result(self) -> Result<Value, AppError> {
        match (self.ok, self.error) {
            (_, Some(error)) => Err(AppError::Transport(error)),
            (Some(ok), None) => Ok(ok),
            (None, None) => Err(AppError::Transport(
                "Backend reply carried neither result nor error".into(),
            )),
        }
    }
}

type ReplySender = oneshot::Sender<Result<Value, AppError>>;

/// Callers waiting on a reply, by request id. `None` once stdout has closed.
type PendingReplies = Arc<Mutex<Option<HashMap<u64, ReplySender>>>>;

/// Backend running as a child process, one JSON object per line each way.
///
/// Writes are serialized on stdin; a single reader task owns stdout and hands
/// each reply to the caller waiting on its id, so calls overlap freely.
pub struct SidecarBridge {
    program: String,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    pending: PendingReplies,
    request_id: AtomicU64,
}

impl SidecarBridge {
    pub async fn spawn(program: &str, args: &[String]) -> Result<Self, AppError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            AppError::Transport(format!("Failed to start backend '{}': {}", program, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Transport("Backend stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Transport("Backend stdout unavailable".into()))?;

        let pending: PendingReplies = Arc::new(Mutex::new(Some(HashMap::new())));
        tokio::spawn(route_replies(stdout, pending.clone()));

        tracing::info!(program, "Backend sidecar started");

        Ok(Self {
            program: program.to_string(),
            child: Mutex::new(Some(child)),
            stdin: Mutex::new(Some(stdin)),
            pending,
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn write_line(&self, line: &str) -> Result<(), AppError> {
        let mut stdin = self.stdin.lock().await;
        let stdin = stdin
            .as_mut()
            .ok_or_else(|| AppError::Transport("Backend is not running".into()))?;

        stdin.write_all(line.as_bytes()).await.map_err(write_failed)?;
        stdin.flush().await.map_err(write_failed)
    }
}

fn write_failed(e: std::io::Error) -> AppError {
    AppError::Transport(format!("Failed to write to backend: {}", e))
}

fn backend_closed() -> AppError {
    AppError::Transport("Backend closed the connection".into())
}

async fn route_replies(stdout: ChildStdout, pending: PendingReplies) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read from backend: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) if value.get("id").is_some() => serde_json::from_value::<SidecarReply>(value),
            Ok(_) => continue,
            Err(_) => {
                tracing::debug!(line = trimmed, "Skipping non-JSON backend output");
                continue;
            }
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Malformed backend reply: {}", e);
                continue;
            }
        };

        let id = reply.id;
        let sender = pending.lock().await.as_mut().and_then(|p| p.remove(&id));
        match sender {
            Some(sender) => {
                if sender.send(reply.into_result()).is_err() {
                    tracing::debug!(id, "Caller stopped waiting before the reply arrived");
                }
            }
            None => tracing::warn!(id, "Dropping reply with no pending request"),
        }
    }

    // Fail everyone still waiting; later calls see the closed map.
    if let Some(waiting) = pending.lock().await.take() {
        for (_, sender) in waiting {
            let _ = sender.send(Err(backend_closed()));
        }
    }
    tracing::debug!("Backend output closed");
}

#[async_trait]
impl CommandBridge for SidecarBridge {
    #[instrument(skip(self, args), fields(program = %self.program))]
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError> {
        let id = self.next_id();
        let request = serde_json::json!({
            "id": id,
            "command": command,
            "args": args,
        });
        let line = format!("{}\n", serde_json::to_string(&request)?);

        let (sender, receiver) = oneshot::channel();
        match self.pending.lock().await.as_mut() {
            Some(pending) => {
                pending.insert(id, sender);
            }
            None => return Err(backend_closed()),
        }

        if let Err(e) = self.write_line(&line).await {
            if let Some(pending) = self.pending.lock().await.as_mut() {
                pending.remove(&id);
            }
            return Err(e);
        }
        tracing::debug!(id, "Request sent");

        receiver.await.map_err(|_| backend_closed())?
    }

    async fn shutdown(&self) {
        self.stdin.lock().await.take();
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to stop backend '{}': {}", self.program, e);
            }
        }
    }
}
