//! The JSON-RPC server loop (spec.md §4.8): read one line-delimited request
//! per line from stdin, dispatch it to a bounded pool of concurrent handler
//! tasks, and write responses (and progress notifications) back to stdout
//! as they become available — not necessarily in request order, per
//! spec.md §5: "JSON-RPC responses are emitted in the order their runs
//! complete, not the order requests were received."

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Semaphore};

use crate::deps::RpcDeps;
use crate::error::RpcError;
use crate::methods;
use crate::progress::ProgressSink;
use crate::protocol::{ProtocolError, RpcRequest, RpcResponse};

/// Default concurrent-handler limit (spec.md §4.8: "default: 4").
pub const DEFAULT_CONCURRENCY: usize = 4;

pub struct Server {
    deps: Arc<RpcDeps>,
    concurrency: usize,
}

impl Server {
    #[must_use]
    pub fn new(deps: RpcDeps, concurrency: usize) -> Self {
        Self { deps: Arc::new(deps), concurrency: concurrency.max(1) }
    }

    /// Run until stdin closes. Each in-flight request holds one semaphore
    /// permit; a saturated pool simply makes new requests wait for a slot,
    /// rather than rejecting them.
    pub async fn serve<R, W>(self, stdin: R, stdout: W)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut stdout = stdout;
            while let Some(line) = rx.recv().await {
                if stdout.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdout.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdout.flush().await.is_err() {
                    break;
                }
            }
        });

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut lines = BufReader::new(stdin).lines();
        let mut handles = Vec::new();

        loop {
            let next = lines.next_line().await;
            let Ok(Some(line)) = next else { break };
            if line.trim().is_empty() {
                continue;
            }

            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let deps = self.deps.clone();
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let response = handle_line(&line, &deps, tx.clone()).await;
                if let Ok(serialized) = serde_json::to_string(&response) {
                    let _ = tx.send(serialized);
                }
                drop(permit);
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
        drop(tx);
        let _ = writer_task.await;
    }
}

async fn handle_line(line: &str, deps: &RpcDeps, out: mpsc::UnboundedSender<String>) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return RpcResponse::protocol_error(Value::Null, ProtocolError::ParseError(e.to_string())),
    };
    let id = request.id.clone();
    let progress = ProgressSink::new(id.clone(), out);

    let outcome: Result<Value, RpcError> = match request.method.as_str() {
        "list_mock_issues" => methods::list_mock_issues(deps).await,
        "load_mock_issue" => methods::load_mock_issue(&request.params, deps).await,
        "fetch_remote_issue" => methods::fetch_remote_issue(&request.params, deps).await,
        "run_pipeline" => methods::run_pipeline_method(&request.params, deps, &progress).await,
        "process_file" => methods::process_file(&request.params, deps, &progress).await,
        "list_resources" => Ok(crate::resources::list_resources()),
        "read_resource" => crate::resources::read_resource(&request.params, deps),
        "stage_prompt" => crate::resources::stage_prompt(&request.params),
        other => return RpcResponse::protocol_error(id, ProtocolError::MethodNotFound(other.to_string())),
    };

    match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(err) => RpcResponse::success(id, serde_json::json!({
            "status": "error",
            "error": err.message,
            "kind": err.kind.as_str(),
        })),
    }
}
