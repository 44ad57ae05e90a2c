//! MCP JSON-RPC server over line-delimited stdio.
//!
//! Each request runs on its own task so slow reports do not block other
//! calls; a single writer task keeps response lines whole.

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::client::ReportClient;
use crate::dispatcher::Dispatcher;
use crate::error::McpError;
use crate::params::Arguments;
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND,
    PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::{SERVER_NAME, SERVER_VERSION};

/// Swarmia MCP Server
pub struct McpServer<C> {
    dispatcher: Dispatcher<C>,
}

impl<C: ReportClient> McpServer<C> {
    pub fn new(dispatcher: Dispatcher<C>) -> Self {
        Self { dispatcher }
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Value {
        let tool_lines: Vec<String> = self
            .dispatcher
            .catalog()
            .list_tools()
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect();
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "instructions": format!(
                "Swarmia MCP Server - Fetch engineering metrics and reports from the Swarmia Export API. \
                 Reports are returned as CSV.\n\nAvailable tools:\n{}",
                tool_lines.join("\n")
            )
        })
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Value {
        json!({
            "tools": self.dispatcher.catalog().list_tools()
        })
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, params: Value) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidParams("Missing tool name".to_string()))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Arguments::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "Tool arguments must be an object".to_string(),
                ))
            }
        };

        debug!("Calling tool: {} with args: {:?}", name, arguments);

        let result = self.dispatcher.invoke(name, &arguments).await;
        Ok(serde_json::to_value(result)?)
    }

    /// Handle a single JSON-RPC request. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling request: {}", request.method);

        if request.id.is_none() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(request.id, self.handle_initialize()),
            "tools/list" => JsonRpcResponse::success(request.id, self.handle_tools_list()),
            "tools/call" => match self.handle_tools_call(request.params).await {
                Ok(result) => JsonRpcResponse::success(request.id, result),
                Err(e @ McpError::InvalidParams(_)) => {
                    JsonRpcResponse::error(request.id, INVALID_PARAMS, &e.to_string())
                }
                Err(e) => JsonRpcResponse::error(request.id, INTERNAL_ERROR, &e.to_string()),
            },
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            _ => {
                warn!("Unknown method: {}", request.method);
                JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    &format!("Method not found: {}", request.method),
                )
            }
        };
        Some(response)
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    ///
    /// Returns once every in-flight request has been answered.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut reader = reader;
        let mut in_flight = JoinSet::new();
        let mut buf = Vec::new();

        let read_result = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read from input: {}", e);
                    break Err(McpError::Io(e));
                }
            }

            // Invalid UTF-8 is a malformed message, not a broken stream.
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    error!("Failed to decode request: {}", e);
                    let _ = tx.send(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"));
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(req) => req,
                Err(e) => {
                    error!("Failed to parse request: {}", e);
                    let _ = tx.send(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"));
                    continue;
                }
            };

            let server = Arc::clone(&self);
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    let _ = tx.send(response);
                }
            });

            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    error!("Request task failed: {}", e);
                }
            }
        };

        debug!("Input closed, waiting for {} in-flight request(s)", in_flight.len());
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                error!("Request task failed: {}", e);
            }
        }

        drop(tx);
        let written = writer_task
            .await
            .map_err(|e| McpError::Io(std::io::Error::other(e)))?;
        read_result?;
        written
    }

    /// Run the MCP server over stdio
    pub async fn run_stdio(self: Arc<Self>) -> Result<(), McpError> {
        info!("MCP server ready, listening on stdio...");
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await?;
        info!("MCP server stopped.");
        Ok(())
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
) -> Result<(), McpError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let response_json = serde_json::to_string(&response)?;
        debug!("Sending: {}", response_json);
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
