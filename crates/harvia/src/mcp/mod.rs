//! Model Context Protocol server over stdio.
//!
//! Exposes the sauna actions as MCP tools to an assistant host. Messages are
//! newline-delimited JSON-RPC 2.0 on stdin/stdout; all logging goes to
//! stderr so stdout stays a clean protocol channel.

mod protocol;
mod tools;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use harvia_core::Actions;

use self::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeParams, InitializeResult,
    JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, negotiate_version,
};
use self::tools::ToolHandlers;

const INSTRUCTIONS: &str = "Control Harvia Xenio WiFi saunas through the MyHarvia cloud. \
    Temperatures are set in °F (104-230) and humidity in % (0-140). \
    Omit device_id to address the default sauna.";

/// Answers MCP requests with one authenticated [`Actions`] surface.
pub struct McpServer {
    handlers: ToolHandlers,
}

impl McpServer {
    pub fn new(actions: Actions, default_device: Option<String>) -> Self {
        Self {
            handlers: ToolHandlers::new(actions, default_device),
        }
    }

    /// Serve until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server ready on stdio");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!(request = %line, "received");

            let Some(response) = self.handle(line).await else {
                continue;
            };
            let mut out = serde_json::to_string(&response).map_err(std::io::Error::other)?;
            debug!(response = %out, "sending");
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
        info!("MCP client closed the connection");
        Ok(())
    }

    /// Answer one message. Notifications get no response.
    async fn handle(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => return Some(JsonRpcResponse::error(None, PARSE_ERROR, e.to_string())),
        };
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }
        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams =
                    serde_json::from_value(request.params).unwrap_or_default();
                let result = InitializeResult {
                    protocol_version: negotiate_version(params.protocol_version.as_deref()),
                    capabilities: ServerCapabilities {
                        tools: ToolsCapability {
                            list_changed: false,
                        },
                    },
                    server_info: ServerInfo {
                        name: "harvia".into(),
                        version: env!("CARGO_PKG_VERSION").into(),
                    },
                    instructions: INSTRUCTIONS.into(),
                };
                success(id, &result)
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => success(
                id,
                &ToolsListResult {
                    tools: tools::catalogue(),
                },
            ),
            "tools/call" => {
                let params: ToolCallParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()));
                    }
                };
                if !tools::is_known(&params.name) {
                    return Some(JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Unknown tool: {}", params.name),
                    ));
                }
                info!(tool = %params.name, "calling tool");
                let result = self.handlers.call(&params.name, params.arguments).await;
                if result.is_error {
                    warn!(tool = %params.name, "tool reported an error");
                }
                success(id, &result)
            }
            other => {
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {other}"))
            }
        };
        Some(response)
    }
}

fn success<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {e}")),
    }
}
