//! MCP server implementation

use std::sync::Arc;

use jukugo_service::{GraphQueries, LevelSource};
use jukugo_storage::GraphStore;
use serde_json::Value;

use crate::handlers::{ServerSettings, ToolCallRequest, ToolHandler};
use crate::tools::get_tools;
use crate::transport::{
    Incoming, JsonRpcRequest, JsonRpcResponse, StdioTransport, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

const SERVER_NAME: &str = "jukugo";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Server for the kanji graph
pub struct McpServer<S: GraphStore + ?Sized> {
    handler: ToolHandler<S>,
}

impl<S: GraphStore + ?Sized + 'static> McpServer<S> {
    pub fn new(store: Arc<S>, levels: Arc<dyn LevelSource>, settings: ServerSettings) -> Self {
        Self {
            handler: ToolHandler::new(store, levels, settings),
        }
    }

    pub fn queries(&self) -> &GraphQueries<S> {
        self.handler.queries()
    }

    pub fn settings(&self) -> &ServerSettings {
        self.handler.settings()
    }

    /// Cancel in-flight imports
    pub fn shutdown(&self) {
        self.handler.shutdown();
    }

    /// Start the MCP server on stdio
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        tracing::info!("Starting MCP server on stdio");
        let mut transport = StdioTransport::new();

        loop {
            let response = match transport.read_request().await {
                Ok(Some(Incoming::Request(request))) => {
                    tracing::debug!("Received request: {:?}", request.method);
                    self.handle_request(request).await
                }
                Ok(Some(Incoming::Malformed(e))) => {
                    tracing::warn!("Unparseable request: {}", e);
                    Some(JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
                Ok(None) => {
                    tracing::info!("EOF on stdin, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read request: {}", e);
                    break;
                }
            };

            if let Some(response) = response {
                if let Err(e) = transport.write_response(&response).await {
                    tracing::error!("Failed to write response: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            tracing::debug!("Notification: {}", request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        let result = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = get_tools();
        JsonRpcResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let call: ToolCallRequest = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
        };

        tracing::debug!("Tool call: {} with args: {:?}", call.name, call.arguments);
        let response = self.handler.handle(call).await;

        match serde_json::to_value(response) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
        }
    }
}
