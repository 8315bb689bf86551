//! MCP server implementation.
//!
//! Handles JSON-RPC 2.0 over stdio as defined by the Model Context Protocol.
//! Requests are served one at a time; tool calls run on the blocking pool
//! because the platform client performs blocking HTTP.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::{rpc_codes, McpError, Result};
use crate::session::McpSession;
use crate::tools::ToolRegistry;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information.
const SERVER_NAME: &str = "sde-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0"
    pub jsonrpc: String,
    /// Request id; absent for notifications
    pub id: Option<JsonValue>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<JsonValue>,
}

impl JsonRpcRequest {
    /// Whether the client expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0"
    pub jsonrpc: String,
    /// Id of the request being answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Extra structured detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonValue>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create an error response from an McpError.
    ///
    /// Platform errors carry their category in `data` so clients can tell
    /// authentication problems from missing resources.
    pub fn from_error(id: Option<JsonValue>, err: McpError) -> Self {
        let data = match &err {
            McpError::Api(api) => Some(serde_json::json!({ "kind": api.kind() })),
            _ => None,
        };
        let mut response = Self::error(id, err.rpc_code(), err.to_string());
        if let Some(error) = response.error.as_mut() {
            error.data = data;
        }
        response
    }
}

/// MCP server.
#[derive(Clone)]
pub struct McpServer {
    session: Arc<McpSession>,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given session.
    pub fn new(session: McpSession) -> Self {
        Self {
            session: Arc::new(session),
            registry: Arc::new(ToolRegistry::new()),
        }
    }

    /// Run the server, reading from stdin and writing to stdout.
    ///
    /// Returns when stdin reaches EOF.
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        info!("{} {} listening on stdio", SERVER_NAME, SERVER_VERSION);

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF - client disconnected
                info!("stdin closed, shutting down");
                break;
            }

            let request = line.trim().to_string();
            if request.is_empty() {
                continue;
            }

            let server = self.clone();
            let response = tokio::task::spawn_blocking(move || server.handle_line(&request))
                .await
                .map_err(|e| McpError::Internal(format!("request handler panicked: {}", e)))?;

            // Send response
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one line of input, returning the response to write, if any.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!(error = %e, "unparseable request");
                Some(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Notifications are acknowledged silently.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                rpc_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
            ));
        }

        debug!(method = %request.method, "request");
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "initialized" | "notifications/initialized" => {
                JsonRpcResponse::success(request.id, JsonValue::Null)
            }
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request),
            "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Handle the initialize request.
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    /// Handle the tools/list request.
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<JsonValue> = self
            .registry
            .tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
    }

    /// Handle the tools/call request.
    fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // Extract name and arguments from params
        let params = match &request.params {
            Some(JsonValue::Object(obj)) => obj,
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing params object".to_string(),
                )
            }
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing 'name' in params".to_string(),
                )
            }
        };

        let arguments = match params.get("arguments") {
            Some(JsonValue::Object(obj)) => obj.clone(),
            Some(JsonValue::Null) | None => Map::new(),
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "'arguments' must be an object".to_string(),
                )
            }
        };

        info!(tool = %name, "tool call");
        match self.registry.dispatch(&self.session, &name, arguments) {
            Ok(result) => {
                let is_error = result.get("status").and_then(|s| s.as_str()) == Some("failure");
                let text = serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|_| "null".to_string());
                // MCP tool responses are wrapped in content array
                JsonRpcResponse::success(
                    request.id,
                    serde_json::json!({
                        "content": [{
                            "type": "text",
                            "text": text
                        }],
                        "isError": is_error
                    }),
                )
            }
            Err(err) => {
                warn!(tool = %name, error = %err, "tool call failed");
                JsonRpcResponse::from_error(request.id, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AnswerRecord, DraftAnswer, SurveyApi};
    use crate::error::{ApiError, ApiResult};

    struct Offline;

    impl SurveyApi for Offline {
        fn library_answers(&self, _: usize) -> ApiResult<Vec<AnswerRecord>> {
            Ok(vec![AnswerRecord {
                id: "A1".into(),
                text: "Python".into(),
                question: "Languages".into(),
                description: String::new(),
                is_active: true,
            }])
        }

        fn survey_draft(&self, _: u64) -> ApiResult<Vec<DraftAnswer>> {
            Err(ApiError::Auth("Invalid API key".into()))
        }

        fn set_answer_selected(&self, _: u64, _: &str, _: bool) -> ApiResult<JsonValue> {
            Err(ApiError::Auth("Invalid API key".into()))
        }

        fn commit_survey_draft(&self, _: u64) -> ApiResult<JsonValue> {
            Err(ApiError::Auth("Invalid API key".into()))
        }

        fn project_survey(&self, project_id: u64) -> ApiResult<JsonValue> {
            Err(ApiError::NotFound(format!("projects/{}/survey/", project_id)))
        }
    }

    fn server() -> McpServer {
        McpServer::new(McpSession::new(Offline))
    }

    fn respond(line: &str) -> JsonValue {
        let response = server().handle_line(line).expect("expected a response");
        serde_json::to_value(&response).unwrap()
    }

    #[test]
    fn test_json_rpc_response_success() {
        let response = JsonRpcResponse::success(Some(JsonValue::Number(1.into())), serde_json::json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(Some(JsonValue::Number(1.into())), -32600, "Invalid".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\""));
        assert!(!json.contains("\"result\""));
    }

    #[test]
    fn test_initialize() {
        let v = respond(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        assert_eq!(v["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(v["result"]["serverInfo"]["name"], "sde-mcp");
    }

    #[test]
    fn test_notification_gets_no_response() {
        let s = server();
        assert!(s
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .is_none());
    }

    #[test]
    fn test_parse_error() {
        let v = respond("{not json");
        assert_eq!(v["error"]["code"], rpc_codes::PARSE_ERROR);
    }

    #[test]
    fn test_unknown_method() {
        let v = respond(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#);
        assert_eq!(v["error"]["code"], rpc_codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_tools_list() {
        let v = respond(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#);
        let names: Vec<&str> = v["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"find_survey_answers"));
        assert!(names.contains(&"set_project_survey_by_text"));
        assert!(names.contains(&"commit_survey_draft"));
    }

    #[test]
    fn test_tool_call_wraps_result() {
        let v = respond(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"find_survey_answers","arguments":{"search_texts":["python"]}}}"#,
        );
        assert_eq!(v["result"]["isError"], false);
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let results: JsonValue = serde_json::from_str(text).unwrap();
        assert_eq!(results[0]["answer_id"], "A1");
        assert_eq!(results[0]["match_type"], "exact");
    }

    #[test]
    fn test_failed_outcome_flags_is_error() {
        let v = respond(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"update_project_survey","arguments":{"project_id":7,"answers":["A1"]}}}"#,
        );
        assert_eq!(v["result"]["isError"], true);
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let outcome: JsonValue = serde_json::from_str(text).unwrap();
        assert_eq!(outcome["status"], "failure");
        assert_eq!(outcome["kind"], "auth");
    }

    #[test]
    fn test_api_error_carries_kind() {
        let v = respond(
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"get_project_survey","arguments":{"project_id":"9"}}}"#,
        );
        assert_eq!(v["error"]["code"], rpc_codes::INVALID_PARAMS);
        assert_eq!(v["error"]["data"]["kind"], "not_found");
    }

    #[test]
    fn test_missing_tool_name() {
        let v = respond(r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{}}"#);
        assert_eq!(v["error"]["code"], rpc_codes::INVALID_PARAMS);
    }
}
