//! # sde-mcp
//!
//! MCP (Model Context Protocol) server for SD Elements project surveys.
//!
//! This crate exposes survey operations as tools for AI agents, so an
//! assistant can describe a project's technology stack in plain words
//! ("Python", "Django", "PostgreSQL") and have the matching survey answers
//! selected. It implements the MCP protocol over stdin/stdout using JSON-RPC 2.0.
//!
//! ## Features
//!
//! - **Text matching**: answer texts resolve to answer ids through exact,
//!   substring and fuzzy matching against a cached answer library
//! - **Draft reconciliation**: set, add or remove answers with the minimal
//!   number of API writes
//! - **Dependency resolution**: blocked answers get sibling prerequisites
//!   selected automatically
//! - **Uniform outcomes**: every survey edit reports `success`,
//!   `partial_success` or `failure` with per-item detail
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "sdelements": {
//!       "command": "/path/to/sde-mcp",
//!       "env": {
//!         "SDE_HOST": "https://sde.example.com",
//!         "SDE_API_KEY": "..."
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can use the library API:
//!
//! ```no_run
//! use std::time::Duration;
//! use sde_mcp::{McpServer, McpSession, SdeClient};
//!
//! let client = SdeClient::new("https://sde.example.com", "api-key", Duration::from_secs(30))
//!     .expect("Failed to build client");
//! let session = McpSession::new(client);
//! let server = McpServer::new(session);
//!
//! // Answer a single request without touching stdio
//! let response = server.handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
//! assert!(response.is_some());
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod client;
mod convert;
mod error;
pub mod matcher;
pub mod outcome;
pub mod reconcile;
pub mod resolver;
mod server;
mod session;
mod tools;

pub use catalog::{AnswerCatalog, CatalogLoad};
pub use client::{AnswerRecord, DraftAnswer, SdeClient, SurveyApi};
pub use error::{ApiError, ApiResult, McpError, Result};
pub use matcher::{match_terms, MatchResult, MatchType};
pub use outcome::{FailureKind, ItemFailure, Outcome};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::McpSession;
pub use tools::{ToolDef, ToolRegistry};
