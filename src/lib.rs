//! Apple Music MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server for the
//! Apple Music API, organized as a modular architecture by domains.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling,
//!   shared application state, the main server, and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **auth**: Developer token minting and Music User Token handling
//!   - **music**: The authenticated Apple Music API client
//!   - **tools**: MCP tools that can be executed by clients
//!
//! # Example
//!
//! ```rust,no_run
//! use apple_music_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
