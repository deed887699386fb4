//! MCP transport layer.

mod server;

pub use server::GuardianServer;
