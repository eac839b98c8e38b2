pub mod config;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod server;
pub mod telemetry;
pub mod tools;

pub use config::{ServerConfig, Transport};
pub use error::{FrameError, ServeError, ToolError};
pub use server::McpServer;
pub use tools::{dispatch, tool_descriptors, ToolOutput};
