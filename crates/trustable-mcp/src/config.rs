use clap::{Parser, ValueEnum};

pub const SERVER_NAME: &str = "trustable-mcp-server";
pub const SERVER_VERSION: &str = "1.0.0";
pub const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8787";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

/// Daemon settings. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "trustable-mcpd", version, about = "Trustable Score MCP server")]
pub struct ServerConfig {
    /// Transport to serve MCP over
    #[arg(long, env = "TRUSTABLE_MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Listen address for the HTTP transport
    #[arg(long, env = "TRUSTABLE_MCP_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "TRUSTABLE_MCP_LOG", default_value = "warn")]
    pub log_level: String,
}
