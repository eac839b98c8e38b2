use clap::Parser;
use trustable_mcp::{telemetry, McpServer, ServeError, ServerConfig, Transport};

fn main() -> Result<(), ServeError> {
    let config = ServerConfig::parse();
    telemetry::init(&config.log_level)?;

    let server = McpServer::new();
    match config.transport {
        Transport::Stdio => server.serve_stdio()?,
        Transport::Http => server.serve_http(&config.http_addr)?,
    }
    Ok(())
}
