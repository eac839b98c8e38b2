use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde_json::Value;

struct Daemon(Child);

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

fn spawn_http(addr: &str) -> Daemon {
    let child = Command::new(env!("CARGO_BIN_EXE_trustable-mcpd"))
        .args(["--transport", "http", "--http-addr", addr])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn trustable-mcpd");
    wait_for_http(addr);
    Daemon(child)
}

#[test]
fn http_health_and_mcp_call_work() {
    let addr = reserve_addr();
    let _daemon = spawn_http(&addr);

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(response_body(&health).contains("\"status\":\"ok\""));

    let init_body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
    let init = send_http(&addr, "POST", "/mcp", init_body);
    assert!(init.starts_with("HTTP/1.1 200"));
    let body = response_body(&init);
    assert!(body.contains("\"serverInfo\""));
    assert!(body.contains("\"trustable-mcp-server\""));

    let call_body = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"check_ai_visibility","arguments":{"brand":"Acme"}}}"#;
    let call = send_http(&addr, "POST", "/mcp", call_body);
    assert!(call.starts_with("HTTP/1.1 200"));
    let rpc: Value = serde_json::from_str(response_body(&call)).expect("rpc json");
    assert_eq!(rpc["result"]["structuredContent"]["trustable_score"], 33);
    assert_eq!(rpc["result"]["structuredContent"]["brand"], "Acme");

    let notify = send_http(
        &addr,
        "POST",
        "/mcp",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    );
    assert!(notify.starts_with("HTTP/1.1 204"));

    let metrics = send_http(&addr, "GET", "/metrics", "");
    assert!(metrics.starts_with("HTTP/1.1 200"));
    assert!(response_body(&metrics)
        .contains("trustable_mcp_tool_calls_total{tool=\"check_ai_visibility\",status=\"ok\"} 1"));
}

#[test]
fn http_rejects_bad_requests() {
    let addr = reserve_addr();
    let _daemon = spawn_http(&addr);

    let parse = send_http(&addr, "POST", "/mcp", "{not json");
    assert!(parse.starts_with("HTTP/1.1 400"));
    assert!(response_body(&parse).contains("-32700"));

    let missing = send_http(&addr, "GET", "/nope", "");
    assert!(missing.starts_with("HTTP/1.1 404"));

    let wrong_method = send_http(&addr, "GET", "/mcp", "");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));
}
