use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{DEFAULT_MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::error::FrameError;
use crate::metrics::MetricsRegistry;
use crate::protocol::{error_codes, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::tools::{dispatch, is_known_tool, tool_descriptors};

/// Largest `Content-Length` either transport will allocate for.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

const HTTP_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// MCP surface for the Trustable Score tools.
///
/// Requests are handled one at a time. The only state is the call counter
/// registry; scoring itself is pure.
#[derive(Debug, Default)]
pub struct McpServer {
    metrics: MetricsRegistry,
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

impl McpServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                error_codes::INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.clone().unwrap_or(Value::Null);

        if is_notification && request.method.starts_with("notifications/") {
            tracing::debug!(method = %request.method, "notification");
            return None;
        }

        tracing::debug!(method = %request.method, "request");
        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
                        "capabilities": {
                            "tools": {
                                "listChanged": false
                            }
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tool_descriptors().clone()),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(id, error_codes::METHOD_NOT_FOUND, "method not found"),
        };

        Some(response)
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("invalid params: {err}"),
                );
            }
        };

        let start = Instant::now();
        let outcome = dispatch(&parsed.name, parsed.arguments.as_ref());
        self.metrics.record_tool(
            &parsed.name,
            is_known_tool(&parsed.name),
            start.elapsed().as_secs_f64() * 1000.0,
            outcome.is_err(),
        );

        match outcome {
            Ok(output) => {
                let mut result = json!({ "content": output.content });
                if let Some(structured) = output.structured {
                    result["structuredContent"] = structured;
                }
                JsonRpcResponse::success(id, result)
            }
            Err(err) => {
                tracing::warn!(tool = %parsed.name, error = %err, "tool call rejected");
                JsonRpcResponse::error(id, err.code(), err.to_string())
            }
        }
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = io::BufReader::new(stdin.lock());
        let mut stdout = io::stdout();
        tracing::info!(server = SERVER_NAME, "serving mcp over stdio");
        self.serve_stream(&mut reader, &mut stdout)?;
        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Serve requests from `reader` until EOF. Newline-delimited JSON and
    /// `Content-Length` framed messages may be mixed; each reply uses the
    /// framing of the message it answers.
    pub fn serve_stream<R: BufRead, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
    ) -> io::Result<()> {
        while let Some(message) = next_stdio_message(reader)? {
            let reply = match message.body {
                Ok(body) => self.answer_payload(&body),
                Err(err) => {
                    tracing::warn!(error = %err, "rejected stdio frame");
                    Some(parse_error(format!("invalid frame: {err}")))
                }
            };
            if let Some(reply) = reply {
                message.framing.write(writer, &reply)?;
            }
        }
        Ok(())
    }

    fn answer_payload(&self, payload: &[u8]) -> Option<JsonRpcResponse> {
        match serde_json::from_slice::<JsonRpcRequest>(payload) {
            Ok(request) => self.handle_request(request),
            Err(err) => {
                tracing::warn!(error = %err, "unparseable request");
                Some(parse_error(format!("parse error: {err}")))
            }
        }
    }

    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        tracing::info!(addr = %listener.local_addr()?, "serving mcp over http");
        for stream in listener.incoming() {
            let outcome =
                stream.and_then(|stream| self.handle_http_connection(stream, HTTP_READ_TIMEOUT));
            if let Err(err) = outcome {
                tracing::warn!(error = %err, "http connection dropped");
            }
        }
        Ok(())
    }

    fn handle_http_connection(
        &self,
        mut stream: TcpStream,
        read_timeout: Duration,
    ) -> io::Result<()> {
        stream.set_read_timeout(Some(read_timeout))?;
        let mut reader = io::BufReader::new(stream.try_clone()?);
        let response = match read_http_request(&mut reader) {
            Ok(None) => return Ok(()),
            Ok(Some(request)) => {
                tracing::debug!(method = %request.method, path = %request.path, "http request");
                self.route_http(&request)
            }
            Err(FrameError::Io(err)) => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "rejected http frame");
                HttpResponse::rejected(&err)
            }
        };
        response.write_to(&mut stream)
    }

    fn route_http(&self, request: &HttpRequest) -> HttpResponse {
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/health") => HttpResponse::json(200, &json!({"status": "ok"})),
            ("GET", "/metrics") => HttpResponse {
                status: 200,
                content_type: "text/plain; version=0.0.4; charset=utf-8",
                body: self.metrics.render_text().into_bytes(),
            },
            ("POST", "/mcp" | "/") => self.answer_http_rpc(&request.body),
            (_, "/mcp" | "/health" | "/metrics") => HttpResponse::json(
                405,
                &json!({
                    "error": "method_not_allowed",
                    "message": "supported endpoints: GET /health, GET /metrics, POST /mcp"
                }),
            ),
            _ => HttpResponse::json(
                404,
                &json!({"error": "not_found", "message": "use POST /mcp"}),
            ),
        }
    }

    fn answer_http_rpc(&self, body: &[u8]) -> HttpResponse {
        let request = match serde_json::from_slice::<JsonRpcRequest>(body) {
            Ok(request) => request,
            Err(err) => {
                return HttpResponse::json(400, &parse_error(format!("parse error: {err}")));
            }
        };
        self.handle_request(request)
            .map_or_else(HttpResponse::no_content, |reply| {
                HttpResponse::json(200, &reply)
            })
    }
}

fn parse_error(message: String) -> JsonRpcResponse {
    JsonRpcResponse::error(Value::Null, error_codes::PARSE_ERROR, message)
}

/// Header block of one frame. Names are lowercased; a repeated header
/// resolves to its last value.
#[derive(Debug, Default)]
struct Headers(Vec<(String, String)>);

impl Headers {
    /// Read header lines up to the blank separator. `first` is a header line
    /// the caller already consumed.
    fn read<R: BufRead>(reader: &mut R, first: Option<&str>) -> Result<Self, FrameError> {
        let mut headers = Self::default();
        if let Some(line) = first {
            headers.push(line);
        }
        let mut buf = String::new();
        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                return Err(FrameError::UnterminatedHeaders);
            }
            let entry = buf.trim_end_matches(['\r', '\n']);
            if entry.is_empty() {
                return Ok(headers);
            }
            headers.push(entry);
        }
    }

    fn push(&mut self, line: &str) {
        if let Some((name, value)) = line.split_once(':') {
            self.0
                .push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Declared body length, refused above `MAX_FRAME_BYTES` before anything
    /// is allocated.
    fn content_length(&self) -> Result<Option<usize>, FrameError> {
        let Some(raw) = self.get("content-length") else {
            return Ok(None);
        };
        let declared = raw
            .parse::<u64>()
            .map_err(|_| FrameError::InvalidLength(raw.to_string()))?;
        match usize::try_from(declared) {
            Ok(length) if length <= MAX_FRAME_BYTES => Ok(Some(length)),
            _ => Err(FrameError::TooLarge {
                declared,
                limit: MAX_FRAME_BYTES,
            }),
        }
    }
}

fn read_body<R: Read>(reader: &mut R, length: usize) -> Result<Vec<u8>, FrameError> {
    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body).map_err(FrameError::Truncated)?;
    Ok(body)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Line,
    ContentLength,
}

impl Framing {
    fn write<W: Write>(self, writer: &mut W, reply: &JsonRpcResponse) -> io::Result<()> {
        let body = serde_json::to_vec(reply)?;
        match self {
            Self::Line => {
                writer.write_all(&body)?;
                writer.write_all(b"\n")?;
            }
            Self::ContentLength => {
                write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
                writer.write_all(&body)?;
            }
        }
        writer.flush()
    }
}

/// One inbound stdio message: its payload, or why it could not be read.
struct StdioMessage {
    framing: Framing,
    body: Result<Vec<u8>, FrameError>,
}

fn next_stdio_message<R: BufRead>(reader: &mut R) -> io::Result<Option<StdioMessage>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if !is_header_line(text) {
            return Ok(Some(StdioMessage {
                framing: Framing::Line,
                body: Ok(text.as_bytes().to_vec()),
            }));
        }
        let message = match read_framed_body(reader, text) {
            Err(FrameError::Io(err)) => return Err(err),
            // The header block never ended, so there is no frame to mirror.
            Err(err @ FrameError::UnterminatedHeaders) => StdioMessage {
                framing: Framing::Line,
                body: Err(err),
            },
            body => StdioMessage {
                framing: Framing::ContentLength,
                body,
            },
        };
        return Ok(Some(message));
    }
}

fn is_header_line(line: &str) -> bool {
    line.split_once(':').is_some_and(|(name, _)| {
        let name = name.trim();
        name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("content-type")
    })
}

fn read_framed_body<R: BufRead>(
    reader: &mut R,
    first_header: &str,
) -> Result<Vec<u8>, FrameError> {
    let length = Headers::read(reader, Some(first_header))?
        .content_length()?
        .ok_or(FrameError::MissingLength)?;
    read_body(reader, length)
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn read_http_request<R: BufRead>(reader: &mut R) -> Result<Option<HttpRequest>, FrameError> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    let request_line = request_line.trim_end_matches(['\r', '\n']);
    if request_line.is_empty() {
        return Ok(None);
    }
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(FrameError::RequestLine(request_line.to_string()));
    };
    let path = target.split_once('?').map_or(target, |(path, _)| path);

    let headers = Headers::read(reader, None)?;
    let body = match headers.content_length()? {
        Some(length) => read_body(reader, length)?,
        None => Vec::new(),
    };
    Ok(Some(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        body,
    }))
}

struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_vec(payload) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize http payload");
                Self {
                    status: 500,
                    content_type: "application/json",
                    body: br#"{"error":"internal_error"}"#.to_vec(),
                }
            }
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            content_type: "application/json",
            body: Vec::new(),
        }
    }

    fn rejected(err: &FrameError) -> Self {
        let status = err.http_status();
        let kind = if status == 413 {
            "payload_too_large"
        } else {
            "bad_request"
        };
        Self::json(status, &json!({"error": kind, "message": err.to_string()}))
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        )?;
        writer.write_all(&self.body)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve(input: &str) -> String {
        let server = McpServer::new();
        let mut reader = io::Cursor::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        server.serve_stream(&mut reader, &mut out).expect("serve");
        String::from_utf8(out).expect("utf8")
    }

    /// Split one `Content-Length` framed reply off the front of `out`.
    fn take_frame(out: &str) -> (Value, &str) {
        let (head, rest) = out.split_once("\r\n\r\n").expect("framed");
        let length = head
            .strip_prefix("Content-Length: ")
            .and_then(|v| v.parse::<usize>().ok())
            .expect("length");
        let (body, tail) = rest.split_at(length);
        (serde_json::from_str(body).expect("json"), tail)
    }

    fn http_exchange(request: &str, read_timeout: Duration) -> (io::Result<()>, String) {
        let server = McpServer::new();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let mut client =
            TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
        client.write_all(request.as_bytes()).expect("write");
        let (stream, _) = listener.accept().expect("accept");
        let outcome = server.handle_http_connection(stream, read_timeout);
        let mut reply = String::new();
        client.read_to_string(&mut reply).expect("read");
        (outcome, reply)
    }

    fn headers(raw: &str) -> Headers {
        Headers::read(&mut io::Cursor::new(format!("{raw}\r\n\r\n")), None).expect("headers")
    }

    #[test]
    fn content_length_is_parsed_and_bounded() {
        assert_eq!(
            headers("content-LENGTH: 42").content_length().ok(),
            Some(Some(42))
        );
        assert_eq!(
            headers("Content-Type: application/json")
                .content_length()
                .ok(),
            Some(None)
        );
        assert!(matches!(
            headers("Content-Length: nope").content_length(),
            Err(FrameError::InvalidLength(_))
        ));
        assert_eq!(
            headers(&format!("Content-Length: {MAX_FRAME_BYTES}"))
                .content_length()
                .ok(),
            Some(Some(MAX_FRAME_BYTES))
        );
        assert!(matches!(
            headers(&format!("Content-Length: {}", MAX_FRAME_BYTES + 1)).content_length(),
            Err(FrameError::TooLarge { .. })
        ));
        assert!(matches!(
            headers("Content-Length: 18446744073709551615").content_length(),
            Err(FrameError::TooLarge { .. })
        ));
    }

    #[test]
    fn line_delimited_requests_get_line_replies() {
        let out = serve(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
        );
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1);
        let reply: Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"], json!({}));
    }

    #[test]
    fn framed_request_gets_framed_reply() {
        let body = r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#;
        let out = serve(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
        let (reply, tail) = take_frame(&out);
        assert!(tail.is_empty());
        assert_eq!(reply["id"], "a");
        assert_eq!(reply["result"]["tools"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn garbage_line_yields_parse_error_and_loop_continues() {
        let out = serve("not json\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["error"]["code"], -32700);
        let second: Value = serde_json::from_str(lines[1]).expect("json");
        assert_eq!(second["id"], 2);
    }

    #[test]
    fn truncated_frame_headers_report_parse_error() {
        let out = serve("Content-Type: application/json\r\n");
        let reply: Value = serde_json::from_str(out.trim()).expect("json");
        assert_eq!(reply["error"]["code"], -32700);
    }

    #[test]
    fn frame_without_length_reports_parse_error() {
        let (reply, _) = take_frame(&serve("Content-Type: application/json\r\n\r\n"));
        assert_eq!(reply["error"]["code"], -32700);
    }

    #[test]
    fn oversized_stdio_frame_is_refused_and_loop_continues() {
        let out = serve(
            "Content-Length: 18446744073709551615\r\n\r\n{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
        );
        let (refused, tail) = take_frame(&out);
        assert_eq!(refused["error"]["code"], -32700);
        assert!(refused["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("exceeds")));
        let next: Value = serde_json::from_str(tail.trim()).expect("json");
        assert_eq!(next["id"], 3);
        assert_eq!(next["result"], json!({}));
    }

    #[test]
    fn short_stdio_body_reports_parse_error() {
        let (reply, _) = take_frame(&serve("Content-Length: 64\r\n\r\n{\"jsonrpc\":\"2.0\"}"));
        assert_eq!(reply["error"]["code"], -32700);
    }

    #[test]
    fn oversized_http_body_gets_413() {
        let (outcome, reply) = http_exchange(
            "POST /mcp HTTP/1.1\r\nHost: localhost\r\nContent-Length: 18446744073709551615\r\n\r\n",
            Duration::from_secs(5),
        );
        assert!(outcome.is_ok());
        assert!(reply.starts_with("HTTP/1.1 413 Payload Too Large"), "{reply}");
        assert!(reply.contains("payload_too_large"));
    }

    #[test]
    fn http_rpc_answers_over_one_connection() {
        let body = r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#;
        let (outcome, reply) = http_exchange(
            &format!(
                "POST /mcp HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            ),
            Duration::from_secs(5),
        );
        assert!(outcome.is_ok());
        assert!(reply.starts_with("HTTP/1.1 200 OK"), "{reply}");
        let (_, payload) = reply.split_once("\r\n\r\n").expect("body");
        let payload: Value = serde_json::from_str(payload).expect("json");
        assert_eq!(payload["id"], 4);
    }

    #[test]
    fn idle_http_client_times_out() {
        let (outcome, reply) = http_exchange("", Duration::from_millis(50));
        let kind = outcome.expect_err("timed out").kind();
        assert!(
            matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut),
            "{kind:?}"
        );
        assert!(reply.is_empty());
    }
}
