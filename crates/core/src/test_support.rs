//! One-shot HTTP stub for tests that exercise reqwest-based adapters.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

pub struct StubResponse {
    status: u16,
    body: String,
}

impl StubResponse {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// What the stub server received.
#[derive(Debug, Default)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Serves exactly one request on an ephemeral port, then exits.
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and a handle yielding
/// the captured request.
pub fn serve_once(response: StubResponse) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let captured = read_request(&mut reader);

        let reason = if response.status < 400 { "OK" } else { "Error" };
        let reply = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            response.status,
            reason,
            response.body.len(),
            response.body
        );
        let mut stream = stream;
        let _ = stream.write_all(reply.as_bytes());
        let _ = stream.flush();
        captured
    });

    (url, handle)
}

fn read_request(reader: &mut impl BufRead) -> CapturedRequest {
    let mut captured = CapturedRequest::default();
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    captured.request_line = line.trim_end().to_string();

    let mut content_length = 0usize;
    let mut chunked = false;
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap() == 0 {
            break;
        }
        let header = line.trim_end().to_string();
        if header.is_empty() {
            break;
        }
        let lower = header.to_ascii_lowercase();
        if let Some(v) = lower.strip_prefix("content-length:") {
            content_length = v.trim().parse().unwrap_or(0);
        }
        if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
            chunked = true;
        }
        captured.headers.push(header);
    }

    if chunked {
        captured.body = read_chunked(reader);
    } else {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        captured.body = body;
    }
    captured
}

fn read_chunked(reader: &mut impl BufRead) -> Vec<u8> {
    let mut body = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        reader.read_line(&mut line).unwrap();
        let size = usize::from_str_radix(line.trim(), 16).unwrap_or(0);
        if size == 0 {
            line.clear();
            let _ = reader.read_line(&mut line);
            break;
        }
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).unwrap();
        chunk.truncate(size);
        body.extend_from_slice(&chunk);
    }
    body
}
