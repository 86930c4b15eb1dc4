//! Minimal HTTP/1.1 server answering GET requests from a route table.
//!
//! Routes are registered after the server starts so response bodies can
//! embed the server's own URL. Unknown paths get 404. Every request head is
//! recorded for later assertions.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    body: Vec<u8>,
}

/// A request as received by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request target, e.g. `/repos/jozu-ai/kitops/releases/latest`.
    pub path: String,
    /// Raw request line and headers.
    pub head: String,
}

#[derive(Debug, Default)]
struct State {
    routes: HashMap<String, Route>,
    requests: Vec<RecordedRequest>,
}

/// Handle to a running server. The server runs until the process exits.
pub struct TestServer {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl TestServer {
    /// Start a server on an ephemeral loopback port.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state).ok());
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Answer GET `path` with `status` and `body`.
    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        let route = Route {
            status,
            body: body.into(),
        };
        self.lock().routes.insert(path.to_owned(), route);
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Paths of the requests received so far.
    pub fn requested_paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("server state lock")
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) -> io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    stream.set_write_timeout(Some(Duration::from_secs(2)))?;
    let head = read_head(&mut stream)?;
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_owned();

    let route = {
        let mut state = state.lock().expect("server state lock");
        state.requests.push(RecordedRequest {
            path: path.clone(),
            head,
        });
        state.routes.get(&path).cloned()
    };
    let route = route.unwrap_or_else(|| Route {
        status: 404,
        body: b"{\"message\":\"Not Found\"}".to_vec(),
    });

    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason_phrase(route.status),
        route.body.len()
    )?;
    stream.write_all(&route.body)?;
    stream.flush()
}

/// Read up to and including the blank line ending the request head.
fn read_head(stream: &mut TcpStream) -> io::Result<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
