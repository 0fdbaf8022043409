//! Loopback HTTP server answering a fixed number of requests with one canned
//! response. Used by the WFS and geocoder tests.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

pub(crate) struct StubServer {
    addr: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StubServer {
    /// `127.0.0.1:<port>`
    pub(crate) fn host(&self) -> String {
        self.addr.clone()
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines received so far, e.g. `GET /path?query HTTP/1.1`
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until every expected request has been answered
    pub(crate) fn join(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.join().unwrap();
        }
    }
}

pub(crate) fn serve(status: u16, content_type: &str, body: &str, max_requests: usize) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&requests);
    let response = format!(
        "HTTP/1.1 {} STUB\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );

    let handle = thread::spawn(move || {
        for stream in listener.incoming().take(max_requests) {
            let mut stream = stream.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let head = String::from_utf8_lossy(&head);
            let line = head.lines().next().unwrap_or_default().to_string();
            seen.lock().unwrap().push(line);
            stream.write_all(response.as_bytes()).unwrap();
        }
    });

    StubServer {
        addr,
        requests,
        handle: Mutex::new(Some(handle)),
    }
}
