//! One-shot HTTP responder for activation tests.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// A listener that answers exactly one request with a canned response.
pub(crate) struct OneShotServer {
    /// Base URL to configure as the activation service.
    pub(crate) base_url: &'static str,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    /// Start answering the next request with `status` and a JSON `body`.
    pub(crate) fn respond(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url: &'static str = Box::leak(format!("http://{}", addr).into_boxed_str());
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }

            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();

            String::from_utf8(request_body).unwrap()
        });

        Self { base_url, handle }
    }

    /// Wait for the request and return its body.
    pub(crate) fn request_body(self) -> String {
        self.handle.join().unwrap()
    }
}
