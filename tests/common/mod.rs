//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a tiny site: an HTML page that pulls in a stylesheet and a script,
//! and sets a cookie on the document response.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

const INDEX: &str = r#"<!doctype html>
<html>
  <head><link rel="stylesheet" href="/style.css"></head>
  <body><h1>websnap test page</h1><script src="/app.js"></script></body>
</html>"#;

const STYLE: &str = "h1 { color: #333; }";
const SCRIPT: &str = "document.title = 'loaded';";

/// Starts the server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). Runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handle(stream));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 4096];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = String::from_utf8_lossy(&buf[..n]).to_string();
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    let (body, content_type, cookie) = match path.as_str() {
        "/style.css" => (STYLE, "text/css", ""),
        "/app.js" => (SCRIPT, "application/javascript", ""),
        _ => (INDEX, "text/html", "Set-Cookie: visited=1; Path=/\r\n"),
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
        content_type,
        body.len(),
        cookie,
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
