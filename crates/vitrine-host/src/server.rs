use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ServerHandle {
    pub addr: SocketAddr,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    pub fn join(self) {
        let _ = self.thread.join();
    }
}

/// Binds `host:port` (port 0 picks a free one) and serves files under
/// `root` until the process exits. `root` must already be canonicalized.
pub fn start(host: &str, port: u16, root: PathBuf) -> std::io::Result<ServerHandle> {
    let listener = TcpListener::bind((host, port))?;
    let addr = listener.local_addr()?;

    let thread = thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let root = root.clone();
                    thread::spawn(move || handle_client(stream, &root));
                }
                Err(e) => log::warn!("accept failed: {e}"),
            }
        }
    });

    Ok(ServerHandle { addr, thread })
}

fn handle_client(stream: TcpStream, root: &Path) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "?".into());
    let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
    let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));

    let mut reader = match stream.try_clone() {
        Ok(clone) => BufReader::new(clone),
        Err(e) => {
            log::warn!("({peer}) stream clone failed: {e}");
            return;
        }
    };
    let mut writer = stream;

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    // Drain headers; none of them matter for a static GET.
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let Some((method, target)) = parse_request_line(&request_line) else {
        let _ = write_error(&mut writer, "400 Bad Request");
        return;
    };
    if method != "GET" {
        log::debug!("({peer}) {method} {target} -> 405");
        let _ = write_error(&mut writer, "405 Method Not Allowed");
        return;
    }

    match resolve_path(root, target) {
        Some(path) => match fs::read(&path) {
            Ok(body) => {
                log::info!("({peer}) GET {target} -> 200 ({} bytes)", body.len());
                let _ = write_response(&mut writer, "200 OK", content_type(&path), &body);
            }
            Err(e) => {
                log::info!("({peer}) GET {target} -> 404 ({e})");
                let _ = write_error(&mut writer, "404 Not Found");
            }
        },
        None => {
            log::info!("({peer}) GET {target} -> 404");
            let _ = write_error(&mut writer, "404 Not Found");
        }
    }
}

fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/") || !target.starts_with('/') {
        return None;
    }
    Some((method, target))
}

/// Maps a request target into `root`. Returns `None` when the target
/// decodes badly or escapes the served directory.
fn resolve_path(root: &Path, target: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or("");
    let decoded = percent_decode(path)?;

    let mut resolved = root.to_path_buf();
    for part in decoded.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ => resolved.push(part),
        }
    }
    if resolved.is_dir() {
        resolved.push("index.html");
    }

    // canonicalize follows symlinks, so the prefix check holds for those too
    let canonical = resolved.canonicalize().ok()?;
    canonical.starts_with(root).then_some(canonical)
}

fn percent_decode(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                let hi = (hex[0] as char).to_digit(16)?;
                let lo = (hex[1] as char).to_digit(16)?;
                out.push((hi * 16 + lo) as u8);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "gltf" => "model/gltf+json",
        "glb" => "model/gltf-binary",
        "bin" => "application/octet-stream",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "ktx2" => "image/ktx2",
        "json" => "application/json",
        "html" => "text/html; charset=utf-8",
        "js" => "text/javascript",
        "css" => "text/css",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn write_response(
    stream: &mut TcpStream,
    status: &str,
    ctype: &str,
    body: &[u8],
) -> std::io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: {ctype}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(body)?;
    stream.flush()
}

fn write_error(stream: &mut TcpStream, status: &str) -> std::io::Result<()> {
    write_response(stream, status, "text/plain; charset=utf-8", status.as_bytes())
}
