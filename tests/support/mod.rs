use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const PAYLOAD_BYTES: usize = 1_000_000;
pub const TRICKLE_CHUNK: usize = 10_000;
pub const TRICKLE_CHUNKS: usize = 20;
pub const TRICKLE_PAUSE: Duration = Duration::from_millis(150);

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a static file server for probe tests.
///
/// Routes: `/payload` (sized body), `/unsized` (no Content-Length, body
/// until close), `/trickle` (sized body sent in small pieces with pauses),
/// `/stall` (one piece, then silence), anything else answers 404.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_payload_server() -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

/// Address nothing is listening on.
///
/// # Errors
///
/// Returns an error if a port cannot be reserved.
pub fn closed_port_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/payload", addr))
}

fn read_request_head(stream: &mut TcpStream) -> Option<(String, String)> {
    stream.set_nonblocking(false).ok()?;
    let mut head = Vec::new();
    let mut buffer = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            return None;
        }
        head.extend_from_slice(buffer.get(..read)?);
    }

    let text = String::from_utf8_lossy(&head);
    let mut parts = text.lines().next()?.split_whitespace();
    let method = parts.next()?.to_owned();
    let path = parts.next()?.to_owned();
    Some((method, path))
}

fn handle_client(mut stream: TcpStream) {
    let Some((method, path)) = read_request_head(&mut stream) else {
        return;
    };
    let with_body = method != "HEAD";

    let written = match path.as_str() {
        "/payload" => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                PAYLOAD_BYTES
            );
            write_response(&mut stream, head.as_bytes(), with_body)
        }
        "/trickle" => write_trickle(&mut stream, TRICKLE_CHUNKS, with_body),
        "/stall" => write_trickle(&mut stream, 1, with_body),
        "/unsized" => write_response(
            &mut stream,
            b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
            with_body,
        ),
        _ => {
            let response: &[u8] = if with_body {
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found"
            } else {
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\n"
            };
            stream.write_all(response)
        }
    };

    if written.is_ok() {
        drop(stream.flush());
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn write_response(stream: &mut TcpStream, head: &[u8], with_body: bool) -> std::io::Result<()> {
    stream.write_all(head)?;
    if with_body {
        let chunk = [0u8; 16 * 1024];
        let mut remaining = PAYLOAD_BYTES;
        while remaining > 0 {
            let len = remaining.min(chunk.len());
            stream.write_all(chunk.get(..len).unwrap_or(&[]))?;
            remaining -= len;
        }
    }
    Ok(())
}

fn write_trickle(stream: &mut TcpStream, chunks: usize, with_body: bool) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        TRICKLE_CHUNK * TRICKLE_CHUNKS
    );
    stream.write_all(head.as_bytes())?;
    if !with_body {
        return Ok(());
    }

    let chunk = [0u8; TRICKLE_CHUNK];
    for _ in 0..chunks {
        stream.write_all(&chunk)?;
        stream.flush()?;
        thread::sleep(TRICKLE_PAUSE);
    }
    if chunks < TRICKLE_CHUNKS {
        // Hold the connection open without sending the rest.
        thread::sleep(Duration::from_secs(5));
    }
    Ok(())
}
