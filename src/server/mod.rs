//! Local HTTP console: the interactive selection surface. One synchronous
//! accept loop, one session, one fixture host; requests are handled to
//! completion in arrival order, matching the single-threaded session model.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use crate::host::fixture::{load_fixture_host, FixtureHost};
use crate::session::ForgeSession;

pub mod api;
pub mod routes;

/// Everything a request handler can touch.
pub struct ConsoleState {
    pub host: FixtureHost,
    pub session: ForgeSession,
}

impl ConsoleState {
    pub fn new(host: FixtureHost) -> ConsoleState {
        ConsoleState {
            host,
            session: ForgeSession::default(),
        }
    }
}

pub fn run_server(bind_addr: &str, host_path: &str) -> std::io::Result<()> {
    let host = load_fixture_host(host_path)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()))?;
    let mut state = ConsoleState::new(host);

    let listener = TcpListener::bind(bind_addr)?;
    println!("implantforge console listening on http://{bind_addr} (host file: {host_path})");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream, &mut state) {
                    eprintln!("request error: {err}");
                }
            }
            Err(err) => eprintln!("connection failed: {err}"),
        }
    }

    Ok(())
}

fn handle_connection(stream: &mut TcpStream, state: &mut ConsoleState) -> std::io::Result<()> {
    let mut buffer = [0_u8; 16_384];
    let bytes_read = stream.read(&mut buffer)?;
    if bytes_read == 0 {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&buffer[..bytes_read]);
    let request_line = request.lines().next().unwrap_or_default();
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or("GET");
    let path = request_parts.next().unwrap_or("/");

    let body = request
        .split("\r\n\r\n")
        .nth(1)
        .or_else(|| request.split("\n\n").nth(1))
        .unwrap_or("");

    let response = routes::route_request(state, method, path, body).to_http_string();
    stream.write_all(response.as_bytes())?;
    stream.flush()?;
    Ok(())
}
