//! WebSocket Server for Realtime Updates
//!
//! Accepts connections on its own port, completes the WebSocket handshake
//! off the actor, and hands finished sockets to WsActor via channel.

use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::WebSocketConfig;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Upper bound for a client to finish the handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Unsent bytes a viewer may hold before it is dropped.
const MAX_WRITE_BUFFER: usize = 8 * 1024 * 1024;

fn socket_config() -> WebSocketConfig {
    WebSocketConfig::default().max_write_buffer_size(MAX_WRITE_BUFFER)
}

/// Start the WebSocket server that sends clients to WsActor via channel.
///
/// Returns the port actually bound (may differ from `base_port` when it was
/// taken; `0` picks any free port).
pub fn start_ws_server(
    interface: &str,
    base_port: u16,
    ws_tx: mpsc::Sender<WsMsg>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        while !crate::core::is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("realtime"; "client connected: {}", addr);

                    let Some(ws) = handshake(stream) else {
                        continue;
                    };
                    if ws_tx.blocking_send(WsMsg::AddClient(Box::new(ws))).is_err() {
                        crate::debug!("realtime"; "actor gone, stopping acceptor");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    crate::log!("realtime"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Blocking handshake with a timeout, then switch to non-blocking polling.
fn handshake(stream: TcpStream) -> Option<WebSocket<TcpStream>> {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
    let _ = stream.set_nodelay(true);

    match tungstenite::accept_with_config(stream, Some(socket_config())) {
        Ok(ws) => {
            let _ = ws.get_ref().set_read_timeout(None);
            let _ = ws.get_ref().set_nonblocking(true);
            Some(ws)
        }
        Err(e) => {
            crate::log!("realtime"; "handshake failed: {}", e);
            None
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: &str, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = if base_port == 0 {
            0
        } else {
            base_port.saturating_add(offset)
        };
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener
                    .local_addr()
                    .context("failed to read websocket address")?
                    .port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_bind_port_skips_taken_port() {
        let (first, port) = try_bind_port("127.0.0.1", 0, 1).unwrap();
        let (_second, next) = try_bind_port("127.0.0.1", port, 3).unwrap();
        assert_ne!(port, next);
        drop(first);
    }

    #[test]
    fn test_try_bind_port_gives_up() {
        let (_held, port) = try_bind_port("127.0.0.1", 0, 1).unwrap();
        assert!(try_bind_port("127.0.0.1", port, 1).is_err());
    }

    #[test]
    fn test_socket_write_buffer_is_bounded() {
        let config = socket_config();
        assert_eq!(config.max_write_buffer_size, MAX_WRITE_BUFFER);
        assert!(config.max_write_buffer_size > config.write_buffer_size);
    }
}
