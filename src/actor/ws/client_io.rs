use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::subscription::{Connection, ConnectionClosed, Subscriptions};

/// How often idle connections are polled for close frames.
const REAP_INTERVAL: Duration = Duration::from_millis(100);

fn would_block(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(e) if e.kind() == ErrorKind::WouldBlock)
}

/// Non-blocking viewer socket.
///
/// Frames that cannot be written yet stay in tungstenite's write buffer and
/// go out on the next flush. While any are pending the socket reports itself
/// backlogged, and a peer that lets the buffer hit its cap is dropped.
pub(super) struct ViewerSocket {
    ws: WebSocket<TcpStream>,
    backlogged: bool,
}

impl ViewerSocket {
    pub(super) fn new(ws: WebSocket<TcpStream>) -> Self {
        Self {
            ws,
            backlogged: false,
        }
    }

    pub(super) fn peer(&self) -> Option<std::net::SocketAddr> {
        self.ws.get_ref().peer_addr().ok()
    }

    fn flush(&mut self) -> Result<(), ConnectionClosed> {
        match self.ws.flush() {
            Ok(()) => {
                self.backlogged = false;
                Ok(())
            }
            Err(ref e) if would_block(e) => {
                self.backlogged = true;
                Ok(())
            }
            Err(e) => {
                crate::debug!("ws"; "flush failed: {}", e);
                Err(ConnectionClosed)
            }
        }
    }
}

impl Connection for ViewerSocket {
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionClosed> {
        match self.ws.send(Message::Text(text.to_owned().into())) {
            Ok(()) => {
                self.backlogged = false;
                Ok(())
            }
            // Queued, the socket just could not take all of it.
            Err(ref e) if would_block(e) => {
                self.backlogged = true;
                Ok(())
            }
            Err(e) => {
                crate::debug!("ws"; "send failed: {}", e);
                Err(ConnectionClosed)
            }
        }
    }

    fn poll_alive(&mut self) -> bool {
        if self.flush().is_err() {
            return false;
        }

        // Viewers never send anything meaningful; drain pings and text.
        loop {
            match self.ws.read() {
                Ok(Message::Close(_)) => return false,
                Ok(_) => {}
                Err(ref e) if would_block(e) => return true,
                Err(_) => return false,
            }
        }
    }

    fn is_backlogged(&self) -> bool {
        self.backlogged
    }

    fn disconnect(&mut self) {
        let _ = self.ws.close(None);
        let _ = self.ws.flush();
    }
}

/// Background thread: flush pending output, catch up drained peers and drop
/// closed ones.
pub(super) fn reaper_loop(
    subscriptions: Arc<Mutex<Subscriptions<ViewerSocket>>>,
    stopped: Arc<AtomicBool>,
) {
    while !stopped.load(Ordering::Relaxed) {
        std::thread::sleep(REAP_INTERVAL);

        let mut subs = subscriptions.lock();
        let removed = subs.reap();
        if removed > 0 {
            crate::debug!("ws"; "{} disconnected (remaining: {})", removed, subs.len());
        }
    }
}
