//! Process lifecycle: Ctrl+C handling and the shutdown flag.
//!
//! The first Ctrl+C stops the HTTP loop and asks the actors to wind down.
//! A second one exits on the spot, for when a stuck viewer socket or a slow
//! disk holds the graceful path up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use crossbeam::channel::Sender;
use tiny_http::Server;

/// Set by the first Ctrl+C
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// What a graceful shutdown has to reach. Absent until serving starts.
static HOOK: OnceLock<ShutdownHook> = OnceLock::new();

/// Exit status for an interrupted process.
const FORCED_EXIT_CODE: i32 = 130;

struct ShutdownHook {
    server: Arc<Server>,
    actors: Sender<()>,
}

impl ShutdownHook {
    fn fire(&self) {
        let _ = self.actors.send(());
        self.server.unblock();
    }
}

/// Install the global Ctrl+C handler. Call once, before anything blocks.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(on_interrupt).context("failed to set Ctrl+C handler")
}

fn on_interrupt() {
    if SHUTDOWN.swap(true, Ordering::SeqCst) {
        crate::log!("serve"; "forced exit");
        std::process::exit(FORCED_EXIT_CODE);
    }

    match HOOK.get() {
        Some(hook) => {
            crate::log!("serve"; "shutting down (Ctrl+C again to force)");
            hook.fire();
        }
        // Nothing is serving yet, so there is nothing to drain.
        None => std::process::exit(0),
    }
}

/// Hand the bound server and the actor shutdown channel to the handler.
///
/// Only the first registration counts.
pub fn register_server(server: Arc<Server>, shutdown_tx: Sender<()>) {
    let _ = HOOK.set(ShutdownHook {
        server,
        actors: shutdown_tx,
    });
}

/// Whether shutdown has been requested.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
