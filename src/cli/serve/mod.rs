//! Photo frame server: JSON API, photo bytes, optional frontend.
//!
//! ```text
//! /api/photos          GET     fresh snapshot
//! /api/photos/:name    DELETE  remove (auth)
//! /api/login           POST    issue session token
//! /api/upload          POST    multipart upload (auth)
//! /api/realtime        GET     {ws_port}
//! /photos/:name        GET     photo bytes (Range, HEAD)
//! /*                   GET     public_dir, SPA fallback to index.html
//! ```

mod api;
mod lifecycle;
mod multipart;
mod path;
mod response;


use crate::{
    actor::sync::{self, SnapshotCell},
    auth::Authenticator,
    config::FrameConfig,
    debug,
    gateway::Gateway,
    log,
    photo::{PHOTOS_URL_PREFIX, PhotoStore, build_snapshot, is_image_name},
    utils::plural::plural_count,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use percent_encoding::percent_decode_str;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Method, Request, Server};

/// Actual WebSocket port (may differ from the configured one after retry).
/// Updated by coordinator after the realtime server binds.
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Number of HTTP worker threads.
const HTTP_WORKERS: usize = 4;

/// Shared state for request handlers.
pub struct ServeContext {
    pub gateway: Gateway,
    pub store: Arc<PhotoStore>,
    pub public_dir: Option<PathBuf>,
    pub max_body: u64,
}

/// Run the server until Ctrl+C.
///
/// `password` is the resolved admin password (configured or generated).
pub fn serve(config: Arc<FrameConfig>, password: &str) -> Result<()> {
    let store = PhotoStore::open(&config.storage.dir)
        .with_context(|| format!("Failed to open {}", config.storage.dir.display()))?;
    let store = Arc::new(store);

    // The first snapshot exists before any viewer can connect.
    let initial = build_snapshot(&store).context("Failed to read photo directory")?;
    if initial.is_empty() {
        log!("serve"; "no photos yet in {}", store.root().display());
    } else {
        log!("serve"; "{} in {}", plural_count(initial.len(), "photo"), store.root().display());
    }
    let cell = SnapshotCell::new(initial);

    let (sync_handle, sync_rx) = sync::channel();
    let auth = Arc::new(Authenticator::from_config(&config.auth, password));
    let gateway = Gateway::new(
        Arc::clone(&store),
        auth,
        sync_handle.clone(),
        config.storage.max_files,
    );

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    set_actual_ws_port(config.serve.ws_port());

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);
    log!("serve"; "http://{}", addr);

    let actor_handle = lifecycle::spawn_actors(
        Arc::clone(&config),
        lifecycle::ActorParts {
            store: Arc::clone(&store),
            cell,
            sync: sync_handle,
            sync_rx,
        },
        shutdown_rx,
    );

    let ctx = Arc::new(ServeContext {
        gateway,
        store,
        public_dir: config.serve.public_dir.clone(),
        max_body: config.serve.max_body_bytes(),
    });
    run_request_loop(&server, ctx)?;

    lifecycle::wait_for_shutdown(actor_handle);
    Ok(())
}

/// Dispatch requests to a small worker pool until the server is unblocked.
fn run_request_loop(server: &Server, ctx: Arc<ServeContext>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(HTTP_WORKERS)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("Failed to create HTTP worker pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let method = request.method().clone();
    let url = request.url().to_string();
    let path = url.split(['?', '#']).next().unwrap_or("/");
    debug!("serve"; "{} {}", method, path);

    if method == Method::Options {
        return response::respond_preflight(request);
    }

    if let Some(route) = path.strip_prefix("/api/") {
        return route_api(request, ctx, &method, route);
    }

    if let Some(name) = path.strip_prefix(PHOTOS_URL_PREFIX) {
        return serve_photo(request, ctx, &method, name);
    }

    serve_frontend(request, ctx, &method, path)
}

fn route_api(request: Request, ctx: &ServeContext, method: &Method, route: &str) -> Result<()> {
    match (method, route) {
        (Method::Get, "photos") => api::list_photos(request, ctx),
        (Method::Post, "login") => api::login(request, ctx),
        (Method::Post, "upload") => api::upload(request, ctx),
        (Method::Get, "realtime") => api::realtime(request),
        (Method::Delete, _) if route.starts_with("photos/") => {
            api::delete(request, ctx, &route["photos/".len()..])
        }
        (_, "photos" | "login" | "upload" | "realtime") => {
            response::respond_method_not_allowed(request)
        }
        _ if route.starts_with("photos/") => response::respond_method_not_allowed(request),
        _ => response::respond_not_found(request),
    }
}

/// `GET|HEAD /photos/:name`
fn serve_photo(request: Request, ctx: &ServeContext, method: &Method, encoded: &str) -> Result<()> {
    if !matches!(method, Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let Ok(name) = percent_decode_str(encoded).decode_utf8() else {
        return response::respond_not_found(request);
    };
    if !is_image_name(&name) {
        return response::respond_not_found(request);
    }

    match ctx.store.resolve(&name) {
        Ok(path) if path.is_file() => response::respond_file(request, &path),
        Ok(_) => response::respond_not_found(request),
        Err(e) => {
            log!("security"; "rejected photo request: {}", e);
            response::respond_not_found(request)
        }
    }
}

/// Static frontend with SPA fallback.
fn serve_frontend(request: Request, ctx: &ServeContext, method: &Method, url: &str) -> Result<()> {
    if !matches!(method, Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let Some(public_dir) = &ctx.public_dir else {
        return response::respond_not_found(request);
    };

    let file = path::resolve_static(url, public_dir).or_else(|| path::spa_fallback(public_dir));
    match file {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request),
    }
}
