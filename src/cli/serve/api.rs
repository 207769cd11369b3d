//! JSON API handlers under `/api`.

use std::io::Read;

use anyhow::Result;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::json;
use tiny_http::Request;

use super::ServeContext;
use super::multipart;
use super::response::{get_header, respond_error, respond_json};
use crate::auth::bearer_token;
use crate::core::FrameError;
use crate::gateway::Upload;
use crate::photo::build_snapshot;

/// Form field carrying uploaded photos.
const UPLOAD_FIELD: &str = "photos";

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

/// `GET /api/photos`: snapshot built fresh from storage.
pub fn list_photos(request: Request, ctx: &ServeContext) -> Result<()> {
    match build_snapshot(&ctx.store) {
        Ok(snapshot) => respond_json(request, 200, &snapshot),
        Err(e) => {
            crate::log!("serve"; "listing failed: {}", e);
            respond_error(request, &e)
        }
    }
}

/// `POST /api/login`
pub fn login(mut request: Request, ctx: &ServeContext) -> Result<()> {
    let peer = request.remote_addr().map(|addr| addr.ip());

    let parsed = read_body(&mut request, ctx.max_body).and_then(|body| {
        serde_json::from_slice::<LoginRequest>(&body)
            .map_err(|_| FrameError::InvalidInput("Invalid login request".to_string()))
    });
    let credentials = match parsed {
        Ok(credentials) => credentials,
        Err(e) => return respond_error(request, &e),
    };

    match ctx
        .gateway
        .login(&credentials.username, &credentials.password, peer)
    {
        Ok(token) => respond_json(
            request,
            200,
            &json!({ "success": true, "token": token.as_str() }),
        ),
        Err(e) => {
            crate::debug!("auth"; "login from {:?} refused: {}", peer, e);
            respond_error(request, &e)
        }
    }
}

/// `POST /api/upload`: `multipart/form-data` with one or more `photos` files.
pub fn upload(mut request: Request, ctx: &ServeContext) -> Result<()> {
    let header = get_header(&request, "authorization");
    let token = header.as_deref().and_then(bearer_token);

    let uploads = ctx
        .gateway
        .authorize(token)
        .and_then(|()| read_uploads(&mut request, ctx.max_body));
    let uploads = match uploads {
        Ok(uploads) => uploads,
        Err(e) => return respond_error(request, &e),
    };

    match ctx.gateway.add_photos(token, uploads) {
        Ok(report) => {
            crate::log!("serve"; "stored {} uploaded photo(s)", report.count());
            respond_json(
                request,
                200,
                &json!({ "success": true, "count": report.count() }),
            )
        }
        Err(e) => respond_error(request, &e),
    }
}

/// `DELETE /api/photos/:name`
pub fn delete(request: Request, ctx: &ServeContext, encoded_name: &str) -> Result<()> {
    let header = get_header(&request, "authorization");
    let token = header.as_deref().and_then(bearer_token);

    let name = match percent_decode_str(encoded_name).decode_utf8() {
        Ok(name) => name.into_owned(),
        Err(_) => {
            let err = FrameError::InvalidInput("Invalid file name".to_string());
            return respond_error(request, &err);
        }
    };

    match ctx.gateway.delete_photo(token, &name) {
        Ok(()) => {
            crate::log!("serve"; "deleted {}", name);
            respond_json(request, 200, &json!({ "success": true }))
        }
        Err(e) => respond_error(request, &e),
    }
}

/// `GET /api/realtime`: where the realtime channel listens.
pub fn realtime(request: Request) -> Result<()> {
    respond_json(
        request,
        200,
        &json!({ "ws_port": super::get_actual_ws_port() }),
    )
}

fn read_uploads(request: &mut Request, limit: u64) -> Result<Vec<Upload>, FrameError> {
    let content_type = get_header(request, "content-type").unwrap_or_default();
    let boundary = multipart::boundary(&content_type)
        .map_err(|e| FrameError::InvalidInput(format!("Invalid upload: {e}")))?;

    let body = read_body(request, limit)?;
    let parts = multipart::parse(&body, &boundary)
        .map_err(|e| FrameError::InvalidInput(format!("Invalid upload: {e}")))?;

    Ok(parts
        .into_iter()
        .filter(|part| part.name == UPLOAD_FIELD)
        .filter_map(|part| {
            let filename = part.filename.filter(|f| !f.is_empty())?;
            Some(Upload::new(filename, part.data))
        })
        .collect())
}

/// Read the request body, refusing anything over `limit` bytes.
fn read_body(request: &mut Request, limit: u64) -> Result<Vec<u8>, FrameError> {
    let too_large = || FrameError::InvalidInput("Request body too large".to_string());

    if request.body_length().is_some_and(|len| len as u64 > limit) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| FrameError::InvalidInput(format!("Failed to read request body: {e}")))?;

    if body.len() as u64 > limit {
        return Err(too_large());
    }
    Ok(body)
}
