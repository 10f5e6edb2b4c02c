use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::error::{AdapterError, Result};
use crate::resolver::MediaObject;
use crate::router::{self, Operation};
use crate::state::AppState;
use crate::translate;

pub const ALLOWED_METHODS: &str = "GET,HEAD,POST,PUT,PATCH";

/// Capabilities every MJS player advertises. Config only maps them to URLs.
pub const CAPABILITIES: [&str; 1] = ["mjs"];

/// One inbound call against `/player/mjs/{name}[/{func}[/{item}]]`. Missing segments are
/// empty strings.
#[derive(Debug, Clone)]
pub struct PlayerRequest {
    pub name: String,
    pub func: String,
    pub item: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(String),
    Empty,
    Options,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Reply::Empty => StatusCode::NO_CONTENT.into_response(),
            Reply::Options => (
                StatusCode::OK,
                [
                    (header::ALLOW, ALLOWED_METHODS),
                    (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
                    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
                ],
            )
                .into_response(),
        }
    }
}

fn json<T: Serialize>(value: &T) -> Result<Reply> {
    serde_json::to_string(value).map(Reply::Json).map_err(|e| AdapterError::Internal(e.to_string()))
}

fn json_pretty<T: Serialize>(value: &T) -> Result<Reply> {
    serde_json::to_string_pretty(value).map(Reply::Json).map_err(|e| AdapterError::Internal(e.to_string()))
}

/// Request context handed to every operation once the player checks have passed.
struct Player<'a> {
    state: &'a AppState,
    name: &'a str,
    backend: BackendClient,
}

pub async fn dispatch(state: &AppState, req: PlayerRequest) -> Result<Reply> {
    if req.method == Method::OPTIONS {
        return Ok(Reply::Options);
    }

    let Some(settings) = state.cfg.owned_player(&req.name) else {
        debug!(player = %req.name, "player unknown, disabled or served by another adapter");
        return Err(AdapterError::Disabled(req.name));
    };

    let route = router::select(&req.method, &req.func, &req.item);
    debug!(player = %req.name, func = %req.func, item = %req.item, method = %req.method, op = ?route.op, "dispatch");

    if let Some(capability) = route.capability {
        state.access.authorize(&req.headers, capability).map_err(|rejection| {
            warn!(player = %req.name, capability, status = %rejection.status, "request not authorized");
            AdapterError::Unauthorized(rejection)
        })?;
    }

    let player = Player { state, name: &req.name, backend: state.backend(settings) };
    match route.op {
        Operation::Capabilities => capabilities(&player),
        Operation::GetStatus => get_status(&player).await,
        Operation::SetStatus => set_status(&player, &req.body).await,
        Operation::GetCurrent => get_current(&player).await,
        Operation::MoveCurrent => move_current(&player, &req.body).await,
        Operation::SetCurrent => set_current(&player, &req.body).await,
        Operation::GetPlaylist => get_playlist(&player).await,
        Operation::ClearPlaylist => clear_playlist(&player).await,
        Operation::AppendSong => append_song(&player, &req.body).await,
        Operation::GetPlaylistItem => get_playlist_item(&player, &req.item).await,
        Operation::DeletePlaylistItem => delete_playlist_item(&player, &req.item).await,
        Operation::InsertPlaylistItem => insert_playlist_item(&player, &req.item, &req.body).await,
        Operation::NotFound => Err(AdapterError::NotFound),
    }
}

fn capabilities(p: &Player<'_>) -> Result<Reply> {
    let caps: Vec<(&str, String)> = CAPABILITIES
        .iter()
        .map(|&name| {
            let path = match p.state.cfg.capabilities.get(name) {
                Some(path) => path.clone(),
                None => format!("/capabilities/{name}"),
            };
            (name, p.state.links.absolute(&path))
        })
        .collect();
    json(&translate::player_info(p.name, &caps))
}

async fn get_status(p: &Player<'_>) -> Result<Reply> {
    let status = p.backend.fetch_json("status").await?;
    Ok(Reply::Json(status.to_string()))
}

async fn set_status(p: &Player<'_>, body: &[u8]) -> Result<Reply> {
    let payload = translate::status_request(body)?;
    p.backend.post_json("status", &payload).await?;
    info!(player = %p.name, status = %payload["status"], "status changed");
    get_status(p).await
}

async fn get_current(p: &Player<'_>) -> Result<Reply> {
    let backend = p.backend.fetch_json("current").await?;
    match translate::current_track(&p.state.links, p.name, backend)? {
        Some(track) => json(&track),
        None => Ok(Reply::Json("{}".into())),
    }
}

async fn move_current(p: &Player<'_>, body: &[u8]) -> Result<Reply> {
    let payload = translate::move_request(body)?;
    p.backend.post_json("status", &payload).await?;
    get_current(p).await
}

async fn set_current(p: &Player<'_>, body: &[u8]) -> Result<Reply> {
    let payload = translate::select_request(&p.state.links, p.name, body)?;
    p.backend.post_json("current", &payload).await?;
    Ok(Reply::Empty)
}

async fn playlist_files(p: &Player<'_>) -> Result<Vec<translate::BackendFile>> {
    translate::backend_files(p.backend.fetch_json("playlist").await?)
}

async fn get_playlist(p: &Player<'_>) -> Result<Reply> {
    let files = playlist_files(p).await?;
    json_pretty(&translate::playlist(&p.state.links, p.name, &files))
}

async fn clear_playlist(p: &Player<'_>) -> Result<Reply> {
    p.backend.delete("playlist").await?;
    info!(player = %p.name, "playlist cleared");
    Ok(Reply::Empty)
}

/// Resolves the `uri` of an addition request; anything that is not a song is refused with
/// the submitted URL.
async fn resolve_song(p: &Player<'_>, body: &[u8]) -> Result<(String, MediaObject)> {
    let url = translate::body_field(body, "uri").unwrap_or_default();
    match p.state.resolver.resolve(&p.state.cfg, &url).await {
        Some(object) if object.is_song() => Ok((url, object)),
        _ => {
            warn!(player = %p.name, %url, "refusing playlist addition that is not a song");
            Err(AdapterError::PreconditionFailed(url))
        }
    }
}

async fn append_song(p: &Player<'_>, body: &[u8]) -> Result<Reply> {
    let (url, object) = resolve_song(p, body).await?;
    p.backend.post_json("playlist", &translate::addition_request(&url, &object)).await?;
    info!(player = %p.name, %url, "song appended");
    get_playlist(p).await
}

async fn get_playlist_item(p: &Player<'_>, item: &str) -> Result<Reply> {
    let files = playlist_files(p).await?;
    let entry = translate::playlist_entry(&files, item).ok_or(AdapterError::NotFound)?;
    json(&entry)
}

fn sanitized(item: &str) -> Result<String> {
    let clean = translate::sanitize_item(item);
    if clean.is_empty() {
        return Err(AdapterError::NotFound);
    }
    Ok(clean)
}

async fn delete_playlist_item(p: &Player<'_>, item: &str) -> Result<Reply> {
    let item = sanitized(item)?;
    p.backend.delete(&format!("playlist/{item}")).await?;
    info!(player = %p.name, %item, "playlist item removed");
    Ok(Reply::Empty)
}

async fn insert_playlist_item(p: &Player<'_>, item: &str, body: &[u8]) -> Result<Reply> {
    let item = sanitized(item)?;
    let (url, object) = resolve_song(p, body).await?;
    p.backend.post_json(&format!("playlist/{item}"), &translate::addition_request(&url, &object)).await?;
    info!(player = %p.name, %url, before = %item, "song inserted");
    get_playlist(p).await
}

// =============================================================================
// HTTP entry points
// =============================================================================

async fn respond(state: &AppState, req: PlayerRequest) -> Response {
    match dispatch(state, req).await {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            if e.status().is_server_error() {
                warn!(error = %e, "player request failed");
            }
            e.into_response()
        }
    }
}

fn request(name: String, func: String, item: String, method: Method, headers: HeaderMap, body: Bytes) -> PlayerRequest {
    PlayerRequest { name, func, item, method, headers, body }
}

pub async fn player_root(
    State(state): State<AppState>,
    Path(name): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, request(name, String::new(), String::new(), method, headers, body)).await
}

pub async fn player_func(
    State(state): State<AppState>,
    Path((name, func)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, request(name, func, String::new(), method, headers, body)).await
}

pub async fn player_item(
    State(state): State<AppState>,
    Path((name, func, item)): Path<(String, String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, request(name, func, item, method, headers, body)).await
}

#[derive(Debug, Serialize)]
pub struct VersionRes {
    pub name: &'static str,
    pub version: &'static str,
}

pub async fn version() -> impl IntoResponse {
    Json(VersionRes { name: env!("CARGO_PKG_NAME"), version: env!("CARGO_PKG_VERSION") })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_toml_str;
    use serde_json::{json, Value};

    fn state(capabilities: &str) -> AppState {
        let doc = format!(
            r#"
[server]
public_base = "http://hifi.test/"

{capabilities}

[players]
enabled = ["kitchen"]

[players.registry.kitchen]
class = "MJSPlayer"
url = "http://127.0.0.1:9/"
"#
        );
        AppState::new(from_toml_str(&doc).unwrap())
    }

    async fn listing(state: &AppState) -> Value {
        let req = PlayerRequest {
            name: "kitchen".into(),
            func: String::new(),
            item: String::new(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        match dispatch(state, req).await.unwrap() {
            Reply::Json(body) => serde_json::from_str(&body).unwrap(),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn capability_set_is_fixed() {
        let st = state("[capabilities]\nmjs = \"/caps/mjs\"\nmpd = \"/caps/mpd\"\nvolume = \"https://cdn.test/vol\"");
        assert_eq!(
            listing(&st).await,
            json!({ "name": "kitchen", "capabilities": [{ "name": "mjs", "url": "http://hifi.test/caps/mjs" }] })
        );
    }

    #[tokio::test]
    async fn missing_capability_url_falls_back_to_default_path() {
        let st = state("[capabilities]\nmpd = \"/caps/mpd\"");
        assert_eq!(
            listing(&st).await["capabilities"],
            json!([{ "name": "mjs", "url": "http://hifi.test/capabilities/mjs" }])
        );
    }
}
