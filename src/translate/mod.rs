//! Conversion between the backend's JSON shapes and the public player resources.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::{AdapterError, Result};
use crate::links::Links;
use crate::resolver::MediaObject;

pub const ACCEPTED_STATUSES: [&str; 3] = ["playing", "stopped", "paused"];
pub const ACCEPTED_ACTIONS: [&str; 2] = ["next", "previous"];

/// Accepts strings, numbers or null; the backend is not consistent about uid types.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendFile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: String,
    #[serde(default)]
    pub location: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendCurrent {
    #[serde(default)]
    pub file: Option<BackendFile>,
    #[serde(default)]
    pub duration: Value,
    #[serde(default)]
    pub position: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendPlaylist {
    pub files: Option<Vec<BackendFile>>,
}

fn song(tag: &str) -> Option<String> {
    (!tag.is_empty()).then(|| tag.to_string())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentTrack {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    pub duration: Value,
    pub position: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaylistItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    pub location: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Playlist {
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaylistEntry {
    pub location: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Capability {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerInfo {
    pub name: String,
    pub capabilities: Vec<Capability>,
}

pub fn player_info(name: &str, capabilities: &[(&str, String)]) -> PlayerInfo {
    PlayerInfo {
        name: name.to_string(),
        capabilities: capabilities.iter().map(|(c, url)| Capability { name: c.to_string(), url: url.clone() }).collect(),
    }
}

/// `None` when the backend reports no current file; the public shape is then `{}`.
pub fn current_track(links: &Links, name: &str, backend: Value) -> Result<Option<CurrentTrack>> {
    let current: BackendCurrent = serde_json::from_value(backend)
        .map_err(|e| AdapterError::BadGateway(format!("malformed current track: {e}")))?;
    Ok(current.file.map(|file| CurrentTrack {
        url: links.playlist_item(name, &file.uid),
        song: song(&file.tag),
        duration: current.duration,
        position: current.position,
    }))
}

pub fn backend_files(backend: Value) -> Result<Vec<BackendFile>> {
    let playlist: BackendPlaylist = serde_json::from_value(backend)
        .map_err(|e| AdapterError::BadGateway(format!("malformed playlist: {e}")))?;
    playlist.files.ok_or_else(|| AdapterError::Internal("backend playlist has no files".into()))
}

pub fn playlist(links: &Links, name: &str, files: &[BackendFile]) -> Playlist {
    Playlist {
        items: files
            .iter()
            .map(|f| PlaylistItem {
                url: links.playlist_item(name, &f.uid),
                song: song(&f.tag),
                location: f.location.clone(),
            })
            .collect(),
    }
}

pub fn playlist_entry(files: &[BackendFile], uid: &str) -> Option<PlaylistEntry> {
    files
        .iter()
        .rev()
        .find(|f| f.uid == uid)
        .map(|f| PlaylistEntry { location: f.location.clone(), song: song(&f.tag) })
}

/// Reads a string field from a request body, tolerating malformed JSON.
pub fn body_field(body: &[u8], field: &str) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    v.get(field)?.as_str().map(str::to_string)
}

pub fn status_request(body: &[u8]) -> Result<Value> {
    match body_field(body, "status") {
        Some(s) if ACCEPTED_STATUSES.contains(&s.as_str()) => Ok(json!({ "status": s })),
        other => Err(AdapterError::PreconditionFailed(format!("status {}", other.unwrap_or_default()))),
    }
}

/// Relative moves are sent to the backend's status endpoint.
pub fn move_request(body: &[u8]) -> Result<Value> {
    match body_field(body, "action") {
        Some(a) if ACCEPTED_ACTIONS.contains(&a.as_str()) => Ok(json!({ "status": a })),
        other => Err(AdapterError::PreconditionFailed(format!("action {}", other.unwrap_or_default()))),
    }
}

/// Extracts the uid from a submitted item URL, which must be one this adapter handed out
/// for `name`.
pub fn select_request(links: &Links, name: &str, body: &[u8]) -> Result<Value> {
    let uri = body_field(body, "uri").unwrap_or_default();
    let uid = uri.rsplit('/').next().unwrap_or_default();
    if uid.is_empty() || uri != links.playlist_item(name, uid) {
        return Err(AdapterError::PreconditionFailed(uri));
    }
    Ok(json!({ "uid": uid }))
}

pub fn addition_request(url: &str, object: &MediaObject) -> Value {
    json!({ "location": object.location, "tag": url })
}

/// Reduces an item id to a single path segment: query and fragment markers, separators,
/// `.` and `..` are dropped.
pub fn sanitize_item(item: &str) -> String {
    let plain: String = item.chars().filter(|c| !matches!(c, '?' | '#')).collect();
    plain.split(['/', '\\']).filter(|seg| !matches!(*seg, "" | "." | "..")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Links {
        Links::new("http://hifi.local")
    }

    #[test]
    fn playlist_omits_empty_song() {
        let files = backend_files(json!({"files":[{"uid":"1","location":"a.mp3","tag":""}]})).unwrap();
        let out = serde_json::to_value(playlist(&links(), "kitchen", &files)).unwrap();
        assert_eq!(
            out,
            json!({"items":[{"url":"http://hifi.local/player/mjs/kitchen/playlist/1","location":"a.mp3"}]})
        );
    }

    #[test]
    fn playlist_keeps_order_and_tags() {
        let files = backend_files(json!({"files":[
            {"uid":3,"location":"c.mp3","tag":"http://lib/song/3"},
            {"uid":"1","location":"a.mp3","tag":""}
        ]}))
        .unwrap();
        let pl = playlist(&links(), "kitchen", &files);
        assert_eq!(pl.items.len(), 2);
        assert!(pl.items[0].url.ends_with("/playlist/3"));
        assert_eq!(pl.items[0].song.as_deref(), Some("http://lib/song/3"));
        assert!(pl.items[1].url.ends_with("/playlist/1"));
        assert_eq!(pl.items[1].song, None);
    }

    #[test]
    fn playlist_without_files_is_internal() {
        assert!(matches!(backend_files(json!({"status":"playing"})), Err(AdapterError::Internal(_))));
    }

    #[test]
    fn current_without_file_is_absent() {
        assert_eq!(current_track(&links(), "kitchen", json!({})).unwrap(), None);
    }

    #[test]
    fn current_with_file() {
        let track = current_track(
            &links(),
            "kitchen",
            json!({"file":{"uid":"9","location":"x.mp3","tag":"Song"},"duration":200,"position":12.5}),
        )
        .unwrap()
        .unwrap();
        let v = serde_json::to_value(&track).unwrap();
        assert_eq!(
            v,
            json!({"url":"http://hifi.local/player/mjs/kitchen/playlist/9","song":"Song","duration":200,"position":12.5})
        );
    }

    #[test]
    fn entry_lookup_by_uid() {
        let files = backend_files(json!({"files":[{"uid":"1","location":"a.mp3","tag":"t"}]})).unwrap();
        let entry = playlist_entry(&files, "1").unwrap();
        assert_eq!(serde_json::to_value(entry).unwrap(), json!({"location":"a.mp3","song":"t"}));
        assert!(playlist_entry(&files, "2").is_none());
    }

    #[test]
    fn status_validation() {
        assert_eq!(status_request(br#"{"status":"paused"}"#).unwrap(), json!({"status":"paused"}));
        for body in [&br#"{"status":"rewinding"}"#[..], br#"{}"#, b"garbage", br#"{"status":1}"#] {
            assert!(matches!(status_request(body), Err(AdapterError::PreconditionFailed(_))));
        }
    }

    #[test]
    fn move_validation() {
        assert_eq!(move_request(br#"{"action":"next"}"#).unwrap(), json!({"status":"next"}));
        assert!(matches!(move_request(br#"{"action":"shuffle"}"#), Err(AdapterError::PreconditionFailed(_))));
    }

    #[test]
    fn select_requires_own_item_url() {
        let l = links();
        let ok = select_request(&l, "kitchen", br#"{"uri":"http://hifi.local/player/mjs/kitchen/playlist/7"}"#);
        assert_eq!(ok.unwrap(), json!({"uid":"7"}));
        for uri in [
            "http://hifi.local/player/mjs/attic/playlist/7",
            "http://elsewhere/player/mjs/kitchen/playlist/7",
            "http://hifi.local/player/mjs/kitchen/playlist/",
            "7",
        ] {
            let body = json!({ "uri": uri }).to_string();
            assert!(matches!(select_request(&l, "kitchen", body.as_bytes()), Err(AdapterError::PreconditionFailed(_))), "{uri}");
        }
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_item("../../secret"), "secret");
        assert_eq!(sanitize_item("a/b"), "ab");
        assert_eq!(sanitize_item("..\\x"), "x");
        assert_eq!(sanitize_item("42"), "42");
        assert_eq!(sanitize_item("/../"), "");
    }

    #[test]
    fn sanitize_strips_query_and_fragment_markers() {
        assert_eq!(sanitize_item("1?all"), "1all");
        assert_eq!(sanitize_item("2#x"), "2x");
        assert_eq!(sanitize_item("..?/secret"), "secret");
        assert_eq!(sanitize_item("?#"), "");
    }

    #[test]
    fn addition_uses_object_location_and_url_tag() {
        let obj = MediaObject { kind: "song".into(), location: json!("/music/a.mp3") };
        assert_eq!(
            addition_request("http://lib/song/1", &obj),
            json!({"location":"/music/a.mp3","tag":"http://lib/song/1"})
        );
    }
}
