pub mod handlers;

use axum::{
    routing::{any, get},
    Router,
};

use crate::state::AppState;
use handlers::{player_func, player_item, player_root, version};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/player/mjs/{name}", any(player_root))
        .route("/player/mjs/{name}/{func}", any(player_func))
        .route("/player/mjs/{name}/{func}/{item}", any(player_item))
        .route("/version", get(version))
        .with_state(state)
}
