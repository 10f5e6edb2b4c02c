//! REST adapter for MJS players.
//!
//! Serves `/player/mjs/{name}[/{func}[/{item}]]` and translates each call into a request
//! against the player's own HTTP backend, normalizing the backend JSON into the public
//! player resources (status, current track, playlist).

pub mod access;
pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod links;
pub mod logging;
pub mod resolver;
pub mod router;
pub mod state;
pub mod translate;
pub mod utils;

pub use api::router as app;
pub use error::{AdapterError, Result};
pub use state::AppState;
