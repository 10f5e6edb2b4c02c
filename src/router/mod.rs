//! Static route table for the player resource.
//!
//! Every route is a tuple of (method, func requirement, item requirement, priority,
//! capability, operation). Selection scans the table in a fixed order:
//!
//! 1. priority, highest first
//! 2. specificity (number of func/item constraints), highest first
//! 3. declaration order
//!
//! The first route whose method, func and item requirements all hold wins. The catch-all
//! at priority 0 matches anything and answers 404, so selection is total.

use std::sync::OnceLock;

use axum::http::Method;

/// Capability required for every mutating operation.
pub const CONTROL_CAPABILITY: &str = "mp3control";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Capabilities,
    GetStatus,
    SetStatus,
    GetCurrent,
    MoveCurrent,
    SetCurrent,
    GetPlaylist,
    ClearPlaylist,
    AppendSong,
    GetPlaylistItem,
    DeletePlaylistItem,
    InsertPlaylistItem,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodMatch {
    Any,
    Only(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncMatch {
    Any,
    /// Func must equal the value; `""` means no func segment.
    Exactly(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMatch {
    Any,
    Empty,
    Present,
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: MethodMatch,
    pub func: FuncMatch,
    pub item: ItemMatch,
    pub priority: u8,
    pub capability: Option<&'static str>,
    pub op: Operation,
}

impl Route {
    const fn new(method: &'static str, func: &'static str, item: ItemMatch, priority: u8, op: Operation) -> Self {
        Self { method: MethodMatch::Only(method), func: FuncMatch::Exactly(func), item, priority, capability: None, op }
    }

    const fn guarded(self) -> Self {
        Self { capability: Some(CONTROL_CAPABILITY), ..self }
    }

    fn specificity(&self) -> u8 {
        u8::from(self.func != FuncMatch::Any) + u8::from(self.item != ItemMatch::Any)
    }

    pub fn matches(&self, method: &Method, func: &str, item: &str) -> bool {
        let method_ok = match self.method {
            MethodMatch::Any => true,
            MethodMatch::Only(m) => m == method.as_str(),
        };
        let func_ok = match self.func {
            FuncMatch::Any => true,
            FuncMatch::Exactly(f) => f == func,
        };
        let item_ok = match self.item {
            ItemMatch::Any => true,
            ItemMatch::Empty => item.is_empty(),
            ItemMatch::Present => !item.is_empty(),
        };
        method_ok && func_ok && item_ok
    }
}

use ItemMatch::{Any, Empty, Present};
use Operation::*;

const DECLARED: [Route; 13] = [
    Route::new("GET", "", Any, 1, Capabilities),
    Route::new("GET", "status", Any, 1, GetStatus),
    Route::new("PUT", "status", Any, 1, SetStatus).guarded(),
    Route::new("GET", "current", Any, 1, GetCurrent),
    Route::new("POST", "current", Any, 1, MoveCurrent).guarded(),
    Route::new("PUT", "current", Any, 1, SetCurrent).guarded(),
    Route::new("GET", "playlist", Empty, 2, GetPlaylist),
    Route::new("DELETE", "playlist", Empty, 2, ClearPlaylist).guarded(),
    Route::new("POST", "playlist", Empty, 2, AppendSong).guarded(),
    Route::new("GET", "playlist", Present, 1, GetPlaylistItem),
    Route::new("DELETE", "playlist", Present, 1, DeletePlaylistItem).guarded(),
    Route::new("POST", "playlist", Present, 1, InsertPlaylistItem).guarded(),
    Route {
        method: MethodMatch::Any,
        func: FuncMatch::Any,
        item: ItemMatch::Any,
        priority: 0,
        capability: None,
        op: NotFound,
    },
];

/// Routes in scan order.
pub fn table() -> &'static [Route] {
    static TABLE: OnceLock<Vec<Route>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut routes = DECLARED.to_vec();
        // stable sort keeps declaration order among equals
        routes.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.specificity().cmp(&a.specificity())));
        routes
    })
}

/// `HEAD` is routed as `GET`.
pub fn select(method: &Method, func: &str, item: &str) -> &'static Route {
    let get = Method::GET;
    let method = if *method == Method::HEAD { &get } else { method };
    table()
        .iter()
        .find(|r| r.matches(method, func, item))
        .unwrap_or_else(|| &table()[table().len() - 1])
}
