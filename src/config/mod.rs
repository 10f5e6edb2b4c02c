use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

/// Implementation class a registry entry must declare for this adapter to own it.
pub const PLAYER_CLASS: &str = "MJSPlayer";

pub const CONFIG_FILE_NAMES: [&str; 2] = ["mjs-adapter.toml", "MJS-Adapter.toml"];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_capabilities")]
    pub capabilities: HashMap<String, String>,
    #[serde(default)]
    pub players: PlayersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub public_base: String,
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), public_base: String::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_clean_log")]
    pub clean_log_on_start: bool,
}
fn default_clean_log() -> bool {
    true
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self { clean_log_on_start: default_clean_log() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}
fn default_timeout() -> u64 {
    5_000
}
impl Default for BackendConfig {
    fn default() -> Self {
        Self { timeout_ms: default_timeout() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub blocked: Vec<String>,
}
impl Default for ResolverConfig {
    fn default() -> Self {
        Self { timeout_ms: default_timeout(), allowed: Vec::new(), blocked: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub token: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_capabilities() -> HashMap<String, String> {
    HashMap::from([("mjs".to_string(), "/capabilities/mjs".to_string())])
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlayersConfig {
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub registry: HashMap<String, PlayerSettings>,
}

/// Registry entry for one player.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlayerSettings {
    pub class: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub token: String,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub host: String,
    pub port: u16,
    pub public_base: String,
    pub clean_log_on_start: bool,
    pub backend_timeout_ms: u64,
    pub resolve_timeout_ms: u64,
    pub allow_patterns: Vec<Regex>,
    pub block_patterns: Vec<Regex>,
    pub tokens: Vec<TokenGrant>,
    pub capabilities: HashMap<String, String>,
    pub players_enabled: Vec<String>,
    pub players: HashMap<String, PlayerSettings>,
}

impl EffectiveConfig {
    /// Settings of `name` when it is enabled and backed by this adapter's class.
    pub fn owned_player(&self, name: &str) -> Option<&PlayerSettings> {
        if !self.players_enabled.iter().any(|p| p == name) {
            return None;
        }
        self.players.get(name).filter(|s| s.class == PLAYER_CLASS)
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        effective(RawConfig { capabilities: default_capabilities(), ..Default::default() })
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# MJS Adapter Configuration

[server]
# Host/IP to bind. Default: 0.0.0.0
host = "0.0.0.0"
# Port to bind. Default: 8080
port = 8080
# Prefix for the resource URLs handed out to clients (e.g. "https://hifi.example.org").
# Default: "" (URLs are absolute paths such as /player/mjs/kitchen/playlist/3)
public_base = ""

[logging]
# Truncate .logs/mjs-adapter.log on startup. Default: true
clean_log_on_start = true

[backend]
# Timeout for every call made to a player backend, in milliseconds. Default: 5000
timeout_ms = 5000

[resolver]
# Timeout for fetching media objects referenced by playlist additions. Default: 5000
timeout_ms = 5000
# Regex patterns of media object URLs that may be fetched. If empty, all are allowed unless blocked.
# Match is tested against both the full URL and the hostname.
# allowed = ["^media\\.example\\.org$"]
allowed = []
# Regex patterns that are blocked. These take priority over allowed.
blocked = []

[auth]
# Bearer tokens and the capabilities they grant. A token naming an environment variable is
# replaced by that variable's value. With no tokens configured every request is authorized.
# tokens = [{ token = "MJS_CONTROL_TOKEN", capabilities = ["mp3control"] }]
tokens = []

[capabilities]
# Resource path advertised for each capability.
mjs = "/capabilities/mjs"

[players]
# Players that are served. Names must also appear in the registry below.
enabled = []

# [players.registry.kitchen]
# class = "MJSPlayer"
# url = "http://192.168.1.20:8000/"
"#;

/// Parses a TOML document into the effective configuration.
pub fn from_toml_str(contents: &str) -> Result<EffectiveConfig> {
    let raw: RawConfig = toml::from_str(contents).context("parse mjs-adapter config")?;
    Ok(effective(raw))
}

pub fn load_config_from(path: Option<&Path>) -> EffectiveConfig {
    let _ = dotenvy::dotenv();

    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path(),
    };

    if !path.exists() {
        if let Err(e) = std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE) {
            tracing::warn!(?e, path = %path.display(), "Failed to create default config file");
        } else {
            tracing::info!(path = %path.display(), "Created default config file");
        }
    }

    let mut cfg = match std::fs::read_to_string(&path) {
        Ok(contents) => match from_toml_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(?e, "Failed to parse mjs-adapter config; using defaults");
                EffectiveConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!(?e, path = %path.display(), "Failed to read mjs-adapter config; using defaults");
            EffectiveConfig::default()
        }
    };

    apply_env_overrides(&mut cfg);
    cfg
}

fn default_config_path() -> PathBuf {
    CONFIG_FILE_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAMES[0]))
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) {
    if let Ok(host) = std::env::var("MJS_HOST") {
        cfg.host = host;
    }
    if let Some(port) = std::env::var("MJS_PORT").ok().and_then(|s| s.parse().ok()) {
        cfg.port = port;
    }
    if let Some(ms) = std::env::var("MJS_BACKEND_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()) {
        cfg.backend_timeout_ms = ms;
    }
    if let Ok(base) = std::env::var("MJS_PUBLIC_BASE") {
        cfg.public_base = base;
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern = %p, ?e, "Skipping invalid resolver pattern");
                None
            }
        })
        .collect()
}

fn env_or_literal(val: &str) -> String {
    std::env::var(val).unwrap_or_else(|_| val.to_string())
}

fn effective(raw: RawConfig) -> EffectiveConfig {
    let tokens = raw
        .auth
        .tokens
        .iter()
        .map(|t| TokenGrant { token: env_or_literal(&t.token), capabilities: t.capabilities.clone() })
        .collect();

    EffectiveConfig {
        host: raw.server.host,
        port: raw.server.port,
        public_base: raw.server.public_base.trim_end_matches('/').to_string(),
        clean_log_on_start: raw.logging.clean_log_on_start,
        backend_timeout_ms: raw.backend.timeout_ms,
        resolve_timeout_ms: raw.resolver.timeout_ms,
        allow_patterns: compile_patterns(&raw.resolver.allowed),
        block_patterns: compile_patterns(&raw.resolver.blocked),
        tokens,
        capabilities: raw.capabilities,
        players_enabled: raw.players.enabled,
        players: raw.players.registry,
    }
}
