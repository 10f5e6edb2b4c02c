use std::sync::Arc;

use crate::access::{AccessControl, TokenAccess};
use crate::backend::BackendClient;
use crate::config::{EffectiveConfig, PlayerSettings};
use crate::links::Links;
use crate::resolver::ObjectResolver;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<EffectiveConfig>,
    pub access: Arc<dyn AccessControl>,
    pub http: reqwest::Client,
    pub links: Links,
    pub resolver: ObjectResolver,
}

impl AppState {
    pub fn new(cfg: EffectiveConfig) -> Self {
        let access = Arc::new(TokenAccess::new(cfg.tokens.clone()));
        Self::with_access(cfg, access)
    }

    pub fn with_access(cfg: EffectiveConfig, access: Arc<dyn AccessControl>) -> Self {
        let http = reqwest::Client::new();
        let resolver = ObjectResolver::new(http.clone(), cfg.resolve_timeout_ms);
        Self { links: Links::new(&cfg.public_base), cfg: Arc::new(cfg), access, http, resolver }
    }

    pub fn backend(&self, settings: &PlayerSettings) -> BackendClient {
        BackendClient::new(self.http.clone(), &settings.url, self.cfg.backend_timeout_ms)
    }
}
