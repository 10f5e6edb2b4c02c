//! Capability checks against an access-control collaborator.

use axum::http::{header, HeaderMap, StatusCode};

use crate::config::TokenGrant;

/// Rejection returned by an access-control implementation. Status and message are
/// handed back to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejection {
    pub status: StatusCode,
    pub message: String,
}

pub trait AccessControl: Send + Sync {
    /// Decides whether the request carrying `headers` may use `capability`.
    fn authorize(&self, headers: &HeaderMap, capability: &str) -> Result<(), AuthRejection>;
}

/// Bearer tokens from the `[auth]` config section, each granting a set of capabilities.
/// With no tokens configured every request is authorized.
pub struct TokenAccess {
    grants: Vec<TokenGrant>,
}

impl TokenAccess {
    pub fn new(grants: Vec<TokenGrant>) -> Self {
        Self { grants }
    }

    pub fn is_open(&self) -> bool {
        self.grants.is_empty()
    }
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let hdr = headers.get(header::AUTHORIZATION).and_then(|h| h.to_str().ok())?;
    Some(hdr.strip_prefix("Bearer ").unwrap_or(hdr).trim())
}

impl AccessControl for TokenAccess {
    fn authorize(&self, headers: &HeaderMap, capability: &str) -> Result<(), AuthRejection> {
        if self.is_open() {
            return Ok(());
        }
        let grant = presented_token(headers).and_then(|t| self.grants.iter().find(|g| g.token == t));
        match grant {
            None => Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                message: "missing or unknown access token".into(),
            }),
            Some(g) if g.capabilities.iter().any(|c| c == capability) => Ok(()),
            Some(_) => Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: format!("token does not grant {capability}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn access() -> TokenAccess {
        TokenAccess::new(vec![
            TokenGrant { token: "ctl".into(), capabilities: vec!["mp3control".into()] },
            TokenGrant { token: "ro".into(), capabilities: vec![] },
        ])
    }

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn open_when_no_tokens() {
        let open = TokenAccess::new(Vec::new());
        assert!(open.authorize(&HeaderMap::new(), "mp3control").is_ok());
    }

    #[test]
    fn missing_or_unknown_token_is_401() {
        let a = access();
        assert_eq!(a.authorize(&HeaderMap::new(), "mp3control").unwrap_err().status, StatusCode::UNAUTHORIZED);
        assert_eq!(a.authorize(&with_auth("Bearer nope"), "mp3control").unwrap_err().status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn token_without_capability_is_403() {
        let err = access().authorize(&with_auth("Bearer ro"), "mp3control").unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.message.contains("mp3control"));
    }

    #[test]
    fn bearer_and_raw_tokens_accepted() {
        let a = access();
        assert!(a.authorize(&with_auth("Bearer ctl"), "mp3control").is_ok());
        assert!(a.authorize(&with_auth("ctl"), "mp3control").is_ok());
    }
}
