//! # CSRF double-submit tokens
//!
//! Tokens have the shape `nonce.tag` with `tag = HMAC-SHA256(secret,
//! nonce)`, base64url-encoded. The same token travels in an HttpOnly
//! cookie and the response body; a write must echo it back in the
//! `X-CSRF-Token` header and match the cookie byte for byte.

use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cookie::Cookie;
use hmac::{Hmac, Mac};
use ib_core::error::{AppError, Result};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::handlers::ApiError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_COOKIE: &str = "csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";

const NONCE_LEN: usize = 32;

/// Issues and verifies double-submit tokens. Holds only the derived key
/// bytes; the secret itself stays inside `Settings`.
pub struct CsrfGuard {
    key: Vec<u8>,
}

impl CsrfGuard {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: secret.expose_secret().as_bytes().to_vec(),
        }
    }

    pub fn issue(&self) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);
        let nonce = URL_SAFE_NO_PAD.encode(nonce);
        let tag = self.tag(&nonce)?;
        Ok(format!("{nonce}.{tag}"))
    }

    fn tag(&self, nonce: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::CsrfError(e.to_string()))?;
        mac.update(nonce.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Constant-time verification of a presented token.
    pub fn verify(&self, token: &str) -> bool {
        let Some((nonce, tag)) = token.split_once('.') else {
            return false;
        };
        let Ok(tag_bytes) = URL_SAFE_NO_PAD.decode(tag) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            return false;
        };
        mac.update(nonce.as_bytes());
        mac.verify_slice(&tag_bytes).is_ok()
    }
}

/// CSRF stage for the `/api` subtree. Reads never need a token; writes
/// do whenever enforcement is on (production default). Failures
/// short-circuit before any datastore call.
pub async fn protect(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method();
    let safe = *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS;
    if safe || !state.settings.csrf_enforced() {
        return next.run(request).await;
    }

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let cookie_token = cookie_value(request.headers(), CSRF_COOKIE);

    match (header_token.as_deref(), cookie_token.as_deref()) {
        (Some(header), Some(cookie)) if header == cookie && state.csrf.verify(header) => {
            next.run(request).await
        }
        _ => ApiError(AppError::CsrfError(
            "missing or mismatched double-submit token".into(),
        ))
        .into_response(),
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    Cookie::split_parse(raw.to_owned())
        .filter_map(|parsed| parsed.ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CsrfGuard {
        CsrfGuard::new(&SecretString::from("test-secret".to_string()))
    }

    #[test]
    fn issued_tokens_verify() {
        let guard = guard();
        let token = guard.issue().unwrap();
        assert!(guard.verify(&token));
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let guard = guard();
        assert_ne!(guard.issue().unwrap(), guard.issue().unwrap());
    }

    #[test]
    fn tampered_tokens_fail() {
        let guard = guard();
        let token = guard.issue().unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(!guard.verify(&tampered));
        assert!(!guard.verify("no-dot-here"));
        assert!(!guard.verify(""));
    }

    #[test]
    fn tokens_do_not_verify_under_another_key() {
        let token = guard().issue().unwrap();
        let other = CsrfGuard::new(&SecretString::from("other-secret".to_string()));
        assert!(!other.verify(&token));
    }

    #[test]
    fn cookie_header_parsing_finds_the_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; csrf=abc.def; other=1".parse().unwrap(),
        );
        assert_eq!(cookie_value(&headers, CSRF_COOKIE).as_deref(), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
