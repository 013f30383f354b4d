use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::{error::ApiError, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared-key check. Only the blake3 digest of the key is kept; digests are
/// compared in constant time.
pub struct ApiKeyVerifier {
    digest: blake3::Hash,
}

impl ApiKeyVerifier {
    pub fn new(key: Zeroizing<String>) -> Self {
        Self { digest: blake3::hash(key.as_bytes()) }
    }

    pub fn verify(&self, presented: &str) -> bool {
        blake3::hash(presented.as_bytes()) == self.digest
    }

    /// Short, non-reversible tag for logs.
    pub fn fingerprint(&self) -> String {
        self.digest.to_hex().as_str()[..8].to_string()
    }
}

/// Extractor that rejects the request unless it carries the right `X-API-KEY`.
pub struct Authorized;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::NotAuthenticated)?;
        if !state.auth.verify(key) {
            return Err(ApiError::InvalidApiKey);
        }
        Ok(Authorized)
    }
}
