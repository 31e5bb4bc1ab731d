//! Identity validation (C7, auth step): verifies a client-presented JWT
//! against the configured issuer's JWKS, producing a `UserIdentity`.
//! Structurally grounded on the teacher's `server::auth::auth_middleware`
//! (fetch-once-cache-reuse, reject-with-401 shape), replacing its static
//! Bearer-API-key comparison with JWKS-backed signature verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use voice_gateway_config::IdentityConfig;
use voice_gateway_core::{GatewayError, UserIdentity};

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize, Clone)]
struct JwkEntry {
    kid: String,
    n: String,
    e: String,
}

struct CachedKeys {
    keys: HashMap<String, JwkEntry>,
    fetched_at: Instant,
}

const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Fetches and caches a JWKS for up to an hour, then validates bearer
/// tokens against it.
pub struct JwtValidator {
    http: reqwest::Client,
    identity_config: IdentityConfig,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwtValidator {
    pub fn new(identity_config: IdentityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            identity_config,
            cache: RwLock::new(None),
        }
    }

    async fn key_for(&self, kid: &str) -> Result<JwkEntry, GatewayError> {
        if let Some(cached) = self.cache.read().as_ref() {
            if cached.fetched_at.elapsed() < CACHE_TTL {
                if let Some(key) = cached.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        let jwks: Jwks = self
            .http
            .get(self.identity_config.jwks_url())
            .send()
            .await
            .map_err(|e| GatewayError::Authentication(format!("jwks fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| GatewayError::Authentication(format!("jwks parse failed: {e}")))?;

        let keys: HashMap<String, JwkEntry> =
            jwks.keys.into_iter().map(|k| (k.kid.clone(), k)).collect();

        let key = keys
            .get(kid)
            .cloned()
            .ok_or_else(|| GatewayError::Authentication(format!("unknown key id {kid:?}")))?;

        *self.cache.write() = Some(CachedKeys { keys, fetched_at: Instant::now() });
        Ok(key)
    }

    /// Validates `token`'s signature, issuer, and audience, returning the
    /// authenticated identity. Never panics on a malformed token — every
    /// failure path returns `GatewayError::Authentication`.
    pub async fn validate(&self, token: &str) -> Result<UserIdentity, GatewayError> {
        let header = decode_header(token)
            .map_err(|e| GatewayError::Authentication(format!("malformed token header: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| GatewayError::Authentication("token missing kid".to_string()))?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| GatewayError::Authentication(format!("bad jwk: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.identity_config.issuer()]);
        validation.set_audience(&[&self.identity_config.client_id]);

        let token_data = decode::<serde_json::Value>(token, &decoding_key, &validation)
            .map_err(|e| GatewayError::Authentication(format!("token validation failed: {e}")))?;

        let claims = token_data.claims;
        let user_id = claims
            .get("sub")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| GatewayError::Authentication("token missing sub claim".to_string()))?
            .to_string();
        let display_name = claims
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        Ok(UserIdentity::new(user_id, display_name).with_claims(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwks_url_reflects_identity_config() {
        let config = IdentityConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "pool-1".to_string(),
            client_id: "client-1".to_string(),
        };
        let validator = JwtValidator::new(config);
        assert!(validator.identity_config.jwks_url().contains("pool-1"));
    }
}
