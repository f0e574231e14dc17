use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Issues short-lived signed URLs for attachment objects held in external
/// storage. The token is an HS256 JWT over the storage key, so the storage
/// proxy can verify it without a database round trip.
#[derive(Clone)]
pub struct StorageSigner {
    base_url: String,
    secret: String,
    ttl_secs: u64,
}

#[derive(Serialize, Deserialize)]
struct UrlClaims {
    sub: String,
    exp: usize,
}

impl StorageSigner {
    pub fn new(base_url: &str, secret: &str, ttl_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.to_string(),
            ttl_secs,
        }
    }

    /// Build a time-limited URL for a storage key.
    pub fn signed_url(&self, storage_key: &str) -> Result<String, ServiceError> {
        if self.secret.is_empty() {
            return Err(ServiceError::Validation("storage signing secret not configured".into()));
        }
        let exp = (chrono::Utc::now() + chrono::Duration::seconds(self.ttl_secs as i64)).timestamp() as usize;
        let claims = UrlClaims { sub: storage_key.to_string(), exp };
        let token = encode(
            &JwtHeader::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(format!("{}/{}?token={}", self.base_url, storage_key, token))
    }

    /// Verify a URL token and return the storage key it grants.
    pub fn verify_token(&self, token: &str) -> Result<String, ServiceError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<UrlClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ServiceError::Validation("invalid or expired token".into()))?;
        Ok(data.claims.sub)
    }
}
