use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::document::BlobPath;
use crate::{Error, Result};

pub const BLOB_AUDIENCE: &str = "folio-blob";

#[derive(Debug, Serialize, Deserialize)]
struct BlobClaims {
    sub: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies capability URLs for blobs.
///
/// Signed URLs carry an HS256 token whose subject is the blob path. Expiry
/// is enforced by the token alone; nothing is recorded server-side.
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl UrlSigner {
    pub fn new(base_url: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn public_url(&self, path: &BlobPath) -> String {
        format!("{}/blobs/public/{}", self.base_url, path)
    }

    pub fn signed_url(&self, path: &BlobPath, ttl: Duration) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = BlobClaims {
            sub: path.to_string(),
            aud: BLOB_AUDIENCE.to_string(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("failed to sign blob url: {e}")))?;
        Ok(format!("{}/blobs/signed?token={token}", self.base_url))
    }

    pub fn verify(&self, token: &str) -> Result<BlobPath> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[BLOB_AUDIENCE]);
        validation.leeway = 0;

        let data = decode::<BlobClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => Error::Unauthorized("signed url has expired".into()),
                _ => Error::Unauthorized("invalid signed url".into()),
            }
        })?;
        BlobPath::parse(&data.claims.sub)
            .map_err(|_| Error::Unauthorized("invalid signed url".into()))
    }
}
