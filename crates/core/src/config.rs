use std::time::Duration;

use crate::retry::RetryPolicy;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Limits and policies shared by the workflow services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,
    /// The only media type accepted on upload.
    pub allowed_mime_type: String,
    /// Validity of signed blob URLs handed out for private documents.
    pub signed_url_ttl: Duration,
    /// Bound on every individual Record/Blob store call.
    pub store_timeout: Duration,
    /// Lifetime of a sign-in session.
    pub session_ttl: Duration,
    /// Polling used to confirm a new session is resolvable.
    pub session_verify: RetryPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_mime_type: PDF_MIME_TYPE.to_string(),
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            store_timeout: Duration::from_secs(10),
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            session_verify: RetryPolicy::default(),
        }
    }
}
