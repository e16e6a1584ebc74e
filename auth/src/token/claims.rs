use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an access token.
///
/// Timestamps are Unix seconds. A claims set is valid while
/// `iat <= now < exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Create claims for a subject issued at `issued_at` and living for `ttl`.
    ///
    /// Sub-second parts of `ttl` are dropped; `ttl` below one second is
    /// raised to one second so that `exp` is always after `iat`.
    pub fn for_subject(subject: impl ToString, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);

        Self {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        }
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }

    /// Check whether the claims are within their validity window.
    pub fn is_valid_at(&self, current_timestamp: i64) -> bool {
        self.iat <= current_timestamp && !self.is_expired(current_timestamp)
    }
}
