//! Authentication utilities library
//!
//! Provides the credential and token primitives used by the authentication
//! service and its request boundary:
//! - Password hashing (Argon2id)
//! - Access token signing and parsing (JWT, HS256 only)
//! - Authentication coordination with a fixed token lifetime
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenClaims, TokenCodec};
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = TokenClaims { sub: "user123".to_string(), iat: 1_700_000_000, exp: 1_700_000_900 };
//! let token = codec.sign(&claims).unwrap();
//! assert_eq!(codec.parse(&token).unwrap(), claims);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use std::time::Duration;
//!
//! use auth::Authenticator;
//! use chrono::Utc;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!", Duration::from_secs(900));
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let result = auth.authenticate("password123", &hash, "user123", Utc::now()).unwrap();
//!
//! // Later: verify signature, then check expiry against the clock
//! let claims = auth.parse_token(&result.access_token).unwrap();
//! assert!(claims.is_valid_at(Utc::now().timestamp()));
//! ```

pub mod authenticator;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::TokenClaims;
pub use token::TokenCodec;
pub use token::TokenError;
