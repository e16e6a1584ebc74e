use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::errors::EmailError;
use crate::domain::credential::errors::PasswordPolicyError;
use crate::domain::credential::errors::UserIdError;
use crate::domain::credential::errors::UsernameError;

/// User identity record.
///
/// The password hash never leaves the service: `User` is not `Serialize`
/// and its `Debug` output redacts the hash.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub username: Username,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("username", &self.username)
            .field("is_admin", &self.is_admin)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Only presence and length are enforced; the address is kept exactly as
/// given, so lookups are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 254;

    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `Empty` - Email is empty
    /// * `InvalidLength` - Email is shorter than 3 or longer than 254 bytes
    pub fn new(email: String) -> Result<Self, EmailError> {
        if email.is_empty() {
            return Err(EmailError::Empty);
        }
        let length = email.len();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(EmailError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `Empty` - Username is empty
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.len();
        if length == 0 {
            Err(UsernameError::Empty)
        } else if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(username))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfies the registration policy.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;

    /// # Errors
    /// * `Empty` - Password is empty
    /// * `TooShort` - Password shorter than 8 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        if password.is_empty() {
            Err(PasswordPolicyError::Empty)
        } else if password.len() < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Command to register a new user with validated fields
#[derive(Debug)]
pub struct SignUpCommand {
    pub email: EmailAddress,
    pub password: Password,
    pub username: Username,
}

impl SignUpCommand {
    /// Validate raw registration input.
    ///
    /// Fields are checked in order email, password, username; the first
    /// failure is returned.
    pub fn new(email: String, password: String, username: String) -> Result<Self, CredentialError> {
        let email = EmailAddress::new(email)?;
        let password = Password::new(password)?;
        let username = Username::new(username)?;
        Ok(Self {
            email,
            password,
            username,
        })
    }
}

/// Command to authenticate with email and password.
///
/// Not validated against the registration policy: any mismatch is reported
/// as invalid credentials.
pub struct SignInCommand {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignInCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token handed back to a client after sign-up, sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: i64,
}

/// Identity attached to a request after its token has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for AuthenticatedIdentity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            username: user.username.as_str().to_string(),
            is_admin: user.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_length_bounds() {
        assert_eq!(EmailAddress::new(String::new()), Err(EmailError::Empty));
        assert!(matches!(
            EmailAddress::new("ab".to_string()),
            Err(EmailError::InvalidLength { actual: 2, .. })
        ));
        assert!(EmailAddress::new("a@x".to_string()).is_ok());
        assert!(EmailAddress::new("a".repeat(254)).is_ok());
        assert!(EmailAddress::new("a".repeat(255)).is_err());
    }

    #[test]
    fn test_email_keeps_case() {
        let email = EmailAddress::new("Alice@Example.com".to_string()).unwrap();
        assert_eq!(email.as_str(), "Alice@Example.com");
    }

    #[test]
    fn test_username_bounds() {
        assert_eq!(Username::new(String::new()), Err(UsernameError::Empty));
        assert_eq!(
            Username::new("ab".to_string()),
            Err(UsernameError::TooShort { min: 3, actual: 2 })
        );
        assert!(Username::new("abc".to_string()).is_ok());
        assert!(Username::new("a".repeat(32)).is_ok());
        assert_eq!(
            Username::new("a".repeat(33)),
            Err(UsernameError::TooLong { max: 32, actual: 33 })
        );
    }

    #[test]
    fn test_password_policy() {
        assert!(matches!(
            Password::new(String::new()),
            Err(PasswordPolicyError::Empty)
        ));
        assert!(matches!(
            Password::new("short".to_string()),
            Err(PasswordPolicyError::TooShort { min: 8 })
        ));
        assert!(Password::new("password1".to_string()).is_ok());
    }

    #[test]
    fn test_sign_up_command_validation_order() {
        let result = SignUpCommand::new(String::new(), String::new(), String::new());
        assert!(matches!(result, Err(CredentialError::InvalidEmail(_))));

        let result = SignUpCommand::new("a@x.com".into(), "short".into(), String::new());
        assert!(matches!(result, Err(CredentialError::InvalidPassword(_))));

        let result = SignUpCommand::new("a@x.com".into(), "password1".into(), "al".into());
        assert!(matches!(result, Err(CredentialError::InvalidUsername(_))));

        assert!(SignUpCommand::new("a@x.com".into(), "password1".into(), "alice".into()).is_ok());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            password_hash: "$argon2id$secret_hash".to_string(),
            username: Username::new("alice".to_string()).unwrap(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        assert!(!format!("{:?}", user).contains("secret_hash"));

        let command = SignUpCommand::new("a@x.com".into(), "password1".into(), "alice".into()).unwrap();
        assert!(!format!("{:?}", command).contains("password1"));
    }
}
