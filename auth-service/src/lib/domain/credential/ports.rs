use async_trait::async_trait;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::models::AuthenticatedIdentity;
use crate::domain::credential::models::IssuedToken;
use crate::domain::credential::models::SignInCommand;
use crate::domain::credential::models::SignUpCommand;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;

/// Port for registration and login operations.
#[async_trait]
pub trait CredentialServicePort: Send + Sync + 'static {
    /// Register a new user and issue a token bound to it.
    ///
    /// # Errors
    /// * `AlreadyExists` - Email is already registered
    /// * `Timeout` - Credential store did not answer in time
    /// * `Internal` - Hashing, signing or store failure
    async fn sign_up(&self, command: SignUpCommand) -> Result<IssuedToken, CredentialError>;

    /// Verify email and password and issue a token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Timeout` - Credential store did not answer in time
    /// * `Internal` - Hashing, signing or store failure
    async fn sign_in(&self, command: SignInCommand) -> Result<IssuedToken, CredentialError>;

    /// Exchange a currently valid token for a fresh one.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, forged or expired
    /// * `UserNotFound` - Subject no longer exists
    /// * `Timeout` / `Internal` - Store or signing failure
    async fn refresh(&self, token: &str) -> Result<IssuedToken, CredentialError>;
}

/// Port for turning a bearer token into an authenticated identity.
#[async_trait]
pub trait TokenValidatorPort: Send + Sync + 'static {
    /// Validate a raw token against the current time and the credential store.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, forged, uses another algorithm, or expired
    /// * `UserNotFound` - Subject does not exist
    /// * `Timeout` - Credential store did not answer in time
    /// * `Internal` - Credential store failure
    async fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, CredentialError>;
}

/// Persistence operations for user records.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// Email uniqueness is enforced here, atomically with the insert.
    ///
    /// # Errors
    /// * `AlreadyExists` - Email is already registered
    /// * `Internal` - Storage operation failed
    async fn create(&self, user: User) -> Result<User, CredentialError>;

    /// Retrieve user by exact email address.
    ///
    /// # Errors
    /// * `Internal` - Storage operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `Internal` - Storage operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, CredentialError>;
}
