use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::OnceCell;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::models::IssuedToken;
use crate::domain::credential::models::SignInCommand;
use crate::domain::credential::models::SignUpCommand;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;
use crate::domain::credential::ports::CredentialServicePort;
use crate::domain::credential::ports::CredentialStore;
use crate::domain::credential::validator::TokenValidator;

/// Run a credential store call under a deadline.
///
/// Expiry yields `Timeout`, never `UserNotFound` or `InvalidCredentials`.
pub(crate) async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, CredentialError>>,
) -> Result<T, CredentialError> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| CredentialError::Timeout)?
}

/// Plaintext behind the hash that unknown emails are verified against.
const UNKNOWN_USER_PASSWORD: &str = "unknown-user-placeholder-password";

/// Registration and login use case.
///
/// Password hashing and verification run on the blocking pool; once started
/// they complete even if the caller goes away. Sign-in with an unknown email
/// still verifies against a placeholder hash, so both failures cost one
/// Argon2 verification.
pub struct CredentialService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    validator: Arc<TokenValidator<S>>,
    store_timeout: Duration,
    unknown_user_hash: OnceCell<String>,
}

impl<S> CredentialService<S>
where
    S: CredentialStore,
{
    /// Create a new credential service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    /// * `validator` - Token validation, used for refresh
    /// * `store_timeout` - Deadline applied to each store call
    pub fn new(
        store: Arc<S>,
        authenticator: Arc<Authenticator>,
        validator: Arc<TokenValidator<S>>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            authenticator,
            validator,
            store_timeout,
            unknown_user_hash: OnceCell::new(),
        }
    }

    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedToken, CredentialError> {
        self.authenticator
            .issue_token(user_id, now)
            .map(|result| IssuedToken {
                token: result.access_token,
                user_id,
                expires_at: result.claims.exp,
            })
            .map_err(|e| CredentialError::Internal(format!("Token generation failed: {}", e)))
    }

    async fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| CredentialError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| CredentialError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Burn one verification for a sign-in whose email matched no user.
    async fn reject_unknown_user(&self, password: String) -> CredentialError {
        let hash = match self
            .unknown_user_hash
            .get_or_try_init(|| self.hash_password(UNKNOWN_USER_PASSWORD))
            .await
        {
            Ok(hash) => hash.clone(),
            Err(e) => return e,
        };

        let authenticator = Arc::clone(&self.authenticator);
        if let Err(e) =
            tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &hash))
                .await
        {
            return CredentialError::Internal(format!("Verification task failed: {}", e));
        }

        CredentialError::InvalidCredentials
    }
}

#[async_trait]
impl<S> CredentialServicePort for CredentialService<S>
where
    S: CredentialStore,
{
    async fn sign_up(&self, command: SignUpCommand) -> Result<IssuedToken, CredentialError> {
        let existing =
            with_deadline(self.store_timeout, self.store.find_by_email(command.email.as_str()))
                .await?;
        if existing.is_some() {
            tracing::debug!("Sign-up rejected: email already registered");
            return Err(CredentialError::AlreadyExists(command.email.to_string()));
        }

        let password_hash = self.hash_password(command.password.expose()).await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: command.email,
            password_hash,
            username: command.username,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };

        // The store re-checks uniqueness atomically; a concurrent sign-up that
        // passed the lookup above fails here with AlreadyExists.
        let created = with_deadline(self.store_timeout, self.store.create(user)).await?;
        tracing::info!(user_id = %created.id, "User registered");

        self.issue(created.id, now)
    }

    async fn sign_in(&self, command: SignInCommand) -> Result<IssuedToken, CredentialError> {
        let Some(user) =
            with_deadline(self.store_timeout, self.store.find_by_email(&command.email)).await?
        else {
            return Err(self.reject_unknown_user(command.password).await);
        };

        let authenticator = Arc::clone(&self.authenticator);
        let stored_hash = user.password_hash.clone();
        let user_id = user.id;
        let now = Utc::now();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&command.password, &stored_hash, user_id, now)
        })
        .await
        .map_err(|e| CredentialError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => CredentialError::InvalidCredentials,
            AuthenticationError::TokenError(err) => {
                CredentialError::Internal(format!("Token generation failed: {}", err))
            }
        })?;

        tracing::info!(user_id = %user_id, "User signed in");

        Ok(IssuedToken {
            token: result.access_token,
            user_id,
            expires_at: result.claims.exp,
        })
    }

    async fn refresh(&self, token: &str) -> Result<IssuedToken, CredentialError> {
        let now = Utc::now();
        let user = self.validator.resolve_at(token, now).await?;

        tracing::debug!(user_id = %user.id, "Token refreshed");
        self.issue(user.id, now)
    }
}
