use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::errors::TokenRejection;
use crate::domain::credential::models::AuthenticatedIdentity;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;
use crate::domain::credential::ports::CredentialStore;
use crate::domain::credential::ports::TokenValidatorPort;
use crate::domain::credential::service::with_deadline;

/// Turns a raw bearer token into an authenticated identity.
///
/// Every validation re-reads the user from the store, so a changed or
/// removed account takes effect on the next request. There is no cache.
pub struct TokenValidator<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    store_timeout: Duration,
}

impl<S> TokenValidator<S>
where
    S: CredentialStore,
{
    pub fn new(store: Arc<S>, authenticator: Arc<Authenticator>, store_timeout: Duration) -> Self {
        Self {
            store,
            authenticator,
            store_timeout,
        }
    }

    /// Validate `token` as of `now`.
    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, CredentialError> {
        self.resolve_at(token, now)
            .await
            .map(|user| AuthenticatedIdentity::from(&user))
    }

    /// Validate `token` as of `now` and return the full user record.
    pub(crate) async fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, CredentialError> {
        let claims = self.authenticator.parse_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected by codec");
            CredentialError::InvalidToken(TokenRejection::from(&e))
        })?;

        let timestamp = now.timestamp();
        if timestamp < claims.iat {
            return Err(CredentialError::InvalidToken(TokenRejection::NotYetValid));
        }
        if claims.is_expired(timestamp) {
            return Err(CredentialError::InvalidToken(TokenRejection::Expired));
        }

        let user_id = UserId::from_string(&claims.sub)
            .map_err(|_| CredentialError::InvalidToken(TokenRejection::InvalidSubject))?;

        with_deadline(self.store_timeout, self.store.find_by_id(&user_id))
            .await?
            .ok_or(CredentialError::UserNotFound)
    }
}

#[async_trait]
impl<S> TokenValidatorPort for TokenValidator<S>
where
    S: CredentialStore,
{
    async fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, CredentialError> {
        self.validate_at(token, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::credential::models::EmailAddress;
    use crate::domain::credential::models::Username;
    use crate::outbound::repositories::InMemoryCredentialStore;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
    const TTL: Duration = Duration::from_secs(15 * 60);

    struct Fixture {
        validator: TokenValidator<InMemoryCredentialStore>,
        authenticator: Arc<Authenticator>,
        user: User,
    }

    async fn fixture(is_admin: bool) -> Fixture {
        let store = Arc::new(InMemoryCredentialStore::new());
        let authenticator = Arc::new(Authenticator::new(SECRET, TTL));
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
            username: Username::new("alice".to_string()).unwrap(),
            is_admin,
            created_at: now,
            updated_at: now,
        };
        store.create(user.clone()).await.unwrap();

        Fixture {
            validator: TokenValidator::new(store, Arc::clone(&authenticator), Duration::from_secs(3)),
            authenticator,
            user,
        }
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_validate_returns_identity() {
        let fixture = fixture(true).await;
        let token = fixture
            .authenticator
            .issue_token(fixture.user.id, Utc::now())
            .unwrap();

        let identity = fixture
            .validator
            .validate(&token.access_token)
            .await
            .expect("Validation failed");

        assert_eq!(identity.user_id, fixture.user.id.to_string());
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.username, "alice");
        assert!(identity.is_admin);
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let fixture = fixture(false).await;
        let token = fixture
            .authenticator
            .issue_token(fixture.user.id, issued_at())
            .unwrap();
        let ttl = chrono::Duration::seconds(TTL.as_secs() as i64);

        let just_before = issued_at() + ttl - chrono::Duration::seconds(1);
        assert!(fixture
            .validator
            .validate_at(&token.access_token, just_before)
            .await
            .is_ok());

        let just_after = issued_at() + ttl + chrono::Duration::seconds(1);
        assert!(matches!(
            fixture.validator.validate_at(&token.access_token, just_after).await,
            Err(CredentialError::InvalidToken(TokenRejection::Expired))
        ));
    }

    #[tokio::test]
    async fn test_token_from_the_future_is_rejected() {
        let fixture = fixture(false).await;
        let token = fixture
            .authenticator
            .issue_token(fixture.user.id, issued_at())
            .unwrap();

        let before_issue = issued_at() - chrono::Duration::seconds(1);
        assert!(matches!(
            fixture.validator.validate_at(&token.access_token, before_issue).await,
            Err(CredentialError::InvalidToken(TokenRejection::NotYetValid))
        ));
    }

    #[tokio::test]
    async fn test_forged_signature_is_rejected() {
        let fixture = fixture(false).await;
        let forged = Authenticator::new(b"attacker-secret-key-at-least-32-bytes!", TTL)
            .issue_token(fixture.user.id, Utc::now())
            .unwrap();

        assert!(matches!(
            fixture.validator.validate(&forged.access_token).await,
            Err(CredentialError::InvalidToken(TokenRejection::BadSignature))
        ));
    }

    #[tokio::test]
    async fn test_garbage_is_rejected() {
        let fixture = fixture(false).await;

        assert!(matches!(
            fixture.validator.validate("not-a-token").await,
            Err(CredentialError::InvalidToken(TokenRejection::Malformed))
        ));
    }

    #[tokio::test]
    async fn test_non_uuid_subject_is_rejected() {
        let fixture = fixture(false).await;
        let token = fixture
            .authenticator
            .issue_token("not-a-uuid", Utc::now())
            .unwrap();

        assert!(matches!(
            fixture.validator.validate(&token.access_token).await,
            Err(CredentialError::InvalidToken(TokenRejection::InvalidSubject))
        ));
    }

    #[tokio::test]
    async fn test_unknown_subject_is_user_not_found() {
        let fixture = fixture(false).await;
        let token = fixture
            .authenticator
            .issue_token(UserId::new(), Utc::now())
            .unwrap();

        assert!(matches!(
            fixture.validator.validate(&token.access_token).await,
            Err(CredentialError::UserNotFound)
        ));
    }
}
