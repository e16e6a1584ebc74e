use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;
use crate::domain::credential::ports::CredentialStore;

/// Process-local credential store.
///
/// The email index is checked and updated under the same write lock as the
/// insert, so two concurrent registrations of one email cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Users>,
}

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    id_by_email: HashMap<String, UserId>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, user: User) -> Result<User, CredentialError> {
        let mut users = self.users.write().await;

        if users.id_by_email.contains_key(user.email.as_str()) {
            return Err(CredentialError::AlreadyExists(user.email.to_string()));
        }
        if users.by_id.contains_key(&user.id) {
            return Err(CredentialError::Internal(format!(
                "Duplicate user id: {}",
                user.id
            )));
        }

        users
            .id_by_email
            .insert(user.email.as_str().to_string(), user.id);
        users.by_id.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError> {
        let users = self.users.read().await;
        Ok(users
            .id_by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, CredentialError> {
        Ok(self.users.read().await.by_id.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::credential::models::EmailAddress;
    use crate::domain::credential::models::Username;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
            username: Username::new("alice".to_string()).unwrap(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryCredentialStore::new();
        let created = store.create(user("a@x.com")).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap();
        let by_id = store.find_by_id(&created.id).await.unwrap();

        assert_eq!(by_email, Some(created.clone()));
        assert_eq!(by_id, Some(created));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_none() {
        let store = InMemoryCredentialStore::new();

        assert_eq!(store.find_by_email("a@x.com").await.unwrap(), None);
        assert_eq!(store.find_by_id(&UserId::new()).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryCredentialStore::new();
        store.create(user("a@x.com")).await.unwrap();

        let result = store.create(user("a@x.com")).await;

        assert!(matches!(result, Err(CredentialError::AlreadyExists(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = InMemoryCredentialStore::new();
        store.create(user("a@x.com")).await.unwrap();

        assert_eq!(store.find_by_email("A@x.com").await.unwrap(), None);
        assert!(store.create(user("A@x.com")).await.is_ok());
    }
}
