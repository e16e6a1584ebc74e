use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::credential::errors::CredentialError;
use crate::domain::credential::models::EmailAddress;
use crate::domain::credential::models::User;
use crate::domain::credential::models::UserId;
use crate::domain::credential::models::Username;
use crate::domain::credential::ports::CredentialStore;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    username: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CredentialError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(row.email)
            .map_err(|e| CredentialError::Internal(format!("Stored email is invalid: {}", e)))?;
        let username = Username::new(row.username)
            .map_err(|e| CredentialError::Internal(format!("Stored username is invalid: {}", e)))?;

        Ok(User {
            id: UserId(row.id),
            email,
            password_hash: row.password_hash,
            username,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, user: User) -> Result<User, CredentialError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, username, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.username.as_str())
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
                {
                    return CredentialError::AlreadyExists(user.email.to_string());
                }
            }
            tracing::error!(error = %e, "Failed to insert user");
            CredentialError::Internal(format!("Database error: {}", e))
        })?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, username, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialError::Internal(format!("Database error: {}", e)))?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, CredentialError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, username, is_admin, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialError::Internal(format!("Database error: {}", e)))?
        .map(User::try_from)
        .transpose()
    }
}
