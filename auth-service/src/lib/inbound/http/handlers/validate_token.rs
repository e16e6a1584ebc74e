use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::credential::models::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

/// Validation endpoint for other services that hold a token but no signing key.
pub async fn validate_token(
    State(state): State<AppState>,
    Json(body): Json<ValidateTokenRequest>,
) -> Result<ApiSuccess<ValidateTokenResponseData>, ApiError> {
    state
        .token_validator
        .validate(&body.token)
        .await
        .map_err(ApiError::from)
        .map(|identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidateTokenRequest {
    token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateTokenResponseData {
    pub is_valid: bool,
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<AuthenticatedIdentity> for ValidateTokenResponseData {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            is_valid: true,
            user_id: identity.user_id,
            email: identity.email,
            username: identity.username,
            is_admin: identity.is_admin,
        }
    }
}
