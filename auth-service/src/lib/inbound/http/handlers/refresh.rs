use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenResponseData;
use crate::domain::credential::errors::CredentialError;
use crate::inbound::http::router::AppState;

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    state
        .credential_service
        .refresh(&body.token)
        .await
        .map_err(|e| match e {
            // Subject deleted since the token was issued.
            CredentialError::UserNotFound => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            _ => ApiError::from(e),
        })
        .map(|issued| ApiSuccess::new(StatusCode::OK, issued.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequest {
    token: String,
}
