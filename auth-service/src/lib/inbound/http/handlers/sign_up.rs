use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenResponseData;
use crate::domain::credential::models::SignUpCommand;
use crate::inbound::http::router::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    let command = SignUpCommand::new(body.email, body.password, body.username)?;

    state
        .credential_service
        .sign_up(command)
        .await
        .map_err(ApiError::from)
        .map(|issued| ApiSuccess::new(StatusCode::CREATED, issued.into()))
}

/// HTTP request body for registration (raw JSON)
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SignUpRequest {
    email: String,
    password: String,
    username: String,
}
