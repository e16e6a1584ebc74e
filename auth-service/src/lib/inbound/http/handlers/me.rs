use axum::http::StatusCode;
use axum::Extension;

use super::ApiSuccess;
use crate::domain::credential::models::AuthenticatedIdentity;

/// Echo the identity the authentication middleware attached to the request.
pub async fn me(
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> ApiSuccess<AuthenticatedIdentity> {
    ApiSuccess::new(StatusCode::OK, identity)
}
