use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::credential::errors::CredentialError;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Middleware that throttles each client before any handler runs
pub async fn admission_control(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&req, state.trust_forwarded_for);
    state.admission.admit(&client).await?;

    Ok(next.run(req).await)
}

/// Middleware that validates the bearer token and adds the identity to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();

    let identity = state
        .token_validator
        .validate(&token)
        .await
        .map_err(|e| match e {
            CredentialError::UserNotFound => {
                tracing::warn!("Token subject no longer exists");
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            _ => ApiError::from(e),
        })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Token from the `Authorization` header, with or without the `Bearer ` prefix.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    (!token.is_empty()).then_some(token)
}

/// Rate-limit key for a request: the peer IP, or the first forwarded hop when trusted.
fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn request_from(peer: &str, forwarded_for: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/health");
        if let Some(value) = forwarded_for {
            builder = builder.header(FORWARDED_FOR, value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        assert_eq!(
            bearer_token(&headers_with_authorization("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(
            bearer_token(&headers_with_authorization("abc.def.ghi")),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with_authorization("")), None);
        assert_eq!(bearer_token(&headers_with_authorization("Bearer ")), None);
    }

    #[test]
    fn test_client_key_uses_peer_ip() {
        let req = request_from("10.0.0.7:51234", Some("203.0.113.9"));
        assert_eq!(client_key(&req, false), "10.0.0.7");
    }

    #[test]
    fn test_client_key_uses_first_forwarded_hop_when_trusted() {
        let req = request_from("10.0.0.7:51234", Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&req, true), "203.0.113.9");

        let req = request_from("10.0.0.7:51234", None);
        assert_eq!(client_key(&req, true), "10.0.0.7");
    }

    #[test]
    fn test_client_key_without_peer_address() {
        let req = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req, false), UNKNOWN_CLIENT);
    }
}
