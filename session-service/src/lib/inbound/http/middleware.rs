use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use credentials::AccessTokenError;
use serde_json::json;

use crate::domain::session::models::Principal;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::router::AppState;

/// Middleware that validates bearer tokens and stores the caller identity
/// in request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    // Extract token from Authorization header
    let token = extract_token_from_header(&req)?;

    let claims = state.token_issuer.verify(token).map_err(|e| {
        tracing::warn!("Access token validation failed: {}", e);
        let message = match e {
            AccessTokenError::Expired => "Token has expired",
            _ => "Invalid token",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": message
            })),
        )
            .into_response()
    })?;

    // A well-signed token can still have been blacklisted by logout
    let blacklisted = state
        .session_service
        .is_token_blacklisted(token)
        .await
        .map_err(|e| {
            tracing::error!("Blacklist lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Could not validate token"
                })),
            )
                .into_response()
        })?;

    if blacklisted {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Token has been revoked"
            })),
        )
            .into_response());
    }

    // The subject claim carries the user's email
    let email = EmailAddress::new(claims.sub).map_err(|e| {
        tracing::error!("Failed to parse subject from token: {}", e);
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid token format"
            })),
        )
            .into_response()
    })?;

    req.extensions_mut().insert(Principal::new(email));

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Missing Authorization header"
                })),
            )
                .into_response()
        })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid Authorization header"
            })),
        )
            .into_response()
    })?;

    if !auth_str.starts_with("Bearer ") {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid Authorization header format. Expected: Bearer <token>"
            })),
        )
            .into_response());
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}
