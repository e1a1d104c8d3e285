use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use atlaserp_auth::JwtValidator;
use atlaserp_core::{TenantId, UserId};

use crate::context::{AuthSession, RequestId};

/// Tenant selector header. Wins over the token's tenant claim so a
/// multi-tenant operator token can address a specific tenant per request.
pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(|_e| StatusCode::UNAUTHORIZED)?;

    let header_tenant = req
        .headers()
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(TenantId::new);

    let session = AuthSession::new(
        UserId::new(claims.sub),
        header_tenant.or_else(|| claims.tenant_id.and_then(TenantId::new)),
    );

    let request_id = RequestId::new();
    tracing::debug!(%request_id, user_id = ?session.user_id, "authenticated request");

    req.extensions_mut().insert(session);
    req.extensions_mut().insert(request_id);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
