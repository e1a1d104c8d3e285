use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use atlaserp_auth::AuthzError;

use crate::guard::GuardError;

pub fn guard_error_response(err: GuardError) -> axum::response::Response {
    match err {
        GuardError::Authz(e) => authz_error_response(e),
        GuardError::Store(e) => {
            tracing::error!(error = %e, "authorization store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal server error",
            )
        }
    }
}

pub fn authz_error_response(err: AuthzError) -> axum::response::Response {
    match err {
        AuthzError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        AuthzError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

pub fn db_error_response(err: sqlx::Error) -> axum::response::Response {
    tracing::error!(error = %err, "query failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "db_error",
        "internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
