use axum::Router;

pub mod gl;
pub mod org;
pub mod system;

/// Routes that sit behind the auth middleware.
pub fn router() -> Router {
    Router::new().merge(org::router()).merge(gl::router())
}
