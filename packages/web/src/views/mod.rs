pub mod auth;
pub mod posts;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
