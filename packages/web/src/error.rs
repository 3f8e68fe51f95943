use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Handler error: an [`api::Error`] rendered as an HTTP response.
#[derive(Debug)]
pub struct AppError(pub api::Error);

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            api::Error::NotFound { .. } => StatusCode::NOT_FOUND,
            api::Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            api::Error::Session(_)
            | api::Error::Database(_)
            | api::Error::Blob(_)
            | api::Error::Config(_)
            | api::Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self.0 {
            api::Error::NotFound { .. } | api::Error::BadRequest(_) => {
                tracing::debug!("Client error: {}", self.0);
            }
            _ => {
                tracing::error!("Internal service error: {:#}", self.0);
            }
        }

        (self.status_code(), self.0.user_message()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<api::Error>,
{
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

/// Convert template failures into internal errors.
pub fn template_error(err: minijinja::Error) -> AppError {
    AppError(api::Error::Internal {
        operation: format!("render template: {err}"),
    })
}

pub fn multipart_error(err: MultipartError) -> AppError {
    AppError(api::Error::BadRequest(err.body_text()))
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = AppError(api::Error::NotFound {
            resource: "Post",
            id: "9".into(),
        });
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let internal = AppError(api::Error::Internal {
            operation: "read secret".into(),
        });
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError(api::Error::Internal {
            operation: "connect to postgres://user:pw@db".into(),
        })
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Internal server error");
    }
}
