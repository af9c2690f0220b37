use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Forbidden")]
    Traversal,

    #[error("File not found")]
    FileNotFound,

    #[error("Directory not found")]
    DirectoryNotFound,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Archive(#[from] async_zip::error::ZipError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Traversal => StatusCode::FORBIDDEN,
            AppError::FileNotFound | AppError::DirectoryNotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) | AppError::Archive(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Server-side failure detail goes to the log, never to the client.
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, body).into_response()
    }
}
