//! HTTP-facing errors.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use menage_intake::IntakeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("template render failed: {0}")]
    Render(#[from] askama::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Intake(err) if err.category().is_user_facing() => StatusCode::BAD_REQUEST,
            Self::Intake(_) | Self::Render(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::BadRequest(_) => "Bad Request",
            Self::Intake(err) => {
                tracing::error!(
                    category = err.category().as_str(),
                    error = %err,
                    "Request failed"
                );
                "Erreur interne / Внутрішня помилка"
            }
            Self::Render(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                "Erreur interne / Внутрішня помилка"
            }
        };
        let code = status.as_u16();
        let page = format!(
            "<!doctype html><html><head><meta charset=\"utf-8\"><title>{code}</title></head>\
             <body><h1>{code}</h1><p>{body}</p></body></html>"
        );
        (status, Html(page)).into_response()
    }
}
