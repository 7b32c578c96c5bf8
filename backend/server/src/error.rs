use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use store::StoreError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Detail goes to the log, never to the client.
        error!("{self}");

        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}
