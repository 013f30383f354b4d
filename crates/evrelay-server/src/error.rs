use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use evrelay_proto::ErrorBody;
use thiserror::Error;
use tracing::warn;

use crate::alert_flow::AlertError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Invalid API Key")]
    InvalidApiKey,
    #[error("{0}")]
    Unprocessable(String),
    #[error("Failed to send low battery alert to external service")]
    AlertDelivery(#[from] AlertError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated | ApiError::InvalidApiKey => StatusCode::FORBIDDEN,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::AlertDelivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::AlertDelivery(e) = &self {
            warn!("request failed: {:#}", e);
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}
