use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Webhook signature missing, malformed, or mismatched.
    #[error("invalid webhook signature")]
    SignatureInvalid,

    /// Request body is not valid JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::SignatureInvalid => StatusCode::FORBIDDEN,
            GatewayError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
