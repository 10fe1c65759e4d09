use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::messages;
use crate::auth::AuthError;
use crate::usecases::{payments::PaymentError, plans::PlanError, tickets::TicketError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub key: &'static str,
    pub message: String,
}

/// An error that knows its HTTP status and catalog key.
pub trait LocalizedError: std::error::Error {
    fn status_code(&self) -> StatusCode;
    fn message_key(&self) -> &'static str;
    fn message_args(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn error_response(err: &impl LocalizedError) -> Response {
    let status = err.status_code();
    let key = err.message_key();
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        key,
        message: messages::render(key, &err.message_args()),
    });

    (status, body).into_response()
}

macro_rules! localized_into_response {
    ($($error:ty),+ $(,)?) => {
        $(
            impl IntoResponse for $error {
                fn into_response(self) -> Response {
                    error_response(&self)
                }
            }
        )+
    };
}

localized_into_response!(AuthError, PaymentError, PlanError, TicketError);

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn renders_code_key_and_message() {
        let response = TicketError::AccountNotProvisioned {
            support_email: "support@example.com".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 403);
        assert_eq!(json["key"], "ticket_for_support");
        assert!(json["message"].as_str().unwrap().contains("support@example.com"));
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = PlanError::Internal(anyhow::anyhow!("connection refused on 10.0.0.3")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.3"));
    }
}
