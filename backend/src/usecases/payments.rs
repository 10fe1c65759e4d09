use std::sync::Arc;

use axum::http::StatusCode;
use panel::providers::{PaymentCheckout, PaymentRequest, ProviderRegistry};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::axum_http::error_responses::LocalizedError;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutModel {
    /// Minor currency units.
    pub amount: i64,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment method {0} is not configured")]
    MethodNotFound(String),
    #[error("amount must be positive")]
    InvalidAmount,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LocalizedError for PaymentError {
    fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::MethodNotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::InvalidAmount => StatusCode::BAD_REQUEST,
            PaymentError::Internal(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            PaymentError::MethodNotFound(_) => "payment_method_not_found",
            PaymentError::InvalidAmount => "invalid_amount",
            PaymentError::Internal(_) => "payment_failed",
        }
    }

    fn message_args(&self) -> Vec<String> {
        match self {
            PaymentError::MethodNotFound(method) => vec![method.clone()],
            _ => Vec::new(),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

pub struct PaymentUseCase {
    providers: Arc<ProviderRegistry>,
}

impl PaymentUseCase {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    pub fn methods(&self) -> Vec<String> {
        self.providers.payment_methods()
    }

    pub async fn checkout(
        &self,
        user_id: i32,
        email: Option<String>,
        method: &str,
        model: CheckoutModel,
    ) -> UseCaseResult<PaymentCheckout> {
        if model.amount <= 0 {
            warn!(user_id, amount = model.amount, "payments: invalid amount");
            return Err(PaymentError::InvalidAmount);
        }

        let provider = self.providers.payment(method).ok_or_else(|| {
            warn!(user_id, %method, "payments: unknown payment method");
            PaymentError::MethodNotFound(method.to_string())
        })?;

        let request = PaymentRequest {
            user_id,
            email: email.unwrap_or_default(),
            amount: model.amount,
            description: format!("Account credit for user #{user_id}"),
        };

        let checkout = provider.checkout(&request).await.map_err(|err| {
            error!(user_id, %method, provider_error = ?err, "payments: checkout failed");
            PaymentError::Internal(err)
        })?;

        info!(user_id, %method, amount = model.amount, "payments: checkout started");
        Ok(checkout)
    }
}
