use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{PaymentCheckout, PaymentInterface, PaymentRequest};

const RETURN_PATH: &str = "/panel/billing";

/// Accepts every checkout and points straight back at the billing page.
#[derive(Debug, Default)]
pub struct FakePayment;

#[async_trait]
impl PaymentInterface for FakePayment {
    fn kind(&self) -> &'static str {
        "fake"
    }

    async fn checkout(&self, request: &PaymentRequest) -> Result<PaymentCheckout> {
        info!(user_id = request.user_id, amount = request.amount, "fake payment: checkout");
        Ok(PaymentCheckout {
            redirect_url: format!("{RETURN_PATH}?amount={}", request.amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn redirects_back_with_amount() {
        let checkout = FakePayment
            .checkout(&PaymentRequest {
                user_id: 1,
                email: "a@example.com".to_string(),
                amount: 500,
                description: "Credit".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(checkout.redirect_url, "/panel/billing?amount=500");
    }
}
