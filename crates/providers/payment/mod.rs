pub mod coinbase;
pub mod fake;
pub mod paypal;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub user_id: i32,
    pub email: String,
    /// Amount in minor currency units (cents).
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentCheckout {
    pub redirect_url: String,
}

/// A payment backend. Checkout hands back the URL the customer is sent to.
#[async_trait]
pub trait PaymentInterface: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn checkout(&self, request: &PaymentRequest) -> Result<PaymentCheckout>;
}

/// `1234` -> `"12.34"`.
pub(crate) fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minor_units_as_decimal() {
        assert_eq!(format_minor_units(1234), "12.34");
        assert_eq!(format_minor_units(5), "0.05");
        assert_eq!(format_minor_units(100), "1.00");
        assert_eq!(format_minor_units(-250), "-2.50");
    }
}
