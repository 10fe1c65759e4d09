use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use super::{PaymentCheckout, PaymentInterface, PaymentRequest, format_minor_units};
use crate::providers::config::PaypalConfig;

const CHECKOUT_URL: &str = "https://www.paypal.com/cgi-bin/webscr";

/// PayPal website payments. Checkout is a plain `_xclick` link, no API call.
pub struct Paypal {
    business: String,
    return_url: Url,
    currency: String,
}

impl Paypal {
    pub fn new(config: &PaypalConfig) -> Result<Self> {
        if config.business.trim().is_empty() {
            anyhow::bail!("business is required");
        }
        let return_url = Url::parse(&config.return_url)
            .with_context(|| format!("invalid return_url {}", config.return_url))?;

        Ok(Self {
            business: config.business.clone(),
            return_url,
            currency: config.currency.clone(),
        })
    }

    pub fn checkout_url(&self, request: &PaymentRequest) -> Result<Url> {
        let mut url = Url::parse(CHECKOUT_URL)?;
        url.query_pairs_mut()
            .append_pair("cmd", "_xclick")
            .append_pair("business", &self.business)
            .append_pair("item_name", &request.description)
            .append_pair("amount", &format_minor_units(request.amount))
            .append_pair("currency_code", &self.currency)
            .append_pair("custom", &request.user_id.to_string())
            .append_pair("no_shipping", "1")
            .append_pair("return", self.return_url.as_str());
        Ok(url)
    }
}

#[async_trait]
impl PaymentInterface for Paypal {
    fn kind(&self) -> &'static str {
        "paypal"
    }

    async fn checkout(&self, request: &PaymentRequest) -> Result<PaymentCheckout> {
        let url = self.checkout_url(request)?;
        Ok(PaymentCheckout {
            redirect_url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn paypal() -> Paypal {
        Paypal::new(&PaypalConfig {
            business: "billing@example.com".to_string(),
            return_url: "https://panel.example.com/billing".to_string(),
            currency: "EUR".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn checkout_builds_xclick_link() {
        let checkout = paypal()
            .checkout(&PaymentRequest {
                user_id: 7,
                email: "user@example.com".to_string(),
                amount: 1250,
                description: "Credit for user7".to_string(),
            })
            .await
            .unwrap();

        let url = Url::parse(&checkout.redirect_url).unwrap();
        assert_eq!(url.host_str(), Some("www.paypal.com"));
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["cmd"], "_xclick");
        assert_eq!(query["business"], "billing@example.com");
        assert_eq!(query["amount"], "12.50");
        assert_eq!(query["currency_code"], "EUR");
        assert_eq!(query["custom"], "7");
        assert_eq!(query["item_name"], "Credit for user7");
        assert_eq!(query["return"], "https://panel.example.com/billing");
    }

    #[test]
    fn rejects_bad_return_url() {
        let result = Paypal::new(&PaypalConfig {
            business: "billing@example.com".to_string(),
            return_url: "billing".to_string(),
            currency: "USD".to_string(),
        });
        assert!(result.is_err());
    }
}
