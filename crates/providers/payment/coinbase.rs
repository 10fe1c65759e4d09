use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::info;

use super::{PaymentCheckout, PaymentInterface, PaymentRequest, format_minor_units};
use crate::providers::config::CoinbaseConfig;
use crate::providers::http::{build_client, ensure_success};

type HmacSha256 = Hmac<Sha256>;

const BUTTONS_URL: &str = "https://api.coinbase.com/v1/buttons";
const CHECKOUT_BASE: &str = "https://www.coinbase.com/checkouts";

pub struct Coinbase {
    http: reqwest::Client,
    callback_secret: String,
    api_key: String,
    api_secret: String,
}

impl Coinbase {
    pub fn new(config: &CoinbaseConfig) -> Result<Self> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            anyhow::bail!("api_key and api_secret are required");
        }
        if config.callback_secret.is_empty() {
            anyhow::bail!("callback_secret is required");
        }

        Ok(Self {
            http: build_client(false)?,
            callback_secret: config.callback_secret.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// The callback URL carries the shared secret; compares it in constant time.
    pub fn verify_callback_secret(&self, provided: &str) -> bool {
        let expected = self.callback_secret.as_bytes();
        let provided = provided.as_bytes();
        if expected.len() != provided.len() {
            return false;
        }
        expected
            .iter()
            .zip(provided)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

pub(crate) fn request_signature(api_secret: &str, nonce: &str, url: &str, body: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())?;
    mac.update(format!("{nonce}{url}{body}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn button_body(request: &PaymentRequest) -> Value {
    json!({
        "button": {
            "name": request.description,
            "price_string": format_minor_units(request.amount),
            "price_currency_iso": "USD",
            "custom": request.user_id.to_string(),
            "type": "buy_now",
            "style": "none",
        }
    })
}

fn checkout_url(response: &Value) -> Result<String> {
    if response.get("success").and_then(Value::as_bool) == Some(false) {
        let errors = response
            .get("errors")
            .map(Value::to_string)
            .unwrap_or_default();
        return Err(anyhow!("coinbase button creation failed: {errors}"));
    }
    let code = response
        .pointer("/button/code")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("coinbase response missing button code"))?;
    Ok(format!("{CHECKOUT_BASE}/{code}"))
}

#[async_trait]
impl PaymentInterface for Coinbase {
    fn kind(&self) -> &'static str {
        "coinbase"
    }

    async fn checkout(&self, request: &PaymentRequest) -> Result<PaymentCheckout> {
        let body = button_body(request).to_string();
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or_default()
            .to_string();
        let signature = request_signature(&self.api_secret, &nonce, BUTTONS_URL, &body)?;

        let resp = self
            .http
            .post(BUTTONS_URL)
            .header("ACCESS_KEY", &self.api_key)
            .header("ACCESS_SIGNATURE", signature)
            .header("ACCESS_NONCE", &nonce)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let resp = ensure_success(resp, "coinbase", "create button").await?;

        let redirect_url = checkout_url(&resp.json().await?)?;
        info!(user_id = request.user_id, amount = request.amount, "coinbase: checkout created");
        Ok(PaymentCheckout { redirect_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coinbase() -> Coinbase {
        Coinbase::new(&CoinbaseConfig {
            callback_secret: "s3cret".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn callback_secret_must_match_exactly() {
        let cb = coinbase();
        assert!(cb.verify_callback_secret("s3cret"));
        assert!(!cb.verify_callback_secret("s3cre"));
        assert!(!cb.verify_callback_secret("s3creT"));
    }

    #[test]
    fn signature_depends_on_nonce_and_body() {
        let sig = request_signature("secret", "1", BUTTONS_URL, "{}").unwrap();
        assert_eq!(sig.len(), 64);
        assert_ne!(sig, request_signature("secret", "2", BUTTONS_URL, "{}").unwrap());
        assert_ne!(sig, request_signature("secret", "1", BUTTONS_URL, "{\"a\":1}").unwrap());
    }

    #[test]
    fn button_code_becomes_checkout_link() {
        let url = checkout_url(&json!({"success": true, "button": {"code": "abc123"}})).unwrap();
        assert_eq!(url, "https://www.coinbase.com/checkouts/abc123");

        assert!(checkout_url(&json!({"success": false, "errors": ["bad price"]})).is_err());
        assert!(checkout_url(&json!({"success": true})).is_err());
    }

    #[test]
    fn button_carries_amount_and_owner() {
        let body = button_body(&PaymentRequest {
            user_id: 3,
            email: "a@example.com".to_string(),
            amount: 999,
            description: "Credit".to_string(),
        });
        assert_eq!(body["button"]["price_string"], "9.99");
        assert_eq!(body["button"]["custom"], "3");
    }
}
