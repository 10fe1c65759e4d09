use std::time::Duration;

use anyhow::Result;
use tracing::error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(accept_invalid_certs: bool) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;
    Ok(client)
}

/// Passes successful responses through; logs the body of failed ones and turns them into errors.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
    provider: &str,
    context: &str,
) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let body = match resp.text().await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => "<empty response body>".to_string(),
        Err(err) => format!("<failed to read response body: {err}>"),
    };

    error!(
        provider,
        status = %status,
        response_body = %body,
        context = %context,
        "provider api request failed"
    );

    anyhow::bail!("{provider} API request failed: {context} (status {status})");
}

/// Reads a JSON field that providers send either as a string or as a number.
pub(crate) fn loose_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn loose_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}
