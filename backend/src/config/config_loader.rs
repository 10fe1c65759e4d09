use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use url::Url;

use super::config_model::{AutoReply, Auth, Database, DotEnvyConfig, Mail, Server, Support};
use super::stage::Stage;

const DEFAULT_AUTO_REPLY_DELAY_SECS: u64 = 20;
const DEFAULT_AUTO_REPLY_MESSAGE: &str =
    "We have resolved this issue. Have a good day.\n\nRegards,\nSupport Staff";

/// Reads the dotenv-format primary config into the process environment, then
/// builds the config from it. Variables already set in the environment win.
pub fn load(path: impl AsRef<Path>) -> Result<DotEnvyConfig> {
    let path = path.as_ref();
    dotenvy::from_path(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    from_lookup(|key| std::env::var(key).ok())
}

pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let required = |key: &str| -> Result<String> {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{key} is required"))
    };
    let parsed = |key: &str| -> Result<u64> {
        required(key)?
            .trim()
            .parse()
            .with_context(|| format!("{key} is invalid"))
    };

    let server = Server {
        port: required("SERVER_PORT")?
            .trim()
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: parsed("SERVER_BODY_LIMIT")?,
        timeout: parsed("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
    };

    let auto_reply_enabled = optional::<bool>(&lookup, "TICKET_AUTO_REPLY_ENABLED")?.unwrap_or(true);
    let auto_reply = if auto_reply_enabled {
        Some(AutoReply {
            delay: Duration::from_secs(
                optional::<u64>(&lookup, "TICKET_AUTO_REPLY_DELAY_SECS")?
                    .unwrap_or(DEFAULT_AUTO_REPLY_DELAY_SECS),
            ),
            message: lookup("TICKET_AUTO_REPLY_MESSAGE")
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.replace("\\n", "\n"))
                .unwrap_or_else(|| DEFAULT_AUTO_REPLY_MESSAGE.to_string()),
        })
    } else {
        None
    };

    let support = Support {
        admin_email: required("ADMIN_EMAIL")?,
        auto_reply,
    };

    let mail = Mail {
        relay_url: lookup("MAIL_RELAY_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|raw| Url::parse(raw.trim()).context("MAIL_RELAY_URL is invalid"))
            .transpose()?,
    };

    let stage = match lookup("STAGE").filter(|v| !v.trim().is_empty()) {
        Some(raw) => Stage::try_from(raw.as_str())?,
        None => Stage::default(),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        support,
        mail,
        stage,
    })
}

fn optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("{key} is invalid")))
        .transpose()
}
