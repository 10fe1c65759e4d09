use std::time::Duration;

use url::Url;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub support: Support,
    pub mail: Mail,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    /// MiB.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Support {
    pub admin_email: String,
    pub auto_reply: Option<AutoReply>,
}

#[derive(Debug, Clone)]
pub struct AutoReply {
    pub delay: Duration,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Mail {
    pub relay_url: Option<Url>,
}
