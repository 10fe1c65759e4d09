use std::sync::Arc;

use anyhow::Result;
use backend::axum_http::http_serve;
use backend::config::config_loader;
use panel::infra::db::postgres::postgres_connection;
use panel::mail::{LogTransport, MailQueue, MailTransport, RelayTransport};
use panel::providers::{InterfaceConfig, ProviderRegistry};
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "panel.cfg";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        // The subscriber may not be installed yet.
        eprintln!("backend exited with error: {error:#}");
        error!(error = %format!("{error:#}"), "backend: exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let dotenvy_env = config_loader::load(&config_path)?;
    panel::observability::init_observability("backend")?;
    info!(path = %config_path, "config: loaded");

    let interfaces = InterfaceConfig::load(InterfaceConfig::path_for(&config_path))?;
    let providers = ProviderRegistry::from_config(interfaces)?;
    info!(
        regions = providers.regions().len(),
        payment_methods = providers.payment_methods().len(),
        "providers: registry built"
    );

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    postgres_connection::run_migrations(&postgres_pool)?;
    info!("postgres: connection established");

    let transport: Arc<dyn MailTransport> = match &dotenvy_env.mail.relay_url {
        Some(url) => Arc::new(RelayTransport::new(url.clone())?),
        None => Arc::new(LogTransport),
    };
    let mailer = Arc::new(MailQueue::new(vec![transport]));

    http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(providers),
        mailer,
    )
    .await
}
