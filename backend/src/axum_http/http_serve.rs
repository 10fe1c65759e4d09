use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use panel::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{plans::PlanPostgres, tickets::TicketPostgres, users::UserPostgres},
    },
    mail::MailDispatcher,
    providers::ProviderRegistry,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    auth::JwtKeys,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        auto_reply::AutoReplyScheduler, payments::PaymentUseCase, plans::PlanUseCase,
        tickets::TicketUseCase,
    },
};

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    providers: Arc<ProviderRegistry>,
    mailer: Arc<dyn MailDispatcher>,
) -> Result<()> {
    let plan_usecase = Arc::new(PlanUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&providers),
    ));
    // One instance for every ticket route so pending auto-replies are shared.
    let ticket_usecase = Arc::new(TicketUseCase::new(
        Arc::new(TicketPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        mailer,
        Arc::new(AutoReplyScheduler::default()),
        config.support.clone(),
    ));
    let payment_usecase = Arc::new(PaymentUseCase::new(Arc::clone(&providers)));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/regions",
            routers::regions::routes(Arc::clone(&plan_usecase)),
        )
        .nest(
            "/api/v1/admin",
            routers::admin_plans::routes(plan_usecase)
                .merge(routers::admin_tickets::routes(Arc::clone(&ticket_usecase))),
        )
        .nest("/api/v1/tickets", routers::tickets::routes(ticket_usecase))
        .nest("/api/v1/payments", routers::payments::routes(payment_usecase))
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(Arc::new(JwtKeys::new(&config.auth.jwt_secret))))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (config.server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = config.server.port, stage = %config.stage, "http: server is running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("http: received ctrl+c, shutting down"),
        Err(err) => {
            error!(error = %err, "http: failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    }
}
