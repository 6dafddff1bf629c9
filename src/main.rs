use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tower_http::trace::TraceLayer;

use library_accounts::{
    config::AppConfig,
    db::{connection, dao::DaoContext},
    logging::init_tracing,
    routes::{catch_panic_layer, router},
    services::{AccountRepository, SeaOrmAccountRepository, bootstrap::seed_admin},
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        eprintln!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging.rust_log);

    let db_cfg = cfg
        .database
        .clone()
        .context("database config missing; set APP_DATABASE__URL")?;
    let auth_cfg = cfg
        .auth
        .clone()
        .context("auth config missing; set APP_AUTH__SESSION_SECRET and the admin account")?;

    let db = connection::connect(&db_cfg).await?;
    let repo: Arc<dyn AccountRepository> =
        Arc::new(SeaOrmAccountRepository::new(DaoContext::new(&db)));

    seed_admin(repo.as_ref(), &auth_cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;

    let state = AppState::new(&auth_cfg, repo);
    let app = Router::new()
        .merge(router(state))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
