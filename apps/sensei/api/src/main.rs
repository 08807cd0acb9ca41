use axum_helpers::JwtAuth;
use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::RetryConfig;
use migration::Migrator;
use sensei_api::api::{self, Repositories};
use sensei_api::{AppState, Config, openapi};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before anything fallible so start-up errors get colored reports
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(
        config.database.clone(),
        RetryConfig::default(),
    )
    .await
    .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        database::postgres::run_migrations::<Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    }

    let jwt = JwtAuth::new(&config.jwt);
    let state = AppState { config, db, jwt };

    let api_routes = api::routes(Repositories::postgres(&state.db), state.jwt.clone());
    let router = create_router::<openapi::ApiDoc>(api_routes)?;

    // /health is liveness only; /ready pings the database
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!("Starting {} {}", state.config.app.name, state.config.app.version);

    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing database connections");
            match state.db.close().await {
                Ok(()) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Sensei API shutdown complete");
    Ok(())
}
