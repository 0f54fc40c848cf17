use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use docman::{
    auth::jwt::JwtService,
    config::AppConfig,
    db, jobs,
    processor::HttpProcessor,
    routes,
    state::AppState,
    storage::DiskStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = config.server_port,
        database_url = %config.database_url,
        processor_url = %config.processor_url,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    db::run_migrations(&pool)?;

    // Reconcile jobs orphaned by an earlier crash mid-trigger.
    {
        let mut conn = pool.get()?;
        let swept = jobs::sweep_stale_jobs(&mut conn, config.stale_job_cutoff_minutes)?;
        if swept > 0 {
            tracing::warn!(swept, "marked stale in-progress ingestion jobs as failed");
        }
    }

    let store = Arc::new(DiskStore::new(config.upload_dir.clone()));
    let processor = Arc::new(HttpProcessor::from_config(&config)?);
    let jwt = JwtService::from_config(&config);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(pool, config, store, processor, jwt);
    let router = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
