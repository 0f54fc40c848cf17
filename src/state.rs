use std::sync::Arc;

use diesel::{
    r2d2::{ConnectionManager, PooledConnection},
    sqlite::SqliteConnection,
};

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::SqlitePool,
    error::{AppError, AppResult},
    processor::IngestionProcessor,
    storage::FileStore,
};

type SqlitePooledConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn FileStore>,
    pub processor: Arc<dyn IngestionProcessor>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        config: AppConfig,
        store: Arc<dyn FileStore>,
        processor: Arc<dyn IngestionProcessor>,
        jwt: JwtService,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            store,
            processor,
            jwt,
        }
    }

    pub fn db(&self) -> AppResult<SqlitePooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
