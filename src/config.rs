use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::DEFAULT_MAX_POOL_SIZE;

/// Role id handed to the very first registered user.
pub const BOOTSTRAP_ADMIN_ROLE_ID: i32 = 1;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub default_role_id: i32,
    pub upload_dir: PathBuf,
    pub processor_url: String,
    pub processor_timeout_secs: u64,
    pub stale_job_cutoff_minutes: i64,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "docman".to_string());
        let jwt_audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "docman-clients".to_string());
        let jwt_expiry_minutes = env::var("JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("JWT_EXPIRY_MINUTES must be an integer")?;
        let default_role_id = env::var("DEFAULT_ROLE_ID")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("DEFAULT_ROLE_ID must be an integer")?;
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let processor_url =
            env::var("PROCESSOR_URL").context("PROCESSOR_URL must be set")?;
        let processor_timeout_secs = env::var("PROCESSOR_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("PROCESSOR_TIMEOUT_SECS must be an integer")?;
        let stale_job_cutoff_minutes = env::var("STALE_JOB_CUTOFF_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("STALE_JOB_CUTOFF_MINUTES must be an integer")?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            jwt_expiry_minutes,
            default_role_id,
            upload_dir,
            processor_url,
            processor_timeout_secs,
            stale_job_cutoff_minutes,
            cors_allowed_origin,
        })
    }
}
