use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use docman::auth::jwt::JwtService;
use docman::config::AppConfig;
use docman::db::{self, SqlitePool};
use docman::processor::{IngestionProcessor, ProcessorError};
use docman::routes;
use docman::state::AppState;
use docman::storage::DiskStore;
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

#[derive(Clone)]
pub enum ProcessorBehavior {
    Succeed(Value),
    Fail {
        message: String,
        payload: Option<Value>,
    },
}

/// Stand-in for the external processor; tests flip its behavior per case.
pub struct FakeProcessor {
    behavior: Mutex<ProcessorBehavior>,
}

impl Default for FakeProcessor {
    fn default() -> Self {
        Self {
            behavior: Mutex::new(ProcessorBehavior::Succeed(Value::Null)),
        }
    }
}

impl FakeProcessor {
    pub async fn succeed_with(&self, payload: Value) {
        *self.behavior.lock().await = ProcessorBehavior::Succeed(payload);
    }

    pub async fn fail_with(&self, message: &str, payload: Option<Value>) {
        *self.behavior.lock().await = ProcessorBehavior::Fail {
            message: message.to_string(),
            payload,
        };
    }
}

#[async_trait]
impl IngestionProcessor for FakeProcessor {
    async fn process(&self, _source: &str) -> Result<Value, ProcessorError> {
        match self.behavior.lock().await.clone() {
            ProcessorBehavior::Succeed(payload) => Ok(payload),
            ProcessorBehavior::Fail { message, payload } => {
                Err(ProcessorError { message, payload })
            }
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    processor: Arc<FakeProcessor>,
    _tmp: TempDir,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let tmp = TempDir::new().context("failed to create temp dir")?;
        let database_path = tmp.path().join("test.db");

        let config = AppConfig {
            database_url: database_path.to_string_lossy().into_owned(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            default_role_id: 3,
            upload_dir: tmp.path().join("uploads"),
            processor_url: "http://localhost:9/process".to_string(),
            processor_timeout_secs: 1,
            stale_job_cutoff_minutes: 60,
            cors_allowed_origin: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        db::run_migrations(&pool)?;

        let store = Arc::new(DiskStore::new(config.upload_dir.clone()));
        let processor = Arc::new(FakeProcessor::default());
        let jwt = JwtService::from_config(&config);
        let state = AppState::new(pool, config, store, processor.clone(), jwt);
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            processor,
            _tmp: tmp,
        })
    }

    #[allow(dead_code)]
    pub fn processor(&self) -> Arc<FakeProcessor> {
        self.processor.clone()
    }

    #[allow(dead_code)]
    pub async fn register(&self, username: &str, password: &str) -> Result<hyper::Response<Body>> {
        #[derive(Serialize)]
        struct RegisterPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        self.post_json(
            "/api/v1/auth/register",
            &RegisterPayload { username, password },
            None,
        )
        .await
    }

    #[allow(dead_code)]
    pub async fn login(&self, username: &str, password: &str) -> Result<hyper::Response<Body>> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        self.post_json(
            "/api/v1/auth/login",
            &LoginPayload { username, password },
            None,
        )
        .await
    }

    #[allow(dead_code)]
    pub async fn login_token(&self, username: &str, password: &str) -> Result<String> {
        let response = self.login(username, password).await?;
        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_json(response.into_body()).await?;
        body["data"]["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("login response missing access_token"))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::DELETE).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    /// POST with a raw header value, for exercising malformed
    /// authorization headers.
    #[allow(dead_code)]
    pub async fn post_with_header(
        &self,
        path: &str,
        header_value: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::POST).uri(path);
        if let Some(value) = header_value {
            builder = builder.header("authorization", value);
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        title: Option<&str>,
        file: Option<(&str, &str, &[u8])>,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        if let Some(title) = title {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(b"Content-Disposition: form-data; name=\"title\"\r\n\r\n");
            body.extend(title.as_bytes());
            body.extend(b"\r\n");
        }

        if let Some((filename, content_type, data)) = file {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
            body.extend(data);
            body.extend(b"\r\n");
        }

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let mut builder = Request::builder().method(method).uri(path).header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        );
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn user_id(&self, username: &str) -> Result<i32> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            use docman::schema::users::dsl;
            let id = dsl::users
                .filter(dsl::username.eq(&username))
                .select(dsl::id)
                .first::<i32>(conn)
                .context("user not found")?;
            Ok(id)
        })
        .await
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool: SqlitePool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

#[allow(dead_code)]
pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_to_json(body: Body) -> Result<Value> {
    let bytes = body_to_vec(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
