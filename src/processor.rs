use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;

/// The external service ingestion work is delegated to. One blocking
/// call, no retries: a single failed attempt is terminal for the job.
#[async_trait]
pub trait IngestionProcessor: Send + Sync + 'static {
    async fn process(&self, source: &str) -> Result<Value, ProcessorError>;
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessorError {
    pub message: String,
    /// The upstream response body, when one was readable.
    pub payload: Option<Value>,
}

pub struct HttpProcessor {
    client: Client,
    endpoint: String,
}

impl HttpProcessor {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.processor_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.processor_url.clone(),
        })
    }
}

#[async_trait]
impl IngestionProcessor for HttpProcessor {
    async fn process(&self, source: &str) -> Result<Value, ProcessorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "source": source }))
            .send()
            .await
            .map_err(|err| ProcessorError {
                message: format!("processor request failed: {err}"),
                payload: None,
            })?;

        let status = response.status();
        if status.is_success() {
            // The success payload shape is up to the processor.
            Ok(response.json().await.unwrap_or(Value::Null))
        } else {
            let payload = response.json::<Value>().await.ok();
            Err(ProcessorError {
                message: format!("processor returned status {status}"),
                payload,
            })
        }
    }
}
