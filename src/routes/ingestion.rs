use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::jobs;
use crate::models::IngestionJob;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TriggerRequest {
    pub source: String,
}

#[derive(Serialize)]
pub struct TriggerData {
    pub message: String,
    #[serde(rename = "ingestionId")]
    pub ingestion_id: i32,
    pub status: String,
}

pub async fn list_ingestions(
    State(state): State<AppState>,
) -> AppResult<Json<super::ApiResponse<Vec<IngestionJob>>>> {
    let mut conn = state.db()?;
    let all_jobs = jobs::list_jobs(&mut conn).map_err(AppError::internal)?;

    Ok(Json(super::ApiResponse::with_data(
        "ingestion list fetched successfully",
        all_jobs,
    )))
}

pub async fn trigger_ingestion(
    State(state): State<AppState>,
    Json(payload): Json<TriggerRequest>,
) -> AppResult<Json<super::ApiResponse<TriggerData>>> {
    let source = payload.source.trim();
    if source.is_empty() {
        return Err(AppError::bad_request("source is required"));
    }

    // The connection is not held across the processor call; the job row
    // is persisted before the upstream request goes out.
    let job = {
        let mut conn = state.db()?;
        jobs::create_job(&mut conn, source).map_err(AppError::internal)?
    };

    match state.processor.process(source).await {
        Ok(_) => {
            let mut conn = state.db()?;
            jobs::mark_job_completed(&mut conn, job.id).map_err(AppError::internal)?;

            info!(job_id = job.id, source = %job.source, "ingestion completed");
            Ok(Json(super::ApiResponse::with_data(
                "ingestion triggered successfully",
                TriggerData {
                    message: "Ingestion triggered successfully".to_string(),
                    ingestion_id: job.id,
                    status: jobs::STATUS_COMPLETED.to_string(),
                },
            )))
        }
        Err(err) => {
            // The row must reach `failed` before the error surfaces.
            let mut conn = state.db()?;
            jobs::mark_job_failed(&mut conn, job.id).map_err(AppError::internal)?;

            warn!(job_id = job.id, source = %job.source, error = %err, "ingestion failed");
            Err(AppError::upstream(err.message, err.payload))
        }
    }
}
