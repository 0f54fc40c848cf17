use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use thiserror::Error;

use crate::models::{IngestionJob, NewIngestionJob};
use crate::schema::ingestion_jobs;

pub const STATUS_IN_PROGRESS: &str = "in-progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type JobResult<T> = Result<T, JobError>;

pub fn create_job(conn: &mut SqliteConnection, source: &str) -> JobResult<IngestionJob> {
    let new_job = NewIngestionJob {
        source: source.to_string(),
        status: STATUS_IN_PROGRESS.to_string(),
    };

    let job = diesel::insert_into(ingestion_jobs::table)
        .values(&new_job)
        .get_result(conn)?;
    Ok(job)
}

pub fn mark_job_completed(conn: &mut SqliteConnection, job_id: i32) -> JobResult<usize> {
    transition(conn, job_id, STATUS_COMPLETED)
}

pub fn mark_job_failed(conn: &mut SqliteConnection, job_id: i32) -> JobResult<usize> {
    transition(conn, job_id, STATUS_FAILED)
}

// Transitions are one-directional: the filter on the current status means
// a terminal row is never rewritten.
fn transition(conn: &mut SqliteConnection, job_id: i32, to: &str) -> JobResult<usize> {
    let updated = diesel::update(
        ingestion_jobs::table
            .find(job_id)
            .filter(ingestion_jobs::status.eq(STATUS_IN_PROGRESS)),
    )
    .set((
        ingestion_jobs::status.eq(to),
        ingestion_jobs::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    Ok(updated)
}

/// Full job history, newest first.
pub fn list_jobs(conn: &mut SqliteConnection) -> JobResult<Vec<IngestionJob>> {
    let jobs = ingestion_jobs::table
        .order(ingestion_jobs::id.desc())
        .load(conn)?;
    Ok(jobs)
}

/// Reconciliation pass for jobs orphaned mid-trigger (process died between
/// the create and the terminal update): anything still in-progress past the
/// cutoff is declared failed. Returns the number of rows swept.
pub fn sweep_stale_jobs(conn: &mut SqliteConnection, older_than_minutes: i64) -> JobResult<usize> {
    let cutoff = Utc::now().naive_utc() - ChronoDuration::minutes(older_than_minutes);

    let swept = diesel::update(
        ingestion_jobs::table
            .filter(ingestion_jobs::status.eq(STATUS_IN_PROGRESS))
            .filter(ingestion_jobs::created_at.lt(cutoff)),
    )
    .set((
        ingestion_jobs::status.eq(STATUS_FAILED),
        ingestion_jobs::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    Ok(swept)
}
