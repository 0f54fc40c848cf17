use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Document, NewDocument};
use crate::schema::documents;
use crate::state::AppState;
use crate::storage::StoredFile;

pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.iter().any(|allowed| *allowed == mime)
}

struct UploadedFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    file: Option<UploadedFile>,
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("title") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid title field: {err}")))?;
                form.title = Some(value);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid file field: {err}")))?;

                if !is_allowed_mime(&mime) {
                    return Err(AppError::bad_request(
                        "only pdf, jpeg and png files are allowed",
                    ));
                }
                if bytes.len() > MAX_FILE_BYTES {
                    return Err(AppError::bad_request("file exceeds the 5MB size limit"));
                }

                form.file = Some(UploadedFile {
                    name,
                    mime,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// What listings expose; the audit-update fields stay internal.
#[derive(Debug, Queryable, Serialize)]
pub struct DocumentSummary {
    pub id: i32,
    pub title: String,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_on: NaiveDateTime,
    pub active: bool,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = documents)]
struct DocumentChangeset {
    title: Option<String>,
    file_path: Option<String>,
    file_name: Option<String>,
    mime_type: Option<String>,
    size_bytes: Option<i64>,
    updated_by: Option<i32>,
    updated_on: Option<NaiveDateTime>,
}

/// Loads a document by id regardless of the active flag: soft-deleted
/// rows stay individually addressable.
fn find_document(conn: &mut SqliteConnection, id: i32) -> AppResult<Document> {
    documents::table
        .find(id)
        .first::<Document>(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("document with id {id} not found")))
}

pub async fn create_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<super::ApiResponse<()>>)> {
    let form = read_upload_form(multipart).await?;

    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("title is required"))?
        .to_string();
    let file = form
        .file
        .ok_or_else(|| AppError::bad_request("file is required"))?;

    let stored: StoredFile = state.store.save(&file.name, file.bytes).await?;

    let new_document = NewDocument {
        title,
        file_path: Some(stored.path),
        file_name: Some(file.name),
        mime_type: Some(file.mime),
        size_bytes: Some(stored.size_bytes),
        created_by: Some(user.user_id),
    };

    let mut conn = state.db()?;
    let document: Document = diesel::insert_into(documents::table)
        .values(&new_document)
        .get_result(&mut conn)?;

    info!(
        document_id = document.id,
        created_by = user.user_id,
        "uploaded document"
    );
    Ok((
        StatusCode::CREATED,
        Json(super::ApiResponse::message(
            "document uploaded successfully",
        )),
    ))
}

pub async fn list_documents(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<super::ApiResponse<Vec<DocumentSummary>>>> {
    let mut conn = state.db()?;

    // Soft-deleted documents are excluded here but remain reachable via
    // find_document. Newest first.
    let rows: Vec<DocumentSummary> = documents::table
        .filter(documents::active.eq(true))
        .select((
            documents::id,
            documents::title,
            documents::file_path,
            documents::file_name,
            documents::mime_type,
            documents::size_bytes,
            documents::created_on,
            documents::active,
        ))
        .order(documents::id.desc())
        .load(&mut conn)?;

    Ok(Json(super::ApiResponse::with_data(
        "document list fetched successfully",
        rows,
    )))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<Json<super::ApiResponse<()>>> {
    let form = read_upload_form(multipart).await?;

    let mut changeset = DocumentChangeset {
        updated_by: Some(user.user_id),
        updated_on: Some(Utc::now().naive_utc()),
        ..DocumentChangeset::default()
    };

    if let Some(title) = form.title {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        changeset.title = Some(trimmed.to_string());
    }

    if let Some(file) = form.file {
        let stored = state.store.save(&file.name, file.bytes).await?;
        changeset.file_path = Some(stored.path);
        changeset.file_name = Some(file.name);
        changeset.mime_type = Some(file.mime);
        changeset.size_bytes = Some(stored.size_bytes);
    }

    let mut conn = state.db()?;
    let document = find_document(&mut conn, id)?;

    diesel::update(documents::table.find(document.id))
        .set(&changeset)
        .execute(&mut conn)?;

    Ok(Json(super::ApiResponse::message(
        "document updated successfully",
    )))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    user: AuthenticatedUser,
) -> AppResult<Json<super::ApiResponse<()>>> {
    let mut conn = state.db()?;
    let document = find_document(&mut conn, id)?;

    // Soft delete only; no row in this table is ever physically removed.
    diesel::update(documents::table.find(document.id))
        .set((
            documents::active.eq(false),
            documents::updated_by.eq(user.user_id),
            documents::updated_on.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    info!(document_id = id, deleted_by = user.user_id, "soft-deleted document");
    Ok(Json(super::ApiResponse::message(
        "document deleted successfully",
    )))
}
