use axum::{extract::State, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{password, AuthenticatedUser},
    config::BOOTSTRAP_ADMIN_ROLE_ID,
    error::{AppError, AppResult},
    models::{NewSessionToken, NewUser, Role, User},
    schema::{roles, session_tokens, users},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginData {
    pub access_token: String,
    pub username: String,
    pub role: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<super::ApiResponse<()>>> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::bad_request("username is required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::bad_request("password is required"));
    }

    let mut conn = state.db()?;

    let existing = users::table
        .filter(users::username.eq(&username))
        .first::<User>(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Err(AppError::conflict("username already exists"));
    }

    // The very first account becomes the bootstrap admin; everyone after
    // gets the configured default role.
    let user_count: i64 = users::table.count().get_result(&mut conn)?;
    let role_id = if user_count == 0 {
        BOOTSTRAP_ADMIN_ROLE_ID
    } else {
        state.config.default_role_id
    };

    let password_hash = password::hash_password(&payload.password).map_err(AppError::internal)?;
    let new_user = NewUser {
        username: username.clone(),
        password_hash,
        role_id,
    };

    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        // Backstop for two concurrent registrations racing past the
        // pre-check; the unique index settles it.
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::conflict("username already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    info!(username = %username, role_id, "registered user");
    Ok(Json(super::ApiResponse::message(
        "user registered successfully",
    )))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<super::ApiResponse<LoginData>>> {
    let mut conn = state.db()?;

    // One message for unknown username and wrong password: the caller
    // must not learn which it was.
    let user = users::table
        .filter(users::username.eq(&payload.username))
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized("invalid credentials"))?;
    if !valid {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let role = roles::table
        .find(user.role_id)
        .first::<Role>(&mut conn)
        .optional()?
        .ok_or_else(|| {
            warn!(user_id = user.id, role_id = user.role_id, "user references missing role");
            AppError::internal(format!("role with id {} not found", user.role_id))
        })?;

    let access_token = state
        .jwt
        .generate_token(user.id, &user.username, role.id, &role.name)
        .map_err(AppError::internal)?;

    // Atomic insert-or-replace keyed on user id: at most one session row
    // per user, concurrent logins settle last-write-wins.
    let now = Utc::now().naive_utc();
    let new_token = NewSessionToken {
        user_id: user.id,
        token: access_token.clone(),
        issued_at: now,
    };
    diesel::insert_into(session_tokens::table)
        .values(&new_token)
        .on_conflict(session_tokens::user_id)
        .do_update()
        .set((
            session_tokens::token.eq(&access_token),
            session_tokens::issued_at.eq(now),
        ))
        .execute(&mut conn)?;

    Ok(Json(super::ApiResponse::with_data(
        "user logged in successfully",
        LoginData {
            access_token,
            username: user.username,
            role: role.name,
        },
    )))
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<super::ApiResponse<()>>> {
    let mut conn = state.db()?;

    // Revocation is by literal token value and idempotent; a token that
    // was never issued or is already revoked deletes zero rows.
    diesel::delete(session_tokens::table.filter(session_tokens::token.eq(&user.token)))
        .execute(&mut conn)?;

    Ok(Json(super::ApiResponse::message(
        "user logged out successfully",
    )))
}
