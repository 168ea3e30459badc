//! Handlers for the `/user` resource (signup, login, profile, profile edit).

use std::sync::LazyLock;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use clipstudio_core::delegate::integer_value;
use clipstudio_core::error::CoreError;
use clipstudio_db::models::user::{CreateUser, UpdateUser, UserResponse};
use clipstudio_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Single 401 message for every login failure.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Verified against when the email is unknown so both failures cost one
/// Argon2 verification.
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("clipstudio-login-placeholder").ok());

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /user/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /user/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `PUT /user/modifyUser`.
///
/// `id` must match the caller; it arrives as a number or a numeric string.
#[derive(Debug, Deserialize)]
pub struct ModifyUserRequest {
    #[serde(default)]
    pub id: serde_json::Value,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyUserResponse {
    pub message: &'static str,
    pub updated_user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /user/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let username = input.username.trim();
    let email = input.email.trim();
    if username.is_empty() || email.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username and email are required".into(),
        )));
    }
    validate_password_strength(&input.password, state.config.password_min_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // Unique violations surface as 409 through `classify_sqlx_error`.
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User added",
        }),
    ))
}

/// POST /user/login
///
/// Looks the account up by email and returns a bearer token on success.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_email(&state.pool, input.email.trim()).await?;

    let Some(user) = user else {
        if let Some(dummy) = DUMMY_PASSWORD_HASH.as_deref() {
            let _ = verify_password(&input.password, dummy);
        }
        tracing::info!("Rejected login for unknown email");
        return Err(invalid_credentials());
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    let token = generate_access_token(user.id, &user.username, &user.email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
    }))
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into()))
}

/// GET /user/profile
pub async fn profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ProfileResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        message: "User found",
    }))
}

/// PUT /user/modifyUser
///
/// Updates the caller's username and/or email. Empty strings are treated as
/// absent; the password hash is never touched.
pub async fn modify_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ModifyUserRequest>,
) -> AppResult<Json<ModifyUserResponse>> {
    let id = integer_value(&input.id)
        .ok_or_else(|| AppError::Core(CoreError::Validation("User ID is required".into())))?;
    if id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden("Access denied".into())));
    }

    let changes = UpdateUser {
        username: non_empty(input.username),
        email: non_empty(input.email),
    };

    if let Some(username) = &changes.username {
        if let Some(existing) = UserRepo::find_by_username(&state.pool, username).await? {
            if existing.id != id {
                return Err(AppError::Core(CoreError::Conflict(
                    "Username is already in use".into(),
                )));
            }
        }
    }
    if let Some(email) = &changes.email {
        if let Some(existing) = UserRepo::find_by_email(&state.pool, email).await? {
            if existing.id != id {
                return Err(AppError::Core(CoreError::Conflict(
                    "Email is already in use".into(),
                )));
            }
        }
    }

    if changes.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "No valid fields provided for update.".into(),
        )));
    }

    let updated = UserRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(user_id = id, "User profile updated");
    Ok(Json(ModifyUserResponse {
        message: "User updated successfully",
        updated_user: updated.into(),
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
