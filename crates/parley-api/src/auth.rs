use anyhow::{Context, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use parley_types::api::{
    AuthResponse, CheckAuthResponse, Claims, LoginRequest, SignupRequest, UpdateProfileRequest,
};
use parley_types::models::User;

use crate::error::ApiError;
use crate::wire::user_from_row;
use crate::AppState;

const TOKEN_LIFETIME_DAYS: i64 = 180;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty()
        || req.email.trim().is_empty()
        || req.password.trim().is_empty()
    {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let user_id = Uuid::new_v4();

    // Hash with Argon2id before touching the store
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let db_state = state.clone();
    let email = req.email.clone();
    let username = req.username.clone();
    let bio = req.bio.clone();
    let row = tokio::task::spawn_blocking(move || {
        if db_state.db.get_user_by_email(&email)?.is_some() {
            return Ok(None);
        }
        db_state.db.create_user(
            &user_id.to_string(),
            &email,
            &username,
            &password_hash,
            bio.as_deref(),
        )?;
        db_state.db.get_user_by_id(&user_id.to_string())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    let row = row.ok_or_else(|| ApiError::Validation("User already exists".into()))?;
    let user = user_from_row(row)?;

    let token = create_token(&state.jwt_secret, user.id)?;
    info!("user {} signed up", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user_data: user,
            token,
            message: "User created successfully".into(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let db_state = state.clone();
    let email = req.email.clone();
    let row = tokio::task::spawn_blocking(move || db_state.db.get_user_by_email(&email))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??
        .ok_or_else(|| ApiError::Validation("User not found with this email".into()))?;

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Internal(anyhow!("corrupt password hash: {}", e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Validation("Invalid password".into()))?;

    let user = user_from_row(row)?;
    let token = create_token(&state.jwt_secret, user.id)?;
    info!("user {} logged in", user.id);

    Ok(Json(AuthResponse {
        success: true,
        user_data: user,
        token,
        message: "Logged in successfully".into(),
    }))
}

/// The middleware already resolved the token to a user; just echo it.
pub async fn check(Extension(user): Extension<User>) -> Json<CheckAuthResponse> {
    Json(CheckAuthResponse {
        success: true,
        user,
    })
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // A data URI goes to the media host first; only the hosted URL is stored.
    let profile_pic_url = match req.profile_pic.as_deref().filter(|p| !p.is_empty()) {
        Some(data_uri) => {
            let media = state
                .media
                .as_ref()
                .ok_or_else(|| ApiError::Internal(anyhow!("media host not configured")))?;
            Some(media.upload(data_uri).await?)
        }
        None => None,
    };

    let db_state = state.clone();
    let user_id = user.id.to_string();
    let username = req.username.clone();
    let bio = req.bio.clone();
    let row = tokio::task::spawn_blocking(move || {
        db_state.db.update_profile(
            &user_id,
            username.as_deref(),
            bio.as_deref(),
            profile_pic_url.as_deref(),
        )
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(CheckAuthResponse {
        success: true,
        user: user_from_row(row)?,
    }))
}

pub(crate) fn create_token(secret: &str, user_id: Uuid) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp()
            as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("token signing failed")
    .map_err(ApiError::Internal)
}
