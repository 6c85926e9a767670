use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{debug, error};

use parley_types::api::Claims;

use crate::error::ApiError;
use crate::wire::user_from_row;
use crate::AppState;

/// Validate the bearer credential and resolve it to a user record, which
/// is injected into request extensions for the handlers.
///
/// The credential travels in a custom `token` header (not the standard
/// `Authorization: Bearer` scheme) — preserved bit-exact for the existing
/// client. Bad/missing token -> 498, token for a vanished user -> 404.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("token")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidToken)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("token rejected: {}", e);
        ApiError::InvalidToken
    })?;

    let user_id = token_data.claims.sub;
    let db_state = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db_state.db.get_user_by_id(&user_id.to_string())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    let row = row.ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    req.extensions_mut().insert(user_from_row(row)?);
    Ok(next.run(req).await)
}
