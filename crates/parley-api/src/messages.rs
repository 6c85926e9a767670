use std::collections::HashMap;

use anyhow::{Context, anyhow};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use parley_types::api::{
    AckResponse, HistoryResponse, SendMessageRequest, SendMessageResponse, SidebarResponse,
};
use parley_types::events::GatewayEvent;
use parley_types::models::{Message, User};

use crate::error::ApiError;
use crate::wire::{message_from_row, user_from_row};
use crate::AppState;

/// Everyone except the requester, plus a sparse map of unseen counts:
/// userId -> number of unseen messages from that user to the requester.
/// Zero counts are omitted. One count query per candidate — fine at this
/// scale, a known bottleneck beyond it.
pub async fn get_users_for_sidebar(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let my_id = user.id.to_string();

    let (rows, unseen) = tokio::task::spawn_blocking(move || {
        let rows = db_state.db.list_users_except(&my_id)?;

        let mut unseen: HashMap<Uuid, u64> = HashMap::new();
        for other in &rows {
            let count = db_state.db.count_unseen(&other.id, &my_id)?;
            if count > 0 {
                let other_id: Uuid = other
                    .id
                    .parse()
                    .with_context(|| format!("corrupt id '{}' on user", other.id))?;
                unseen.insert(other_id, count);
            }
        }
        Ok::<_, anyhow::Error>((rows, unseen))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    Ok(Json(SidebarResponse {
        success: true,
        users: rows
            .into_iter()
            .map(user_from_row)
            .collect::<anyhow::Result<_>>()?,
        unseen_messages: unseen,
    }))
}

/// Full conversation with the counterpart, chronological. Intentionally
/// not a pure read: opening a conversation marks every counterpart ->
/// requester message seen, clearing the unseen badge. Returned messages
/// carry the seen values as fetched.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(counterpart_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let my_id = user.id.to_string();
    let other_id = counterpart_id.to_string();

    let rows = tokio::task::spawn_blocking(move || {
        let rows = db_state.db.get_conversation(&my_id, &other_id)?;
        db_state.db.mark_conversation_seen(&other_id, &my_id)?;
        Ok::<_, anyhow::Error>(rows)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    Ok(Json(HistoryResponse {
        success: true,
        messages: rows
            .into_iter()
            .map(message_from_row)
            .collect::<anyhow::Result<_>>()?,
    }))
}

pub async fn mark_message_seen(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(_user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    tokio::task::spawn_blocking(move || db_state.db.mark_message_seen(&message_id.to_string()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??;

    Ok(Json(AckResponse { success: true }))
}

/// Persist a message, then best-effort push it to the receiver's live
/// connection. Push is at-most-once with no retry; an offline receiver
/// picks the message up on its next history fetch.
pub async fn send_message(
    State(state): State<AppState>,
    Path(receiver_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.filter(|t| !t.is_empty());
    let image = req.image.filter(|i| !i.is_empty());

    if text.is_none() && image.is_none() {
        return Err(ApiError::Validation("Message content is empty.".into()));
    }

    // Media host first: the store only ever sees the hosted URL.
    let image_url = match image {
        Some(data_uri) => {
            let media = state
                .media
                .as_ref()
                .ok_or_else(|| ApiError::Internal(anyhow!("media host not configured")))?;
            Some(media.upload(&data_uri).await?)
        }
        None => None,
    };

    let message = Message {
        id: Uuid::new_v4(),
        sender_id: user.id,
        receiver_id,
        text,
        image: image_url,
        seen: false,
        created_at: chrono::Utc::now(),
    };

    let db_state = state.clone();
    let persisted = message.clone();
    tokio::task::spawn_blocking(move || {
        if db_state
            .db
            .get_user_by_id(&persisted.receiver_id.to_string())?
            .is_none()
        {
            return Ok(false);
        }
        db_state.db.insert_message(
            &persisted.id.to_string(),
            &persisted.sender_id.to_string(),
            &persisted.receiver_id.to_string(),
            persisted.text.as_deref(),
            persisted.image.as_deref(),
            // Fixed-width RFC 3339 so lexicographic storage order stays
            // chronological.
            &persisted
                .created_at
                .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        )?;
        Ok::<_, anyhow::Error>(true)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??
    .then_some(())
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    state
        .presence
        .push(receiver_id, GatewayEvent::NewMessage(message.clone()))
        .await;

    Ok(Json(SendMessageResponse {
        success: true,
        new_message: message,
    }))
}
