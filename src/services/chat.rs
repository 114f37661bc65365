//! 1:1 chat relay — persist, then broadcast to the room topic.
//!
//! Chat carries no concurrent in-memory state of its own: it is a
//! collaborator of the publish gateway. A `chat.send` resolves the sender,
//! inserts the message row, and echoes the stored payload (with the
//! server-side `sent_at`) to everyone subscribed to the room's topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::hub::Publisher;
use crate::services::profile::{ProfileError, ProfileStore};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("unknown sender: {0}")]
    UnknownSender(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Inbound `chat.send` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub chat_room_id: i64,
    pub sender_id: Uuid,
    pub content: String,
}

/// Stored message as echoed to the room topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub chat_room_id: i64,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Broadcast destination for one chat room.
#[must_use]
pub fn room_topic(chat_room_id: i64) -> String {
    format!("/topic/chat/{chat_room_id}")
}

/// Persist a chat message and broadcast the echo to the room topic.
///
/// # Errors
///
/// [`ChatError::UnknownSender`] if the sender has no profile;
/// [`ChatError::Database`] if the insert fails (including an unknown room —
/// the foreign key rejects it). Nothing is published on any error path.
pub async fn send_message(
    pool: &PgPool,
    profiles: &dyn ProfileStore,
    publisher: &dyn Publisher,
    req: &ChatMessageRequest,
) -> Result<ChatMessagePayload, ChatError> {
    let sender_name = profiles
        .display_name(req.sender_id)
        .await?
        .ok_or(ChatError::UnknownSender(req.sender_id))?;

    let sent_at = Utc::now();
    sqlx::query(
        "INSERT INTO chat_messages (chat_room_id, sender_id, content, sent_at, is_read) \
         VALUES ($1, $2, $3, $4, FALSE)",
    )
    .bind(req.chat_room_id)
    .bind(req.sender_id)
    .bind(&req.content)
    .bind(sent_at)
    .execute(pool)
    .await?;

    let echo = ChatMessagePayload {
        chat_room_id: req.chat_room_id,
        sender_id: req.sender_id,
        content: req.content.clone(),
        sent_at,
    };
    publisher.publish(
        &room_topic(req.chat_room_id),
        &serde_json::to_value(&echo).unwrap_or_default(),
    );

    info!(sender = %sender_name, room = req.chat_room_id, "chat message relayed");
    Ok(echo)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
