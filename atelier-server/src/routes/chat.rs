//! Chat endpoints: history retrieval, message send, history clear.

use atelier_core::Data;
use atelier_database::model::chat::{ChatMessage, MessageRole, NewMessage};
use atelier_database::store::DEFAULT_HISTORY_LIMIT;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::CurrentUser;
use crate::error::ServerError;

/// Most recent turns handed to the generator for continuity.
const CONTEXT_LIMIT: u32 = 20;

pub fn router() -> Router<Data> {
    Router::new()
        .route(
            "/api/chat/messages",
            get(list_messages).delete(clear_messages),
        )
        .route("/api/chat/message", post(send_message))
}

/// `GET /api/chat/messages` — the authenticated user's recent history,
/// oldest first.
async fn list_messages(
    State(data): State<Data>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<ChatMessage>>, ServerError> {
    let messages = data
        .db
        .list_recent_messages(user_id, DEFAULT_HISTORY_LIMIT)
        .await?;
    Ok(Json(messages))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    user_message: ChatMessage,
    ai_message: ChatMessage,
}

/// `POST /api/chat/message` — persist the user turn, generate a reply with
/// bounded history as context, persist and return both records.
async fn send_message(
    State(data): State<Data>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<Value>,
) -> Result<Json<SendMessageResponse>, ServerError> {
    let content = body
        .get("content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Message content is required".to_owned()))?
        .to_owned();

    // The user turn is committed before generation; a provider failure
    // leaves it behind as an unanswered turn.
    let user_message = data
        .db
        .insert_message(NewMessage {
            user_id,
            role: MessageRole::User,
            content: content.clone(),
        })
        .await?;

    let mut history = data.db.list_recent_messages(user_id, CONTEXT_LIMIT).await?;
    // The generator appends the new message itself as the final turn, so it
    // must not also appear in the transcript.
    history.retain(|message| message.id != user_message.id);

    debug!(user_id, history_len = history.len(), "generating chat reply");
    let reply = data.llm.generate(&content, &history).await?;

    let ai_message = data
        .db
        .insert_message(NewMessage {
            user_id,
            role: MessageRole::Assistant,
            content: reply,
        })
        .await?;

    Ok(Json(SendMessageResponse {
        user_message,
        ai_message,
    }))
}

/// `DELETE /api/chat/messages` — wipe the authenticated user's history.
async fn clear_messages(
    State(data): State<Data>,
    CurrentUser(user_id): CurrentUser,
) -> Result<(), ServerError> {
    data.db.clear_history(user_id).await?;
    Ok(())
}
