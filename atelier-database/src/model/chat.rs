use serde::{Deserialize, Serialize};

/// Who authored a chat turn. Alternation between the two is a convention of
/// the chat flow, not something the store enforces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One persisted conversation turn. Rows are append-only; the only deletion
/// path is a bulk history clear.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub role: MessageRole,
    pub content: String,
    /// Unix seconds at insertion time. Messages for a user are totally
    /// ordered by `(created_at, id)`.
    pub created_at: i64,
}

/// Caller-supplied fields for a new message; the store assigns the id and
/// timestamp.
#[derive(Clone, Debug)]
pub struct NewMessage {
    pub user_id: i64,
    pub role: MessageRole,
    pub content: String,
}
