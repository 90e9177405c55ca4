mod memory;
mod postgres;

use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::PgPool;

use crate::error::StorageError;
use crate::model::chat::{ChatMessage, NewMessage};
use crate::model::user::{NewUser, User};
use memory::MemoryStore;
use postgres::PgStore;

pub use postgres::MIGRATOR;

/// Default window handed back to API readers.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Hard ceiling applied by both backends so a single read never pulls an
/// unbounded history.
pub const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Clone, Debug)]
enum StoreBackend {
    Memory(MemoryStore),
    Postgres(PgStore),
}

/// Persistence facade shared across crates. The backend is picked once at
/// startup (presence of a connection string); callers see identical
/// behavior from both.
#[derive(Clone, Debug)]
pub struct Storage {
    backend: StoreBackend,
}

impl Storage {
    /// Process-local store. History is lost on restart and not shared
    /// across processes.
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory(MemoryStore::new()),
        }
    }

    /// Durable store backed by an existing PostgreSQL pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            backend: StoreBackend::Postgres(PgStore::new(pool)),
        }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        match &self.backend {
            StoreBackend::Memory(store) => store.get_user(id).await,
            StoreBackend::Postgres(store) => store.get_user(id).await,
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        match &self.backend {
            StoreBackend::Memory(store) => store.get_user_by_email(email).await,
            StoreBackend::Postgres(store) => store.get_user_by_email(email).await,
        }
    }

    /// Assigns a unique id and persists the user. Fails with
    /// [`StorageError::DuplicateEmail`] when the email is already taken.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StorageError> {
        match &self.backend {
            StoreBackend::Memory(store) => store.create_user(new_user).await,
            StoreBackend::Postgres(store) => store.create_user(new_user).await,
        }
    }

    /// The `limit` most recent messages for `user_id`, oldest first. Unknown
    /// users simply have no messages. `limit` is clamped to
    /// `1..=MAX_HISTORY_LIMIT`.
    pub async fn list_recent_messages(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        match &self.backend {
            StoreBackend::Memory(store) => store.list_recent_messages(user_id, limit).await,
            StoreBackend::Postgres(store) => store.list_recent_messages(user_id, limit).await,
        }
    }

    /// Appends a message, assigning a monotonically increasing id and a
    /// creation timestamp, and returns the stored row.
    pub async fn insert_message(&self, message: NewMessage) -> Result<ChatMessage, StorageError> {
        match &self.backend {
            StoreBackend::Memory(store) => store.insert_message(message).await,
            StoreBackend::Postgres(store) => store.insert_message(message).await,
        }
    }

    /// Removes every message for `user_id`. Clearing an empty history is a
    /// silent success.
    pub async fn clear_history(&self, user_id: i64) -> Result<(), StorageError> {
        match &self.backend {
            StoreBackend::Memory(store) => store.clear_history(user_id).await,
            StoreBackend::Postgres(store) => store.clear_history(user_id).await,
        }
    }
}

pub(crate) fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chat::MessageRole;

    fn message(user_id: i64, role: MessageRole, content: &str) -> NewMessage {
        NewMessage {
            user_id,
            role,
            content: content.to_owned(),
        }
    }

    fn user(email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            password: "hashed".to_owned(),
            name: "Test User".to_owned(),
        }
    }

    #[tokio::test]
    async fn inserted_message_is_immediately_readable() {
        let store = Storage::memory();
        let stored = store
            .insert_message(message(1, MessageRole::User, "hello"))
            .await
            .unwrap();

        let recent = store.list_recent_messages(1, 1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, stored.id);
        assert_eq!(recent[0].content, "hello");
        assert_eq!(recent[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first() {
        let store = Storage::memory();
        for i in 0..5 {
            store
                .insert_message(message(7, MessageRole::User, &format!("turn {i}")))
                .await
                .unwrap();
        }

        let recent = store.list_recent_messages(7, 50).await.unwrap();
        assert_eq!(recent.len(), 5);
        for pair in recent.windows(2) {
            assert!(
                (pair[0].created_at, pair[0].id) <= (pair[1].created_at, pair[1].id),
                "messages out of order: {pair:?}"
            );
        }
        assert_eq!(recent[0].content, "turn 0");
        assert_eq!(recent[4].content, "turn 4");
    }

    #[tokio::test]
    async fn limit_returns_only_the_most_recent() {
        let store = Storage::memory();
        for i in 0..100 {
            store
                .insert_message(message(3, MessageRole::User, &format!("m{i}")))
                .await
                .unwrap();
        }

        let recent = store.list_recent_messages(3, 20).await.unwrap();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].content, "m80");
        assert_eq!(recent[19].content, "m99");
    }

    #[tokio::test]
    async fn unknown_user_has_empty_history() {
        let store = Storage::memory();
        let recent = store.list_recent_messages(999, 50).await.unwrap();
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn clear_history_removes_only_that_user() {
        let store = Storage::memory();
        store
            .insert_message(message(1, MessageRole::User, "mine"))
            .await
            .unwrap();
        store
            .insert_message(message(2, MessageRole::User, "theirs"))
            .await
            .unwrap();

        store.clear_history(1).await.unwrap();

        assert!(store.list_recent_messages(1, 50).await.unwrap().is_empty());
        assert_eq!(store.list_recent_messages(2, 50).await.unwrap().len(), 1);

        // Clearing an already-empty history succeeds silently.
        store.clear_history(1).await.unwrap();
    }

    #[tokio::test]
    async fn message_ids_are_unique_and_increasing() {
        let store = Storage::memory();
        let first = store
            .insert_message(message(1, MessageRole::User, "a"))
            .await
            .unwrap();
        let second = store
            .insert_message(message(1, MessageRole::Assistant, "b"))
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn create_user_assigns_ids_and_enforces_unique_email() {
        let store = Storage::memory();
        let alice = store.create_user(user("alice@example.com")).await.unwrap();
        let bob = store.create_user(user("bob@example.com")).await.unwrap();
        assert_ne!(alice.id, bob.id);

        let err = store
            .create_user(user("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEmail { ref email } if email == "alice@example.com"));
    }

    #[tokio::test]
    async fn user_lookups_return_absent_without_error() {
        let store = Storage::memory();
        assert!(store.get_user(42).await.unwrap().is_none());
        assert!(
            store
                .get_user_by_email("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );

        let created = store.create_user(user("carol@example.com")).await.unwrap();
        let by_id = store.get_user(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "carol@example.com");
        let by_email = store
            .get_user_by_email("carol@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[test]
    fn chat_message_serializes_with_camel_case_fields() {
        let msg = ChatMessage {
            id: 1,
            user_id: 2,
            role: MessageRole::Assistant,
            content: "hi".to_owned(),
            created_at: 1700000000,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["userId"], 2);
        assert_eq!(json["createdAt"], 1700000000);
        assert_eq!(json["role"], "assistant");
    }
}
