use sqlx::{PgPool, migrate::Migrator};
use tracing::warn;

use crate::error::StorageError;
use crate::model::chat::{ChatMessage, MessageRole, NewMessage};
use crate::model::user::{NewUser, User};

use super::now_unix_secs;

/// Compile-time discovered SQLx migrations for the `atelier-database` crate.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Durable backend shared across processes; id uniqueness comes from the
/// `BIGSERIAL` primary keys.
#[derive(Clone, Debug)]
pub(crate) struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
    name: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password: self.password,
            name: self.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    user_id: i64,
    role: String,
    content: String,
    created_at: i64,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, password, name FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(UserRow::into_user))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, password, name FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(UserRow::into_user))
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StorageError> {
        let result: Result<UserRow, sqlx::Error> = sqlx::query_as(
            "INSERT INTO users (email, password, name)
             VALUES ($1, $2, $3)
             RETURNING id, email, password, name",
        )
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into_user()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StorageError::DuplicateEmail {
                    email: new_user.email,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_recent_messages(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let rows: Vec<ChatMessageRow> = sqlx::query_as(
            "SELECT id, user_id, role, content, created_at
             FROM chat_messages
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows.into_iter().rev() {
            let Some(role) = MessageRole::parse(&row.role) else {
                warn!(message_id = row.id, role = %row.role, "skipping message with unknown role");
                continue;
            };
            out.push(ChatMessage {
                id: row.id,
                user_id: row.user_id,
                role,
                content: row.content,
                created_at: row.created_at,
            });
        }
        Ok(out)
    }

    pub async fn insert_message(&self, message: NewMessage) -> Result<ChatMessage, StorageError> {
        let created_at = now_unix_secs();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO chat_messages (user_id, role, content, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(message.user_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChatMessage {
            id,
            user_id: message.user_id,
            role: message.role,
            content: message.content,
            created_at,
        })
    }

    pub async fn clear_history(&self, user_id: i64) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM chat_messages WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
