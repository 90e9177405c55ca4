use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;
use crate::model::chat::{ChatMessage, NewMessage};
use crate::model::user::{NewUser, User};

use super::now_unix_secs;

#[derive(Debug)]
struct MemoryInner {
    users: HashMap<i64, User>,
    messages: Vec<ChatMessage>,
    next_user_id: i64,
    next_message_id: i64,
}

/// Process-local backend. The mutex serializes writers, which is what makes
/// id assignment atomic here.
#[derive(Clone, Debug)]
pub(crate) struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                users: HashMap::new(),
                messages: Vec::new(),
                next_user_id: 1,
                next_message_id: 1,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StorageError> {
        let mut inner = self.lock();
        if inner.users.values().any(|user| user.email == new_user.email) {
            return Err(StorageError::DuplicateEmail {
                email: new_user.email,
            });
        }

        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let user = User {
            id,
            email: new_user.email,
            password: new_user.password,
            name: new_user.name,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn list_recent_messages(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let inner = self.lock();
        let matching: Vec<&ChatMessage> = inner
            .messages
            .iter()
            .filter(|message| message.user_id == user_id)
            .collect();
        let skip = matching.len().saturating_sub(limit as usize);
        Ok(matching.into_iter().skip(skip).cloned().collect())
    }

    pub async fn insert_message(&self, message: NewMessage) -> Result<ChatMessage, StorageError> {
        let mut inner = self.lock();
        let id = inner.next_message_id;
        inner.next_message_id += 1;
        let stored = ChatMessage {
            id,
            user_id: message.user_id,
            role: message.role,
            content: message.content,
            created_at: now_unix_secs(),
        };
        inner.messages.push(stored.clone());
        Ok(stored)
    }

    pub async fn clear_history(&self, user_id: i64) -> Result<(), StorageError> {
        self.lock()
            .messages
            .retain(|message| message.user_id != user_id);
        Ok(())
    }
}
