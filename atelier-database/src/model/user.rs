use serde::{Deserialize, Serialize};

/// Account record owned by the authentication layer. Immutable after
/// creation as far as this crate is concerned.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Already hashed by the time it reaches the store.
    pub password: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}
