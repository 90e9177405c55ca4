pub mod chat;

use atelier_core::Data;
use axum::Router;

pub fn router() -> Router<Data> {
    Router::new().merge(chat::router())
}
