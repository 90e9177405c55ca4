pub mod sessions;

use std::sync::Arc;

use atelier_database::Storage;
use atelier_llm::ResponseGenerator;

pub use sessions::Sessions;

/// State shared by every request handler.
#[derive(Clone)]
pub struct Data {
    pub db: Storage,
    pub llm: Arc<dyn ResponseGenerator>,
    pub sessions: Sessions,
}
