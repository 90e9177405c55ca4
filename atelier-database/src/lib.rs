pub mod error;
pub mod model;
pub mod store;

pub use error::StorageError;
pub use store::{DEFAULT_HISTORY_LIMIT, MIGRATOR, Storage};
