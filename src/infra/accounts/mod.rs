pub mod in_memory_sessions;
pub mod sqlite_account_store;

pub use in_memory_sessions::InMemorySessionStore;
pub use sqlite_account_store::{PoolSettings, SqliteAccountStore};
