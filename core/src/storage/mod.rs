mod database;
mod kv;
mod live;
mod note_store;

pub use database::{Connection, Database, SqliteStorage};
pub use kv::{KeyValueStore, MemoryStorage};
pub use live::{LiveQuery, SubscriptionId};
pub use note_store::{
    Clock, CollectionStatus, NoteStore, Summary, SystemClock, DEFAULT_STORAGE_KEY,
};
