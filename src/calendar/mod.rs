pub mod error;
pub mod event;
pub mod storage;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use event::{Event, EventColor, EventDetails, Schedule};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageAdapter, DEFAULT_KEY};
pub use store::{EventStore, RecoveryPolicy, SubscriptionId};
