//! Storage module for database, configuration, and uploaded objects.

pub mod config;
pub mod database;
pub mod object_store;
pub mod page;
pub mod schema;
pub mod upload;

pub use config::{AppConfig, ConfigError};
pub use database::{Database, DatabaseError};
pub use object_store::{FsObjectStore, MemoryObjectStore, ObjectStore, StorageError};
pub use page::{Page, PageMeta, PageRequest};
pub use upload::{UploadPolicy, UploadedFile};
