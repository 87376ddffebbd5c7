//! Persistence for ClientHub.
//!
//! - [`Repository`]: users, credentials, sessions, clients and document
//!   metadata, with a Postgres ([`PgRepository`]) and an in-memory
//!   ([`MemoryRepository`]) implementation.
//! - [`BlobStore`]: the bucket holding uploaded files, on local disk
//!   ([`LocalBlobStore`]) or in memory ([`MemoryBlobStore`]).

pub mod blob;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore, create_blob_store, object_key};
pub use error::StoreError;
pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use repository::Repository;
