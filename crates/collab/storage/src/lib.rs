//! Record store for programs and their collaboration rows.
//!
//! The traits in [`traits`] are the contract the service layer depends on.
//! Two adapters ship with the crate:
//!
//! - [`InMemoryCollabStorage`] for development and tests
//! - `PostgresCollabStorage` (feature `postgres`) as the durable source of truth
//!
//! Writes go through [`AggregateStore::commit_aggregate`], a compare-and-swap
//! on the program version that persists the program and its changed rows as
//! one unit.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod model;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryCollabStorage;
pub use model::{AggregateCommit, ProgramAggregate};
#[cfg(feature = "postgres")]
pub use postgres::PostgresCollabStorage;
pub use traits::{AdminDirectory, AggregateStore, CollabStorage, CollaborationStore, ProgramStore};
