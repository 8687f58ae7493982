//! Storage layer for buildsync
//!
//! Persists one record per scheduled project, plus the repository access
//! token.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod traits;

pub use memory::InMemoryStorage;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStorage;
pub use traits::{ProjectStorage, SecretStorage, Storage};
