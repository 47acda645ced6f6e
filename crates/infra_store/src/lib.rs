//! Storage Infrastructure
//!
//! Adapters implementing the submission store port: an in-memory store for
//! tests and embedded use, and a PostgreSQL store that keeps structured key
//! columns alongside opaque JSONB documents (the raw envelope audit trail).

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use pool::create_pool;
pub use postgres::PostgresStore;
