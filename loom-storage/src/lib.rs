//! Typed key-value storage for the design session engine (§4.1).
//!
//! This crate is deliberately free of business logic: it knows the
//! keyspace layout, how to serialize records into it, and how to fail
//! closed on storage errors. `loom-context` and `loom-session` build the
//! invariants (version monotonicity, content hashing, compaction) on top.

pub mod keyspace;
pub mod memory_store;
pub mod redis_store;
pub mod store;

pub use memory_store::InMemoryStateStore;
pub use redis_store::RedisStateStore;
pub use store::StateStore;
