//! Record store backends for Burrow.
//!
//! Timestamps are persisted as microseconds since the Unix epoch by the
//! Redis and MySQL backends.

pub mod memory;
pub mod mysql;
pub mod redis;
pub mod sweeper;
pub mod timeout;

pub use burrow_core::StorageError;
pub use memory::InMemoryRecordStore;
pub use mysql::MySqlRecordStore;
pub use self::redis::RedisRecordStore;
pub use sweeper::ExpirySweeper;
pub use timeout::StoreTimeouts;
