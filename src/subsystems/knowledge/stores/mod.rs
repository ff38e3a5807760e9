//! Document store implementations.

#[cfg(feature = "isqlite")]
pub mod sqlite;
pub mod tmp;
