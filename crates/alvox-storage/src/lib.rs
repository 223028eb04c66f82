//! # alvox-storage
//!
//! SQLite persistence for the selection engine: per-cloud label masks
//! (bit-packed), per-round selections (little-endian `u32` index blobs),
//! round metadata, and metric statistics as JSON.
//!
//! Writes go through one serialized connection. A round is recorded in a
//! single `BEGIN IMMEDIATE` transaction, so a crash never leaves a
//! selection without its masks.

pub mod codec;
pub mod connection;
pub mod migrations;
pub mod queries;
pub mod store;

pub use connection::DatabaseManager;
pub use store::SqliteMaskStore;
