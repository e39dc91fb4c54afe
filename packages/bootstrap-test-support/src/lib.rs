//! Test support for the database bootstrap
//!
//! Provides an in-memory fake database server that implements the admin
//! session seam, plus unified logging initialization for test binaries.

pub mod fake_server;
pub mod logging;

pub use fake_server::{FakeServer, FakeSession};
