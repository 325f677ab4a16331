//! Daemon mode: long-lived process holding the store and read markers.
//!
//! CHANGELOG:
//! - 10/15/2026 - Initial module structure

pub mod protocol;
pub mod server;
pub mod service;
