//! wolfies-whatsapp library
//!
//! Query/command gateway over a WhatsApp-style client store: contact and
//! chat lookups, staleness-aware group metadata, unread extraction with
//! read markers, and sending.
//!
//! CHANGELOG:
//! - 10/16/2026 - Daemon and config modules
//! - 10/12/2026 - Initial library structure

pub mod accessor;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod metadata;
pub mod normalize;
pub mod output;
pub mod store;

pub use error::{Error, RecordKind, Result};
pub use gateway::Gateway;
