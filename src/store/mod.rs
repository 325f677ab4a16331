//! Client store abstraction.
//!
//! The store is owned by the host application; this crate only reads it,
//! flips per-message unread flags, triggers metadata refreshes and sends.
//!
//! CHANGELOG:
//! - 10/13/2026 - Added mark_read as the single commit point for unread flags
//! - 10/12/2026 - Initial module structure

pub mod memory;
pub mod records;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use records::{Chat, Contact, GroupMetadata, Message, MessageKey, Participant};

/// Failures reported by the underlying store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Group metadata refresh failed for {id}: {reason}")]
    Refresh { id: String, reason: String },

    #[error("Send to {chat_id} failed: {reason}")]
    Send { chat_id: String, reason: String },
}

/// Operations the host store must expose.
///
/// Collection getters return snapshots; callers scan them linearly.
#[async_trait]
pub trait Store: Send + Sync {
    /// All contacts, in store order.
    fn contacts(&self) -> Vec<Contact>;

    /// All chat headers, in store order.
    fn chats(&self) -> Vec<Chat>;

    /// All group metadata records, in store order.
    fn group_metadata(&self) -> Vec<GroupMetadata>;

    /// Message log of a chat, oldest first. `None` if the chat is unknown.
    fn messages(&self, chat_id: &str) -> Option<Vec<Message>>;

    /// Transition a message from new to read.
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// concurrent callers can never both deliver the same message.
    fn mark_read(&self, chat_id: &str, key: &MessageKey) -> bool;

    /// Refresh a group's metadata and clear its stale flag.
    async fn refresh_group_metadata(&self, id: &str) -> Result<(), StoreError>;

    /// Hand a message to the chat's send action.
    async fn send_message(&self, chat_id: &str, content: &str) -> Result<(), StoreError>;
}
