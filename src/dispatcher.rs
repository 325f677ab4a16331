//! Command dispatcher: send a message to a chat by id.
//!
//! CHANGELOG:
//! - 10/13/2026 - Initial implementation

use tracing::{info, warn};

use crate::accessor::StoreAccessor;
use crate::store::Store;

/// Send `content` to the first chat whose id matches.
///
/// Returns `false` when no chat matches. A failure inside the store's send
/// action is logged but not reflected in the return value, and nothing is
/// retried.
pub async fn send_message<S: Store + ?Sized>(
    accessor: &StoreAccessor<S>,
    chat_id: &str,
    content: &str,
) -> bool {
    let Some(chat) = accessor.find_chat(chat_id) else {
        info!(chat = chat_id, "send skipped: no such chat");
        return false;
    };

    if let Err(e) = accessor.store().send_message(&chat.id, content).await {
        warn!(chat = chat_id, error = %e, "send action failed");
    }
    true
}
