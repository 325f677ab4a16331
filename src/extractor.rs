//! Unread message extraction and read markers.
//!
//! The extractor walks each chat log newest-first and stops at the first
//! message already read: unread messages are contiguous at the tail of an
//! append-only log. Qualifying messages are committed read through
//! `Store::mark_read`, and only the caller that wins that commit delivers
//! the message.
//!
//! CHANGELOG:
//! - 10/15/2026 - Single-chat extraction variant
//! - 10/14/2026 - Read markers keyed by chat id for unnamed chats
//! - 10/13/2026 - Initial implementation

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

use crate::accessor::StoreAccessor;
use crate::error::{Error, RecordKind, Result};
use crate::normalize::{serialize_chat, serialize_raw, Record};
use crate::store::{Chat, Store};

/// Last-extraction time per chat, in Unix seconds.
///
/// Lives as long as the process. Entries are overwritten, never removed,
/// and never persisted.
#[derive(Debug, Default)]
pub struct ReadMarkers {
    inner: Mutex<HashMap<String, i64>>,
}

impl ReadMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `now` for a chat.
    pub fn touch(&self, chat: &Chat) -> i64 {
        let now = chrono::Utc::now().timestamp();
        self.lock().insert(Self::key(chat), now);
        now
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.lock().get(key).copied()
    }

    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.lock().clone()
    }

    /// Display name, falling back to the chat id for unnamed chats.
    pub fn key(chat: &Chat) -> String {
        chat.display_name().unwrap_or(&chat.id).to_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, i64>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A chat with the messages extracted from it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub chat: Record,
    pub messages: Vec<Record>,
}

/// Extracts unread messages and maintains read markers.
pub struct UnreadExtractor<S: ?Sized> {
    accessor: StoreAccessor<S>,
    markers: Arc<ReadMarkers>,
}

impl<S: Store + ?Sized> UnreadExtractor<S> {
    pub fn new(accessor: StoreAccessor<S>, markers: Arc<ReadMarkers>) -> Self {
        Self { accessor, markers }
    }

    pub fn markers(&self) -> &Arc<ReadMarkers> {
        &self.markers
    }

    /// Extract unread messages from every chat. Chats with none are omitted.
    pub fn extract_unread(&self) -> Vec<ChatWithMessages> {
        let output: Vec<ChatWithMessages> = self
            .accessor
            .list_chats()
            .iter()
            .filter_map(|chat| self.extract_chat(chat))
            .collect();

        debug!(chats = output.len(), "unread extraction finished");
        output
    }

    /// Extract unread messages from one chat.
    pub fn extract_unread_in_chat(&self, id: &str) -> Result<Option<ChatWithMessages>> {
        let chat = self.accessor.get_chat(id)?;
        Ok(self.extract_chat(&chat))
    }

    /// Every message in log order, without touching unread flags.
    ///
    /// Notifications are dropped; own messages are dropped unless `include_me`.
    pub fn get_all_messages_in_chat(&self, id: &str, include_me: bool) -> Result<Vec<Record>> {
        let chat = self.accessor.get_chat(id)?;
        let messages = self
            .accessor
            .store()
            .messages(id)
            .ok_or_else(|| Error::not_found(RecordKind::Chat, id))?;

        let output = messages
            .iter()
            .filter(|m| !m.is_notification)
            .filter(|m| include_me || !m.id.from_me)
            .map(serialize_raw)
            .collect();

        self.markers.touch(&chat);
        Ok(output)
    }

    fn extract_chat(&self, chat: &Chat) -> Option<ChatWithMessages> {
        let store = self.accessor.store();
        let log = store.messages(&chat.id).unwrap_or_default();

        let mut messages = Vec::new();
        for msg in log.iter().rev() {
            if !msg.is_new_msg {
                break;
            }
            if !msg.is_chat_message() {
                trace!(chat = %chat.id, seq = msg.id.seq, "skipping non-chat message");
                continue;
            }
            if store.mark_read(&chat.id, &msg.id) {
                let mut read = serialize_raw(msg);
                read.insert("isNewMsg".to_string(), serde_json::Value::Bool(false));
                messages.push(read);
            }
        }

        self.markers.touch(chat);

        if messages.is_empty() {
            return None;
        }

        debug!(chat = %chat.id, count = messages.len(), "extracted unread messages");

        // `messages` belongs to the wrapper; a passthrough field of that name would repeat the key.
        let mut record = serialize_chat(chat);
        record.remove("messages");
        Some(ChatWithMessages {
            chat: record,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Message, MessageKey};
    use serde_json::json;

    fn msg(seq: u64, new: bool) -> serde_json::Value {
        json!({
            "id": {"fromMe": false, "seq": seq},
            "body": format!("m{}", seq),
            "isUserCreatedType": true,
            "isNewMsg": new
        })
    }

    fn setup(json: serde_json::Value) -> (Arc<MemoryStore>, UnreadExtractor<MemoryStore>) {
        let store = Arc::new(MemoryStore::from_json_str(&json.to_string()).unwrap());
        let extractor = UnreadExtractor::new(
            StoreAccessor::new(Arc::clone(&store)),
            Arc::new(ReadMarkers::new()),
        );
        (store, extractor)
    }

    fn bodies(chat: &ChatWithMessages) -> Vec<&str> {
        chat.messages
            .iter()
            .map(|m| m["body"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_newest_first_and_flags() {
        let (store, extractor) = setup(json!({"chats": [{
            "id": "c1", "name": "Ann",
            "msgs": [msg(1, false), msg(2, false), msg(3, true), msg(4, true), msg(5, true)]
        }]}));

        let out = extractor.extract_unread();
        assert_eq!(out.len(), 1);
        assert_eq!(bodies(&out[0]), vec!["m5", "m4", "m3"]);
        assert_eq!(out[0].chat["name"], json!("Ann"));

        let log = store.messages("c1").unwrap();
        assert!(log.iter().all(|m| !m.is_new_msg));
    }

    #[test]
    fn test_second_extraction_empty() {
        let (_store, extractor) = setup(json!({"chats": [{
            "id": "c1", "msgs": [msg(1, true), msg(2, true)]
        }]}));

        assert_eq!(extractor.extract_unread().len(), 1);
        assert!(extractor.extract_unread().is_empty());
    }

    #[test]
    fn test_stops_at_first_read_message() {
        // m1 is new but sits behind a read message; the walk never reaches it.
        let (store, extractor) = setup(json!({"chats": [{
            "id": "c1", "msgs": [msg(1, true), msg(2, false), msg(3, true)]
        }]}));

        let out = extractor.extract_unread();
        assert_eq!(bodies(&out[0]), vec!["m3"]);
        assert!(store.messages("c1").unwrap()[0].is_new_msg);
    }

    #[test]
    fn test_skips_notification_and_own_messages() {
        let (store, extractor) = setup(json!({"chats": [{
            "id": "c1",
            "msgs": [
                msg(1, true),
                {"id": {"fromMe": false, "seq": 2}, "isNotification": true, "isNewMsg": true},
                {"id": {"fromMe": true, "seq": 3}, "isSentByMe": true, "isNewMsg": true},
                {"id": {"fromMe": false, "seq": 4}, "isUserCreatedType": false, "isNewMsg": true},
                msg(5, true)
            ]
        }]}));

        let out = extractor.extract_unread();
        assert_eq!(bodies(&out[0]), vec!["m5", "m1"]);

        let log: Vec<Message> = store.messages("c1").unwrap();
        assert!(log[1].is_new_msg);
        assert!(log[2].is_new_msg);
        assert!(log[3].is_new_msg);
        assert!(!log[0].is_new_msg);
    }

    #[test]
    fn test_missing_user_created_type_not_delivered() {
        let (store, extractor) = setup(json!({"chats": [{
            "id": "c1",
            "msgs": [{"id": {"fromMe": false, "seq": 0}, "isNewMsg": true}]
        }]}));

        assert!(extractor.extract_unread().is_empty());
        assert!(store.messages("c1").unwrap()[0].is_new_msg);
    }

    #[test]
    fn test_chat_messages_field_not_repeated() {
        let (_store, extractor) = setup(json!({"chats": [{
            "id": "c1", "name": "Ann", "messages": "stale", "msgs": [msg(1, true)]
        }]}));

        let out = extractor.extract_unread();
        let text = serde_json::to_string(&out[0]).unwrap();
        assert_eq!(text.matches("\"messages\"").count(), 1);
        assert_eq!(bodies(&out[0]), vec!["m1"]);
    }

    #[test]
    fn test_chat_without_qualifying_messages_omitted() {
        let (_store, extractor) = setup(json!({"chats": [
            {"id": "c1", "name": "Quiet", "msgs": [msg(1, false)]},
            {"id": "c2", "name": "Busy", "msgs": [msg(1, true)]}
        ]}));

        let out = extractor.extract_unread();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chat["id"], json!("c2"));
        assert!(extractor.markers().get("Quiet").is_some());
        assert!(extractor.markers().get("Busy").is_some());
    }

    #[test]
    fn test_already_committed_message_not_delivered() {
        let (store, extractor) = setup(json!({"chats": [{
            "id": "c1", "msgs": [msg(1, true), msg(2, true)]
        }]}));

        // A concurrent extraction committed m2 after our snapshot was taken.
        assert!(store.mark_read("c1", &MessageKey { from_me: false, seq: 2 }));
        let out = extractor.extract_unread();
        assert_eq!(bodies(&out[0]), vec!["m1"]);
    }

    #[test]
    fn test_single_chat_variant() {
        let (_store, extractor) = setup(json!({"chats": [
            {"id": "c1", "msgs": [msg(1, true)]},
            {"id": "c2", "msgs": [msg(1, true)]}
        ]}));

        let out = extractor.extract_unread_in_chat("c2").unwrap().unwrap();
        assert_eq!(out.chat["id"], json!("c2"));
        assert!(extractor.extract_unread_in_chat("c2").unwrap().is_none());
        assert!(extractor.extract_unread_in_chat("zz").is_err());
        assert_eq!(extractor.extract_unread().len(), 1);
    }

    #[test]
    fn test_all_messages_forward_order() {
        let (store, extractor) = setup(json!({"chats": [{
            "id": "c1", "formattedTitle": "Ann",
            "msgs": [
                msg(1, true),
                {"id": {"fromMe": true, "seq": 2}, "body": "mine", "isSentByMe": true},
                {"id": {"fromMe": false, "seq": 3}, "body": "sys", "isNotification": true},
                msg(4, true)
            ]
        }]}));

        let others = extractor.get_all_messages_in_chat("c1", false).unwrap();
        let others: Vec<_> = others.iter().map(|m| m["body"].clone()).collect();
        assert_eq!(others, vec![json!("m1"), json!("m4")]);

        let all = extractor.get_all_messages_in_chat("c1", true).unwrap();
        let all: Vec<_> = all.iter().map(|m| m["body"].clone()).collect();
        assert_eq!(all, vec![json!("m1"), json!("mine"), json!("m4")]);

        // Non-destructive
        assert!(store.messages("c1").unwrap()[0].is_new_msg);
        assert!(extractor.markers().get("Ann").is_some());
    }

    #[test]
    fn test_all_messages_unknown_chat() {
        let (_store, extractor) = setup(json!({"chats": []}));
        assert!(extractor.get_all_messages_in_chat("c1", true).is_err());
        assert!(extractor.markers().snapshot().is_empty());
    }

    #[test]
    fn test_marker_key_falls_back_to_id() {
        let chat: Chat = serde_json::from_value(json!({"id": "c9"})).unwrap();
        assert_eq!(ReadMarkers::key(&chat), "c9");
    }
}
