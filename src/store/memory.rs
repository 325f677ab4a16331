//! In-memory store loaded from a JSON snapshot.
//!
//! Stands in for the host application's live store: the daemon and CLI serve
//! from it, and tests drive it directly.
//!
//! Snapshot format:
//! ```json
//! {"contacts": [...], "chats": [{"id": "...", "msgs": [...]}], "groupMetadata": [...]}
//! ```
//!
//! CHANGELOG:
//! - 10/15/2026 - Upstream metadata queue, send failure injection
//! - 10/13/2026 - Refresh latency and per-group refresh counters
//! - 10/12/2026 - Initial implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

use super::records::{Chat, Contact, GroupMetadata, Message, MessageKey};
use super::{Store, StoreError};

/// Snapshot file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    chats: Vec<ChatSnapshot>,
    #[serde(default)]
    group_metadata: Vec<GroupMetadata>,
}

#[derive(Debug, Deserialize)]
struct ChatSnapshot {
    #[serde(default)]
    msgs: Vec<Message>,
    #[serde(flatten)]
    chat: Chat,
}

/// A message accepted by a chat's send action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentMessage {
    pub chat_id: String,
    pub content: String,
    pub t: i64,
}

struct ChatEntry {
    chat: Chat,
    msgs: Vec<Message>,
}

#[derive(Default)]
struct State {
    contacts: Vec<Contact>,
    chats: Vec<ChatEntry>,
    groups: Vec<GroupMetadata>,
    upstream: HashMap<String, GroupMetadata>,
    refresh_counts: HashMap<String, usize>,
    outbox: Vec<SentMessage>,
    send_failure: Option<String>,
}

/// Store backed by process memory.
pub struct MemoryStore {
    state: RwLock<State>,
    refresh_latency: Duration,
}

impl MemoryStore {
    /// Build a store from records. Each chat comes with its message log, oldest first.
    pub fn new(
        contacts: Vec<Contact>,
        chats: Vec<(Chat, Vec<Message>)>,
        groups: Vec<GroupMetadata>,
    ) -> Self {
        let chats = chats
            .into_iter()
            .map(|(chat, msgs)| ChatEntry { chat, msgs })
            .collect();

        Self {
            state: RwLock::new(State {
                contacts,
                chats,
                groups,
                ..State::default()
            }),
            refresh_latency: Duration::ZERO,
        }
    }

    /// Empty store.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(content).context("Failed to parse store snapshot JSON")?;

        let chats = snapshot
            .chats
            .into_iter()
            .map(|c| (c.chat, c.msgs))
            .collect();

        Ok(Self::new(snapshot.contacts, chats, snapshot.group_metadata))
    }

    /// Load a snapshot file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read store snapshot: {:?}", path.as_ref()))?;

        let store = Self::from_json_str(&content)?;
        {
            let state = store.read();
            info!(
                path = %path.as_ref().display(),
                contacts = state.contacts.len(),
                chats = state.chats.len(),
                groups = state.groups.len(),
                "loaded store snapshot"
            );
        }
        Ok(store)
    }

    /// Simulated round-trip time of a metadata refresh.
    pub fn with_refresh_latency(mut self, latency: Duration) -> Self {
        self.refresh_latency = latency;
        self
    }

    /// Queue the server-side version of a group; applied on its next refresh.
    pub fn queue_upstream(&self, metadata: GroupMetadata) {
        self.write().upstream.insert(metadata.id.clone(), metadata);
    }

    /// Mark a group's cached metadata as out of date.
    pub fn mark_stale(&self, id: &str) {
        if let Some(meta) = self.write().groups.iter_mut().find(|g| g.id == id) {
            meta.stale = true;
        }
    }

    /// Number of refreshes performed for a group.
    pub fn refresh_count(&self, id: &str) -> usize {
        self.read().refresh_counts.get(id).copied().unwrap_or(0)
    }

    /// Messages accepted by send actions, in order.
    pub fn outbox(&self) -> Vec<SentMessage> {
        self.read().outbox.clone()
    }

    /// Make every subsequent send fail with `reason`.
    pub fn fail_sends(&self, reason: impl Into<String>) {
        self.write().send_failure = Some(reason.into());
    }

    /// Append a message to a chat's log (new incoming traffic).
    pub fn push_message(&self, chat_id: &str, message: Message) -> bool {
        match self.write().chats.iter_mut().find(|e| e.chat.id == chat_id) {
            Some(entry) => {
                entry.msgs.push(message);
                true
            }
            None => false,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn contacts(&self) -> Vec<Contact> {
        self.read().contacts.clone()
    }

    fn chats(&self) -> Vec<Chat> {
        self.read().chats.iter().map(|e| e.chat.clone()).collect()
    }

    fn group_metadata(&self) -> Vec<GroupMetadata> {
        self.read().groups.clone()
    }

    fn messages(&self, chat_id: &str) -> Option<Vec<Message>> {
        self.read()
            .chats
            .iter()
            .find(|e| e.chat.id == chat_id)
            .map(|e| e.msgs.clone())
    }

    fn mark_read(&self, chat_id: &str, key: &MessageKey) -> bool {
        let mut state = self.write();
        let Some(msg) = state
            .chats
            .iter_mut()
            .find(|e| e.chat.id == chat_id)
            .and_then(|e| e.msgs.iter_mut().find(|m| &m.id == key))
        else {
            return false;
        };

        if msg.is_new_msg {
            msg.is_new_msg = false;
            true
        } else {
            false
        }
    }

    async fn refresh_group_metadata(&self, id: &str) -> Result<(), StoreError> {
        if !self.refresh_latency.is_zero() {
            tokio::time::sleep(self.refresh_latency).await;
        }

        let mut guard = self.write();
        let state = &mut *guard;

        let Some(meta) = state.groups.iter_mut().find(|g| g.id == id) else {
            return Err(StoreError::Refresh {
                id: id.to_string(),
                reason: "no such group".to_string(),
            });
        };

        if let Some(fresh) = state.upstream.remove(id) {
            *meta = fresh;
        }
        meta.stale = false;
        *state.refresh_counts.entry(id.to_string()).or_insert(0) += 1;

        debug!(group = id, participants = meta.participants.len(), "group metadata refreshed");
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<(), StoreError> {
        let mut guard = self.write();
        let state = &mut *guard;

        if let Some(reason) = &state.send_failure {
            return Err(StoreError::Send {
                chat_id: chat_id.to_string(),
                reason: reason.clone(),
            });
        }

        let Some(entry) = state.chats.iter_mut().find(|e| e.chat.id == chat_id) else {
            return Err(StoreError::Send {
                chat_id: chat_id.to_string(),
                reason: "no such chat".to_string(),
            });
        };

        let t = chrono::Utc::now().timestamp();
        let seq = entry.msgs.iter().map(|m| m.id.seq + 1).max().unwrap_or(0);
        entry.msgs.push(Message {
            id: MessageKey { from_me: true, seq },
            body: Some(content.to_string()),
            t: Some(t),
            is_notification: false,
            is_sent_by_me: true,
            is_user_created_type: true,
            is_new_msg: false,
            extra: Default::default(),
        });

        state.outbox.push(SentMessage {
            chat_id: chat_id.to_string(),
            content: content.to_string(),
            t,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "contacts": [{"id": "me@c.us", "isMe": true}],
        "chats": [{
            "id": "c1@c.us",
            "formattedTitle": "Ann",
            "archive": false,
            "msgs": [
                {"id": {"fromMe": false, "seq": 0}, "body": "hi", "isNewMsg": true}
            ]
        }],
        "groupMetadata": [{"id": "g1@g.us", "stale": true, "participants": []}]
    }"#;

    #[test]
    fn test_from_json_str() {
        let store = MemoryStore::from_json_str(SNAPSHOT).unwrap();
        let chats = store.chats();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].formatted_title.as_deref(), Some("Ann"));
        assert_eq!(chats[0].extra.get("archive"), Some(&serde_json::json!(false)));
        assert!(!chats[0].extra.contains_key("msgs"));
        assert_eq!(store.messages("c1@c.us").unwrap().len(), 1);
        assert!(store.group_metadata()[0].stale);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let store = MemoryStore::load(file.path()).unwrap();
        assert_eq!(store.contacts().len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemoryStore::load("/nonexistent/store.json").err().unwrap();
        assert!(err.to_string().contains("Failed to read store snapshot"));
    }

    #[test]
    fn test_mark_read_once() {
        let store = MemoryStore::from_json_str(SNAPSHOT).unwrap();
        let key = MessageKey { from_me: false, seq: 0 };
        assert!(store.mark_read("c1@c.us", &key));
        assert!(!store.mark_read("c1@c.us", &key));
        assert!(!store.mark_read("missing", &key));
    }

    #[tokio::test]
    async fn test_refresh_applies_upstream() {
        let store = MemoryStore::from_json_str(SNAPSHOT).unwrap();
        store.queue_upstream(GroupMetadata {
            id: "g1@g.us".to_string(),
            owner: Some("me@c.us".to_string()),
            participants: Vec::new(),
            stale: true,
            extra: Default::default(),
        });

        store.refresh_group_metadata("g1@g.us").await.unwrap();

        let meta = &store.group_metadata()[0];
        assert!(!meta.stale);
        assert_eq!(meta.owner.as_deref(), Some("me@c.us"));
        assert_eq!(store.refresh_count("g1@g.us"), 1);
    }

    #[tokio::test]
    async fn test_refresh_unknown_group() {
        let store = MemoryStore::empty();
        assert!(store.refresh_group_metadata("nope").await.is_err());
        assert_eq!(store.refresh_count("nope"), 0);
    }

    #[tokio::test]
    async fn test_send_appends_read_message() {
        let store = MemoryStore::from_json_str(SNAPSHOT).unwrap();
        store.send_message("c1@c.us", "hello").await.unwrap();

        let msgs = store.messages("c1@c.us").unwrap();
        let sent = msgs.last().unwrap();
        assert_eq!(sent.id, MessageKey { from_me: true, seq: 1 });
        assert!(sent.is_sent_by_me);
        assert!(!sent.is_new_msg);
        assert_eq!(store.outbox()[0].content, "hello");
    }

    #[tokio::test]
    async fn test_send_failure() {
        let store = MemoryStore::from_json_str(SNAPSHOT).unwrap();
        store.fail_sends("offline");
        let err = store.send_message("c1@c.us", "hello").await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert!(store.outbox().is_empty());
    }
}
