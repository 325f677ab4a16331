//! Gateway: the call/response surface over a client store.
//!
//! Every operation resolves records through the accessor, reconciles state
//! through the metadata cache or the extractor, and returns normalized
//! records.
//!
//! CHANGELOG:
//! - 10/15/2026 - Added read_markers and single-chat unread
//! - 10/13/2026 - Initial implementation

use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::StoreAccessor;
use crate::dispatcher;
use crate::error::Result;
use crate::extractor::{ChatWithMessages, ReadMarkers, UnreadExtractor};
use crate::metadata::MetadataCache;
use crate::normalize::{serialize_chat, serialize_raw, Record};
use crate::store::Store;

pub struct Gateway<S: ?Sized> {
    accessor: StoreAccessor<S>,
    metadata: MetadataCache<S>,
    extractor: UnreadExtractor<S>,
}

impl<S: Store + ?Sized> Gateway<S> {
    /// Gateway with a fresh, process-lifetime read marker cache.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_markers(store, Arc::new(ReadMarkers::new()))
    }

    pub fn with_markers(store: Arc<S>, markers: Arc<ReadMarkers>) -> Self {
        let accessor = StoreAccessor::new(store);
        Self {
            metadata: MetadataCache::new(accessor.clone()),
            extractor: UnreadExtractor::new(accessor.clone(), markers),
            accessor,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        self.accessor.store()
    }

    // ------------------------------------------------------------------
    // Contacts and chats
    // ------------------------------------------------------------------

    pub fn get_all_contacts(&self) -> Vec<Record> {
        self.accessor.list_contacts().iter().map(serialize_raw).collect()
    }

    pub fn get_contact(&self, id: &str) -> Result<Record> {
        Ok(serialize_raw(&self.accessor.get_contact(id)?))
    }

    pub fn get_me(&self) -> Result<Record> {
        Ok(serialize_raw(&self.accessor.get_current_user()?))
    }

    pub fn get_all_chats(&self) -> Vec<Record> {
        self.accessor.list_chats().iter().map(serialize_chat).collect()
    }

    pub fn get_chat(&self, id: &str) -> Result<Record> {
        Ok(serialize_chat(&self.accessor.get_chat(id)?))
    }

    // ------------------------------------------------------------------
    // Group metadata
    // ------------------------------------------------------------------

    /// Every group metadata record as currently cached; nothing is refreshed.
    pub fn get_all_group_metadata(&self) -> Vec<Record> {
        self.accessor
            .list_group_metadata()
            .iter()
            .map(serialize_raw)
            .collect()
    }

    pub async fn get_group_metadata(&self, id: &str) -> Result<Record> {
        Ok(serialize_raw(&self.metadata.get_group_metadata(id).await?))
    }

    pub async fn get_group_participant_ids(&self, id: &str) -> Result<Vec<String>> {
        self.metadata.get_group_participant_ids(id).await
    }

    pub async fn get_group_admins(&self, id: &str) -> Result<Vec<String>> {
        self.metadata.get_group_admins(id).await
    }

    pub async fn get_group_owner_id(&self, id: &str) -> Result<Option<String>> {
        self.metadata.get_group_owner_id(id).await
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub fn get_all_messages_in_chat(&self, id: &str, include_me: bool) -> Result<Vec<Record>> {
        self.extractor.get_all_messages_in_chat(id, include_me)
    }

    pub fn get_unread_messages(&self) -> Vec<ChatWithMessages> {
        self.extractor.extract_unread()
    }

    pub fn get_unread_messages_in_chat(&self, id: &str) -> Result<Option<ChatWithMessages>> {
        self.extractor.extract_unread_in_chat(id)
    }

    pub async fn send_message(&self, chat_id: &str, content: &str) -> bool {
        dispatcher::send_message(&self.accessor, chat_id, content).await
    }

    pub fn read_markers(&self) -> HashMap<String, i64> {
        self.extractor.markers().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn gateway() -> Gateway<MemoryStore> {
        let snapshot = json!({
            "contacts": [
                {"id": "a@c.us", "name": "Ann"},
                {"id": "me@c.us", "isMe": true, "pushname": "Me"}
            ],
            "chats": [
                {"id": "a@c.us", "formattedTitle": "Ann", "msgs": [
                    {"id": {"fromMe": false, "seq": 0}, "body": "ping", "isUserCreatedType": true, "isNewMsg": true}
                ]},
                {"id": "g1@g.us", "name": "Team", "isGroup": true}
            ],
            "groupMetadata": [{
                "id": "g1@g.us",
                "owner": "a@c.us",
                "stale": true,
                "participants": [
                    {"id": "a", "isAdmin": true},
                    {"id": "b", "isAdmin": false}
                ]
            }]
        });
        Gateway::new(Arc::new(
            MemoryStore::from_json_str(&snapshot.to_string()).unwrap(),
        ))
    }

    #[test]
    fn test_chats_are_normalized() {
        let gw = gateway();
        let chats = gw.get_all_chats();
        assert_eq!(chats[0]["name"], json!("Ann"));
        assert_eq!(chats[1]["isGroup"], json!(true));
        assert!(!chats[0].contains_key("msgs"));
    }

    #[test]
    fn test_me() {
        let gw = gateway();
        let me = gw.get_me().unwrap();
        assert_eq!(me["id"], json!("me@c.us"));
        assert_eq!(me["pushname"], json!("Me"));
    }

    #[tokio::test]
    async fn test_group_admins() {
        let gw = gateway();
        assert_eq!(gw.get_group_admins("g1@g.us").await.unwrap(), vec!["a"]);
        assert_eq!(gw.store().refresh_count("g1@g.us"), 1);
    }

    #[tokio::test]
    async fn test_group_metadata_not_stale_after_resolve() {
        let gw = gateway();
        let meta = gw.get_group_metadata("g1@g.us").await.unwrap();
        assert_eq!(meta["stale"], json!(false));
        assert_eq!(gw.get_all_group_metadata()[0]["stale"], json!(false));
    }

    #[tokio::test]
    async fn test_owner_missing_group() {
        let gw = gateway();
        assert!(matches!(
            gw.get_group_owner_id("nope@g.us").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unread_then_reply() {
        let gw = gateway();

        let unread = gw.get_unread_messages();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].messages.len(), 1);
        assert_eq!(unread[0].messages[0]["body"], json!("ping"));
        assert!(gw.read_markers().contains_key("Ann"));

        assert!(gw.send_message("a@c.us", "pong").await);
        assert!(!gw.send_message("c1", "hi").await);
        assert!(gw.get_unread_messages().is_empty());

        let all = gw.get_all_messages_in_chat("a@c.us", true).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_unread_serializes_flat() {
        let gw = gateway();
        let unread = gw.get_unread_messages();
        let value = serde_json::to_value(&unread).unwrap();
        assert_eq!(value[0]["id"], json!("a@c.us"));
        assert_eq!(value[0]["messages"][0]["isNewMsg"], json!(false));
    }
}
