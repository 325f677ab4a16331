//! Store accessor: read-only lookups over contacts, chats and group metadata.
//!
//! Lookups are linear scans, first match wins. Fine for the contact and chat
//! counts a client store holds; there is no index.
//!
//! CHANGELOG:
//! - 10/12/2026 - Initial implementation

use std::sync::Arc;
use tracing::warn;

use crate::error::{Error, RecordKind, Result};
use crate::store::{Chat, Contact, GroupMetadata, Store};

/// Lookup layer over a shared store.
pub struct StoreAccessor<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for StoreAccessor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store + ?Sized> StoreAccessor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn list_contacts(&self) -> Vec<Contact> {
        self.store.contacts()
    }

    pub fn get_contact(&self, id: &str) -> Result<Contact> {
        self.store
            .contacts()
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::not_found(RecordKind::Contact, id))
    }

    pub fn list_chats(&self) -> Vec<Chat> {
        self.store.chats()
    }

    pub fn get_chat(&self, id: &str) -> Result<Chat> {
        self.find_chat(id)
            .ok_or_else(|| Error::not_found(RecordKind::Chat, id))
    }

    /// Like `get_chat`, for callers where a miss is normal flow.
    pub fn find_chat(&self, id: &str) -> Option<Chat> {
        self.store.chats().into_iter().find(|c| c.id == id)
    }

    pub fn list_group_metadata(&self) -> Vec<GroupMetadata> {
        self.store.group_metadata()
    }

    pub fn find_group_metadata(&self, id: &str) -> Option<GroupMetadata> {
        self.store.group_metadata().into_iter().find(|g| g.id == id)
    }

    /// The contact flagged as the authenticated user.
    ///
    /// If the store flags more than one, the first in store order is returned.
    pub fn get_current_user(&self) -> Result<Contact> {
        let mut flagged = self.store.contacts().into_iter().filter(|c| c.is_me);
        let me = flagged
            .next()
            .ok_or_else(|| Error::not_found(RecordKind::CurrentUser, "me"))?;

        if flagged.next().is_some() {
            warn!(id = %me.id, "multiple contacts flagged isMe, using first");
        }
        Ok(me)
    }
}
