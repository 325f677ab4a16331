//! Staleness-aware group metadata cache.
//!
//! A stale record is refreshed, and the refresh awaited, before it is handed
//! out; callers never see `stale == true`. Refreshes are serialized per group
//! id: a caller arriving while a refresh is in flight waits on the same gate
//! and picks up the fresh record instead of refreshing again.
//!
//! CHANGELOG:
//! - 10/14/2026 - Owner lookup awaits resolution before projecting
//! - 10/13/2026 - Per-group refresh gate (single-flight)
//! - 10/12/2026 - Initial implementation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use crate::accessor::StoreAccessor;
use crate::error::{Error, RecordKind, Result};
use crate::store::{GroupMetadata, Store};

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Group metadata lookups with refresh-on-demand.
pub struct MetadataCache<S: ?Sized> {
    accessor: StoreAccessor<S>,
    gates: Mutex<HashMap<String, Gate>>,
}

impl<S: Store + ?Sized> MetadataCache<S> {
    pub fn new(accessor: StoreAccessor<S>) -> Self {
        Self {
            accessor,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a group's metadata, refreshing it first if stale.
    pub async fn get_group_metadata(&self, id: &str) -> Result<GroupMetadata> {
        let found = self.lookup(id)?;
        if !found.stale {
            return Ok(found);
        }

        let gate = self.gate(id);
        let _held = gate.lock().await;

        // Another caller may have finished the refresh while we waited.
        let current = self.lookup(id)?;
        if !current.stale {
            debug!(group = id, "joined in-flight metadata refresh");
            return Ok(current);
        }

        info!(group = id, "refreshing stale group metadata");
        self.accessor.store().refresh_group_metadata(id).await?;

        self.lookup(id)
    }

    /// Ids of every participant.
    pub async fn get_group_participant_ids(&self, id: &str) -> Result<Vec<String>> {
        let metadata = self.get_group_metadata(id).await?;
        Ok(metadata.participants.into_iter().map(|p| p.id).collect())
    }

    /// Ids of participants with the admin flag set.
    pub async fn get_group_admins(&self, id: &str) -> Result<Vec<String>> {
        let metadata = self.get_group_metadata(id).await?;
        Ok(metadata
            .participants
            .into_iter()
            .filter(|p| p.is_admin)
            .map(|p| p.id)
            .collect())
    }

    /// Owner id of the resolved metadata; `None` if the store has no owner field.
    pub async fn get_group_owner_id(&self, id: &str) -> Result<Option<String>> {
        let metadata = self.get_group_metadata(id).await?;
        Ok(metadata.owner)
    }

    fn lookup(&self, id: &str) -> Result<GroupMetadata> {
        self.accessor
            .find_group_metadata(id)
            .ok_or_else(|| Error::not_found(RecordKind::GroupMetadata, id))
    }

    fn gate(&self, id: &str) -> Gate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(id.to_string()).or_default())
    }
}
