//! Record types held by the client store.
//!
//! Every record keeps the fields it does not model in `extra`, so the generic
//! projection (see `normalize`) passes them through untouched.
//!
//! CHANGELOG:
//! - 10/14/2026 - Added Participant extra fields (group roles from newer snapshots)
//! - 10/12/2026 - Initial record types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A contact from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    /// Set on exactly one contact: the authenticated user.
    #[serde(default)]
    pub is_me: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A chat header. The message log is held separately by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_title: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chat {
    /// Display name: `name`, then `formattedName`, then `formattedTitle`.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.formatted_name.as_deref())
            .or(self.formatted_title.as_deref())
    }
}

/// Message identity: origin plus position in the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    pub from_me: bool,
    pub seq: u64,
}

/// A message in a chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
    #[serde(default)]
    pub is_notification: bool,
    #[serde(default)]
    pub is_sent_by_me: bool,
    /// Absent means a system-generated type (e2e banner, group event, ...).
    #[serde(default)]
    pub is_user_created_type: bool,
    #[serde(default)]
    pub is_new_msg: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// A genuine chat message: not a system notification, not sent by the
    /// current user, and of a user-created type.
    pub fn is_chat_message(&self) -> bool {
        !self.is_sent_by_me && !self.is_notification && self.is_user_created_type
    }
}

/// Group participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Group metadata, keyed by the owning chat's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    pub id: String,
    /// Owner id. Snapshots carry either the bare id or a `{"id": ...}` wid.
    #[serde(
        default,
        deserialize_with = "deserialize_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Cached copy is out of date and must be refreshed before use.
    #[serde(default)]
    pub stale: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OwnerRef {
    Id(String),
    Wid { id: String },
}

fn deserialize_owner<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let owner = Option::<OwnerRef>::deserialize(deserializer)?;
    Ok(owner.map(|o| match o {
        OwnerRef::Id(id) | OwnerRef::Wid { id } => id,
    }))
}
