//! Daemon service - dispatches requests to gateway operations.
//!
//! Holds the store and the read-marker cache for the daemon's lifetime, so
//! markers and unread flags carry over between requests.
//!
//! CHANGELOG:
//! - 10/16/2026 - Error code mapping, read_markers method
//! - 10/15/2026 - Initial implementation

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::StoreSettings;
use crate::error::Error as GatewayError;
use crate::gateway::Gateway;
use crate::store::{MemoryStore, Store};

type Params = HashMap<String, Value>;

/// Request-level failures (as opposed to gateway failures).
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Missing or invalid parameter: {0}")]
    InvalidParams(&'static str),
}

/// Protocol error code for a dispatch failure.
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<GatewayError>() {
        return match e {
            GatewayError::NotFound { .. } => "NOT_FOUND",
            GatewayError::Store(_) => "ERROR",
        };
    }
    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::UnknownMethod(_)) => "UNKNOWN_METHOD",
        Some(ServiceError::InvalidParams(_)) => "INVALID_PARAMS",
        None => "ERROR",
    }
}

/// Daemon service with a live gateway.
pub struct DaemonService<S: ?Sized = MemoryStore> {
    gateway: Gateway<S>,
    started_at: String, // ISO timestamp
}

impl DaemonService<MemoryStore> {
    /// Load the configured snapshot and build the service.
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let store = settings.open_store()?;
        Ok(Self::with_gateway(Gateway::new(Arc::new(store))))
    }
}

impl<S: Store + ?Sized> DaemonService<S> {
    pub fn with_gateway(gateway: Gateway<S>) -> Self {
        Self {
            gateway,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Dispatch request to appropriate handler.
    pub async fn dispatch(&self, method: &str, params: Params) -> Result<Value> {
        let gw = &self.gateway;

        let result = match method {
            "health" => self.health(),

            // Contacts and chats
            "get_all_contacts" => json!(gw.get_all_contacts()),
            "get_contact" => json!(gw.get_contact(required_str(&params, "id")?)?),
            "get_me" => json!(gw.get_me()?),
            "get_all_chats" => json!(gw.get_all_chats()),
            "get_chat" => json!(gw.get_chat(required_str(&params, "id")?)?),

            // Group metadata
            "get_all_group_metadata" => json!(gw.get_all_group_metadata()),
            "get_group_metadata" => {
                json!(gw.get_group_metadata(required_str(&params, "id")?).await?)
            }
            "get_group_participant_ids" => {
                json!(gw.get_group_participant_ids(required_str(&params, "id")?).await?)
            }
            "get_group_admins" => {
                json!(gw.get_group_admins(required_str(&params, "id")?).await?)
            }
            "get_group_owner_id" => {
                json!(gw.get_group_owner_id(required_str(&params, "id")?).await?)
            }

            // Messages
            "get_all_messages_in_chat" => {
                let id = required_str(&params, "id")?;
                let include_me = flag(&params, "include_me");
                json!(gw.get_all_messages_in_chat(id, include_me)?)
            }
            "get_unread_messages" => json!(gw.get_unread_messages()),
            "get_unread_messages_in_chat" => {
                let found = gw.get_unread_messages_in_chat(required_str(&params, "id")?)?;
                json!(found.into_iter().collect::<Vec<_>>())
            }
            "send_message" => {
                let id = required_str(&params, "id")?;
                let message = required_str(&params, "message")?;
                json!(gw.send_message(id, message).await)
            }
            "read_markers" => json!(gw.read_markers()),

            _ => return Err(ServiceError::UnknownMethod(method.to_string()).into()),
        };

        Ok(result)
    }

    fn health(&self) -> Value {
        let store = self.gateway.store();
        json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": "v1",
            "contacts_loaded": store.contacts().len(),
            "chats_loaded": store.chats().len(),
            "groups_loaded": store.group_metadata().len(),
            "read_markers": self.gateway.read_markers().len(),
        })
    }
}

fn required_str<'a>(params: &'a Params, key: &'static str) -> Result<&'a str, ServiceError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or(ServiceError::InvalidParams(key))
}

fn flag(params: &Params, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}
