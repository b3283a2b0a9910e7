//! Best-effort completion notifications carrying a deep-link payload.
//!
//! Notification delivery must never fail the primary operation: callers go
//! through [`notify_best_effort`], which logs and swallows errors.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// A `{route, params}` payload consumed by the client's router on tap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepLink {
    pub route: String,
    pub params: Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, title: &str, link: DeepLink) -> Result<()>;
}

/// Default notifier: records the notification in the structured log.
/// A push transport implements `Notifier` without touching any caller.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: Uuid, title: &str, link: DeepLink) -> Result<()> {
        info!(
            "Notification for user {user_id}: {title} -> {} {}",
            link.route, link.params
        );
        Ok(())
    }
}

/// Sends a notification, logging and swallowing any failure.
pub async fn notify_best_effort(notifier: &dyn Notifier, user_id: Uuid, title: &str, link: DeepLink) {
    if let Err(e) = notifier.notify(user_id, title, link).await {
        warn!("Notification send failed (ignored): {e}");
    }
}
