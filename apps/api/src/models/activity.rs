use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable ledger row. Written exactly once per billable action, in the same
/// transaction as the balance mutation; never updated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub resource_id: Option<Uuid>,
    /// Tokens deducted (negative for credits).
    pub tokens_used: i64,
    /// Balance snapshot after this row's mutation committed.
    pub token_balance_after: i64,
    pub created_at: DateTime<Utc>,
}
