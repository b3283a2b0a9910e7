use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User profile. `token_balance` never goes negative: the ledger transaction
/// aborts before writing anything when the balance cannot cover the cost.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfileRow {
    pub user_id: Uuid,
    pub token_balance: i64,
    pub total_tokens_used: i64,
    pub created_at: DateTime<Utc>,
}
