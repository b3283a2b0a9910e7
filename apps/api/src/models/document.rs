use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A generated artifact (cover letter, interview prep guide) produced by a
/// task. Referenced from `analysis_tasks.result_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedDocumentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    pub doc_type: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}
