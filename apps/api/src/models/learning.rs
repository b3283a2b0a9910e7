use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One skill-gap learning entry, produced per missing skill by a
/// `learning_path` task.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    pub skill: String,
    pub resources: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
