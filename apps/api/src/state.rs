use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::MatchScorer;
use crate::notify::Notifier;
use crate::payments::StripeClient;
use crate::tasks::queue::TaskQueue;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub stripe: StripeClient,
    pub config: Config,
    /// Pluggable ATS scorer. Default: WeightedSumScorer (deterministic, no I/O).
    pub scorer: Arc<dyn MatchScorer>,
    /// Task queue shared between handlers (create/cancel) and the worker (claim/complete).
    pub tasks: TaskQueue,
    /// Best-effort deep-link notifications on task completion.
    pub notifier: Arc<dyn Notifier>,
}
