pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{analysis, applications, learning, ledger, payments, resume, tasks};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume ingest
        .route(
            "/api/v1/resumes/upload",
            post(resume::handlers::handle_upload_resume),
        )
        // Analyses
        .route(
            "/api/v1/analyses",
            post(analysis::handlers::handle_create_analysis)
                .get(analysis::handlers::handle_list_analyses),
        )
        .route(
            "/api/v1/analyses/:id",
            get(analysis::handlers::handle_get_analysis)
                .delete(analysis::handlers::handle_delete_analysis),
        )
        .route(
            "/api/v1/analyses/:id/promote",
            post(analysis::handlers::handle_promote),
        )
        .route(
            "/api/v1/analyses/:id/discard",
            post(analysis::handlers::handle_discard),
        )
        // Background tasks
        .route("/api/v1/tasks", post(tasks::handlers::handle_create_task))
        .route(
            "/api/v1/tasks/active",
            get(tasks::handlers::handle_active_tasks),
        )
        .route(
            "/api/v1/tasks/:id",
            get(tasks::handlers::handle_get_task).delete(tasks::handlers::handle_cancel_task),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handlers::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handlers::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/stage",
            post(applications::handlers::handle_record_stage),
        )
        // Token ledger
        .route("/api/v1/profile", get(ledger::handlers::handle_get_profile))
        .route(
            "/api/v1/activities",
            get(ledger::handlers::handle_list_activities),
        )
        .route(
            "/api/v1/tokens/credit",
            post(ledger::handlers::handle_credit_tokens),
        )
        // Payments
        .route(
            "/api/v1/payments/intent",
            post(payments::handlers::handle_create_intent),
        )
        .route(
            "/api/v1/payments/confirm",
            post(payments::handlers::handle_confirm),
        )
        // Learning paths
        .route("/api/v1/learning", get(learning::handle_list_learning))
        .route(
            "/api/v1/learning/:id/status",
            patch(learning::handle_update_status),
        )
        .with_state(state)
}
