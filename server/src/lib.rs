//! HTTP front end for the checklist intake service.
//!
//! Routes:
//! - `GET /` form, with an optional `?error=` message from a refused post
//! - `POST /submit` multipart submission, answered with a 303 redirect
//! - `GET /thank-you?sid=` acknowledgement
//! - `GET /uploads/:sid/:filename` stored photo
//! - `GET /admin?token=` newest submissions
//! - `GET /healthz`

pub mod error;
pub mod multipart;
pub mod routes;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use menage_checklist::ChecklistSchema;
use menage_intake::{
    AdminGate, IntakeConfig, Result, SubmissionProcessor, SubmissionReader, SubmissionStore,
    UploadStore,
};

pub use error::AppError;

/// Shared handles for every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<ChecklistSchema>,
    pub processor: SubmissionProcessor,
    pub reader: SubmissionReader,
    pub gate: AdminGate,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(
        schema: Arc<ChecklistSchema>,
        store: Arc<SubmissionStore>,
        uploads: Arc<UploadStore>,
        gate: AdminGate,
        admin_list_limit: usize,
    ) -> Self {
        Self {
            processor: SubmissionProcessor::new(
                Arc::clone(&schema),
                Arc::clone(&store),
                Arc::clone(&uploads),
            ),
            reader: SubmissionReader::new(store, admin_list_limit),
            schema,
            gate,
            uploads,
        }
    }

    /// Open the store and upload tree named by `config`.
    pub fn from_config(schema: Arc<ChecklistSchema>, config: &IntakeConfig) -> Result<Self> {
        let store = Arc::new(SubmissionStore::open(&config.db_path)?);
        let uploads = Arc::new(UploadStore::with_root(config.upload_dir.clone())?);
        tracing::info!(
            db_path = %config.db_path.display(),
            upload_dir = %config.upload_dir.display(),
            submissions = store.count()?,
            "Storage ready"
        );
        Ok(Self::new(
            schema,
            store,
            uploads,
            AdminGate::new(config.admin_token.clone()),
            config.admin_list_limit,
        ))
    }
}

/// Build the router. `max_body_bytes` caps every request body.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/submit", post(routes::submit))
        .route("/thank-you", get(routes::thank_you))
        .route("/uploads/:sid/:filename", get(routes::uploaded_file))
        .route("/admin", get(routes::admin))
        .route("/healthz", get(routes::healthz))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
