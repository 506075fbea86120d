mod annotate;
mod health;
mod metrics;

use crate::server::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/annotate",
            post(annotate::annotate_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}
