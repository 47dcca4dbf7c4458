// GET /status

use axum::response::IntoResponse;

use crate::{NAME, VERSION};

/// Service name, version and state.
pub(super) async fn status_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
        "status": "STARTED",
    }))
}
