use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and the assistant integration status. Always 200:
/// a degraded or unreachable assistant is reported, never fatal.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "screening-api",
        "assistant": {
            "mode": state.assistant_status.mode,
            "reachable": state.assistant_status.reachable,
        }
    }))
}
