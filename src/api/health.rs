use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub const SERVICE_NAME: &str = "OpenAI to NVIDIA NIM Proxy";

/// Health check handler.
/// Returns JSON with status and feature summary.
pub fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let features = &state.config.features;
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "reasoning_display": features.show_reasoning,
        "thinking_mode": features.enable_thinking_mode,
        "custom_prompts": state.catalog.len(),
    }))
}
