use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;
use crate::util::unix_now_secs;

const OWNED_BY: &str = "nvidia-nim-proxy";

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub owned_by: &'static str,
}

/// List the configured alias names in `OpenAI` format.
pub fn handler(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    let created = unix_now_secs();
    let data = state
        .resolver
        .alias_names()
        .iter()
        .map(|name| ModelCard {
            id: name.clone(),
            object: "model",
            created,
            owned_by: OWNED_BY,
        })
        .collect();
    Json(ModelList {
        object: "list",
        data,
    })
}
