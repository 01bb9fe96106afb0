use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PromptList {
    pub object: &'static str,
    pub data: Vec<PromptCard>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PromptCard {
    pub id: String,
    pub name: String,
    pub command: String,
    pub description: String,
    pub has_intensity: bool,
}

/// List catalog entries so clients can offer them for selection.
pub fn handler(State(state): State<Arc<AppState>>) -> Json<PromptList> {
    let data: Vec<PromptCard> = state
        .catalog
        .entries()
        .iter()
        .map(|entry| PromptCard {
            id: entry.key.clone(),
            name: entry.display_name.clone(),
            command: entry.trigger_text.clone(),
            description: entry.description.clone(),
            has_intensity: entry.has_intensity(),
        })
        .collect();
    let total = data.len();
    Json(PromptList {
        object: "list",
        data,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_lists_builtin_catalog() {
        let state = Arc::new(AppState::from_config(AppConfig::default()).unwrap());
        let Json(list) = handler(State(state.clone()));
        assert_eq!(list.total, state.catalog.len());
        let npc = list.data.iter().find(|p| p.id == "npcneeds").unwrap();
        assert_eq!(npc.command, "<NPCNEEDS=ON>");
        assert!(npc.has_intensity);
        assert!(!list.data[0].has_intensity);
    }
}
