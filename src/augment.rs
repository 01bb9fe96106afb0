//! Folding selected prompt modifiers into the leading system turn.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::{IntensityLevel, PromptCatalog};
use crate::protocol::openai_chat::{DialogueTurn, Role};

/// Joins modifier blocks, and the combined text with existing system content.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Apply `keys` (in order) to `turns`.
///
/// Unknown keys are skipped; if none are known the turns come back
/// unchanged. The first system turn receives the combined text in front of
/// its own content, otherwise a new system turn is prepended.
#[must_use]
pub fn augment(
    catalog: &PromptCatalog,
    mut turns: Vec<DialogueTurn>,
    keys: &[String],
    level_by_key: &FxHashMap<String, IntensityLevel>,
) -> Vec<DialogueTurn> {
    let Some(combined) = combined_text(catalog, keys, level_by_key) else {
        return turns;
    };

    match turns.iter_mut().find(|turn| turn.role == Role::System) {
        Some(system) => system.content.prepend(&combined, BLOCK_SEPARATOR),
        None => {
            let text = combined.trim_end_matches(BLOCK_SEPARATOR).to_string();
            turns.insert(0, DialogueTurn::new(Role::System, text));
        }
    }
    turns
}

fn combined_text(
    catalog: &PromptCatalog,
    keys: &[String],
    level_by_key: &FxHashMap<String, IntensityLevel>,
) -> Option<String> {
    let mut seen = FxHashSet::default();
    let mut blocks: Vec<String> = Vec::with_capacity(keys.len() * 2);

    for key in keys {
        if !seen.insert(key.as_str()) {
            continue;
        }
        let Some(entry) = catalog.lookup(key) else {
            tracing::debug!(key = %key, "unknown prompt key skipped");
            continue;
        };
        blocks.push(entry.modifier_text.clone());

        let level = level_by_key.get(key).copied().unwrap_or_default();
        if let Some(text) = catalog.intensity_text(key, level) {
            blocks.push(format!(
                "INTENSITY FOR {}: {level}\n{text}",
                entry.display_name.to_uppercase()
            ));
        }
    }

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join(BLOCK_SEPARATOR))
    }
}

/// Explicit keys followed by keys whose trigger text appears in a user turn.
#[must_use]
pub fn collect_keys(
    catalog: &PromptCatalog,
    explicit: Vec<String>,
    turns: &[DialogueTurn],
) -> Vec<String> {
    let mut keys = explicit;
    for turn in turns.iter().filter(|turn| turn.role == Role::User) {
        let text = turn.content.text();
        for key in catalog.find_triggers(&text) {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}
