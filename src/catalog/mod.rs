//! Prompt catalog: trigger key → behavioral modifier text.
//!
//! Loaded once at startup from the built-in table or from the `prompts`
//! section of the config file, then shared read-only.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::AppConfig;

use self::builtin::BUILTIN_PROMPTS;

/// Degree refining a prompt's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum IntensityLevel {
    Mild,
    #[default]
    Normal,
    Intense,
}

impl IntensityLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IntensityLevel::Mild => "MILD",
            IntensityLevel::Normal => "NORMAL",
            IntensityLevel::Intense => "INTENSE",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an intensity name outside `MILD` / `NORMAL` / `INTENSE`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intensity level '{0}', expected MILD, NORMAL or INTENSE")]
pub struct UnknownIntensity(pub String);

impl FromStr for IntensityLevel {
    type Err = UnknownIntensity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MILD" => Ok(IntensityLevel::Mild),
            "NORMAL" => Ok(IntensityLevel::Normal),
            "INTENSE" => Ok(IntensityLevel::Intense),
            _ => Err(UnknownIntensity(s.to_string())),
        }
    }
}

impl Serialize for IntensityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IntensityLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub key: String,
    #[serde(alias = "name")]
    pub display_name: String,
    /// Inline command users can type to enable the prompt, e.g. `<AUTOPLOT=ON>`.
    #[serde(default, alias = "command")]
    pub trigger_text: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "system_prompt")]
    pub modifier_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_variants: Option<BTreeMap<IntensityLevel, String>>,
}

impl PromptEntry {
    #[must_use]
    pub fn has_intensity(&self) -> bool {
        self.intensity_variants
            .as_ref()
            .is_some_and(|variants| !variants.is_empty())
    }
}

/// Immutable prompt catalog indexed by key.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    entries: Vec<PromptEntry>,
    index: FxHashMap<String, usize>,
}

impl PromptCatalog {
    /// Build a catalog. Later duplicates of a key are ignored.
    #[must_use]
    pub fn new(entries: Vec<PromptEntry>) -> Self {
        let mut index = FxHashMap::default();
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if index.contains_key(&entry.key) {
                tracing::warn!(key = %entry.key, "duplicate prompt key ignored");
                continue;
            }
            index.insert(entry.key.clone(), kept.len());
            kept.push(entry);
        }
        Self {
            entries: kept,
            index,
        }
    }

    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN_PROMPTS
            .iter()
            .map(|prompt| PromptEntry {
                key: prompt.key.to_string(),
                display_name: prompt.name.to_string(),
                trigger_text: prompt.command.to_string(),
                description: prompt.description.to_string(),
                modifier_text: prompt.text.to_string(),
                intensity_variants: if prompt.intensity.is_empty() {
                    None
                } else {
                    Some(
                        prompt
                            .intensity
                            .iter()
                            .map(|(level, text)| (*level, (*text).to_string()))
                            .collect(),
                    )
                },
            })
            .collect();
        Self::new(entries)
    }

    /// Catalog from the config `prompts` section, or the built-in table.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.prompts {
            Some(prompts) => Self::new(prompts.clone()),
            None => Self::builtin(),
        }
    }

    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&PromptEntry> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    #[must_use]
    pub fn intensity_text(&self, key: &str, level: IntensityLevel) -> Option<&str> {
        self.lookup(key)?
            .intensity_variants
            .as_ref()?
            .get(&level)
            .map(String::as_str)
    }

    /// Entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose trigger text occurs in `text`, in catalog order.
    pub fn find_triggers<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |entry| {
                !entry.trigger_text.is_empty()
                    && memchr::memmem::find(text.as_bytes(), entry.trigger_text.as_bytes())
                        .is_some()
            })
            .map(|entry| entry.key.as_str())
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = PromptCatalog::builtin();
        let entry = catalog.lookup("autoplot").expect("autoplot entry");
        assert_eq!(entry.display_name, "Autoplot");
        assert_eq!(entry.trigger_text, "<AUTOPLOT=ON>");
        assert!(entry.modifier_text.starts_with("AUTOPLOT MODE ENABLED"));
        assert!(!entry.has_intensity());
        assert!(catalog.lookup("does-not-exist").is_none());
    }

    #[test]
    fn test_intensity_text() {
        let catalog = PromptCatalog::builtin();
        let mild = catalog
            .intensity_text("npcneeds", IntensityLevel::Mild)
            .expect("mild variant");
        assert!(mild.starts_with("Focus on basic human needs"));
        assert!(catalog
            .intensity_text("autoplot", IntensityLevel::Normal)
            .is_none());
        assert!(catalog
            .intensity_text("missing", IntensityLevel::Normal)
            .is_none());
    }

    #[test]
    fn test_builtin_keys_unique_and_ordered() {
        let catalog = PromptCatalog::builtin();
        assert_eq!(catalog.entries()[0].key, "autoplot");
        assert_eq!(catalog.entries()[1].key, "npcneeds");
        let mut keys: Vec<&str> = catalog.entries().iter().map(|e| e.key.as_str()).collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let entry = |text: &str| PromptEntry {
            key: "dup".into(),
            display_name: "Dup".into(),
            trigger_text: String::new(),
            description: String::new(),
            modifier_text: text.into(),
            intensity_variants: None,
        };
        let catalog = PromptCatalog::new(vec![entry("first"), entry("second")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("dup").unwrap().modifier_text, "first");
    }

    #[test]
    fn test_intensity_level_parse() {
        assert_eq!("mild".parse::<IntensityLevel>(), Ok(IntensityLevel::Mild));
        assert_eq!(" INTENSE ".parse::<IntensityLevel>(), Ok(IntensityLevel::Intense));
        assert!("extreme".parse::<IntensityLevel>().is_err());
        assert_eq!(IntensityLevel::default(), IntensityLevel::Normal);
    }

    #[test]
    fn test_intensity_level_serde() {
        let json = serde_json::to_string(&IntensityLevel::Intense).unwrap();
        assert_eq!(json, "\"INTENSE\"");
        let level: IntensityLevel = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(level, IntensityLevel::Normal);
    }

    #[test]
    fn test_prompt_entry_yaml_aliases() {
        let yaml = r"
key: pirate
name: Pirate
command: <PIRATE=ON>
system_prompt: Talk like a pirate.
intensity_variants:
  MILD: An occasional arr.
  intense: Full buccaneer.
";
        let entry: PromptEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.display_name, "Pirate");
        assert_eq!(entry.trigger_text, "<PIRATE=ON>");
        assert_eq!(entry.modifier_text, "Talk like a pirate.");
        let variants = entry.intensity_variants.unwrap();
        assert_eq!(variants[&IntensityLevel::Intense], "Full buccaneer.");
    }

    #[test]
    fn test_find_triggers() {
        let catalog = PromptCatalog::builtin();
        let found: Vec<&str> = catalog
            .find_triggers("hello <NPCNEEDS=ON> and <AUTOPLOT=ON>")
            .collect();
        assert_eq!(found, vec!["autoplot", "npcneeds"]);
        assert_eq!(catalog.find_triggers("nothing here").count(), 0);
    }
}
