pub mod dispatch;

use std::future::Future;
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::config::AppConfig;
use crate::error::ProxyError;

/// Live check of whether the upstream serves a model id as-is.
pub trait CapabilityProbe {
    fn probe(&self, model: &str) -> impl Future<Output = Result<(), ProxyError>> + Send;
}

#[derive(Debug, Clone)]
struct Tier {
    keywords: Vec<String>,
    model: String,
}

/// Maps caller model names onto upstream model ids.
///
/// Resolution order: exact alias, live probe (when enabled), keyword tiers,
/// then the default model. Resolution never fails.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    aliases: FxHashMap<String, String>,
    alias_names: Vec<String>,
    tiers: Vec<Tier>,
    default_model: String,
    probe_timeout: Option<Duration>,
}

impl ModelResolver {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let models = &config.models;
        let mut aliases = FxHashMap::default();
        let mut alias_names = Vec::with_capacity(models.aliases.len());
        for alias in &models.aliases {
            if aliases
                .insert(alias.name.clone(), alias.upstream.clone())
                .is_none()
            {
                alias_names.push(alias.name.clone());
            }
        }

        let tiers = models
            .fallback_tiers
            .iter()
            .map(|tier| Tier {
                keywords: tier.keywords.iter().map(|k| k.to_lowercase()).collect(),
                model: tier.model.clone(),
            })
            .collect();

        let probe_timeout = config
            .upstream
            .probe_unknown_models
            .then(|| Duration::from_secs(config.upstream.probe_timeout_secs));

        Self {
            aliases,
            alias_names,
            tiers,
            default_model: models.default_model.clone(),
            probe_timeout,
        }
    }

    /// Alias names in configuration order.
    #[must_use]
    pub fn alias_names(&self) -> &[String] {
        &self.alias_names
    }

    #[must_use]
    pub fn exact(&self, model: &str) -> Option<&str> {
        self.aliases.get(model).map(String::as_str)
    }

    /// Keyword tier match for `model`, or the default model.
    #[must_use]
    pub fn fallback_model(&self, model: &str) -> &str {
        let lowered = model.to_lowercase();
        self.tiers
            .iter()
            .find(|tier| tier.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map_or(self.default_model.as_str(), |tier| tier.model.as_str())
    }

    pub async fn resolve<P: CapabilityProbe>(&self, model: &str, probe: Option<&P>) -> String {
        if let Some(upstream) = self.exact(model) {
            return upstream.to_string();
        }

        if let (Some(probe), Some(limit)) = (probe, self.probe_timeout) {
            match tokio::time::timeout(limit, probe.probe(model)).await {
                Ok(Ok(())) => {
                    tracing::debug!(model, "model accepted by upstream probe");
                    return model.to_string();
                }
                Ok(Err(err)) => tracing::debug!(model, error = %err, "model probe failed"),
                Err(_) => tracing::debug!(model, timeout_ms = limit.as_millis() as u64, "model probe timed out"),
            }
        }

        let fallback = self.fallback_model(model);
        tracing::debug!(model, fallback, "using fallback model");
        fallback.to_string()
    }
}
