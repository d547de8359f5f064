//! [`EndpointConfigSource`] backed by the `config` crate: a layered,
//! hot-reloadable binding of `Api.Endpoints.<Name>.*` from an optional
//! `config.{toml,yaml,json,...}` file overlaid with `RESILIENCE__`-prefixed
//! environment variables, modelled on the same `config::Config::builder`
//! layering used elsewhere in the pack for service configuration.
//!
//! Every field is optional in the raw layer and falls back to
//! [`EndpointConfig::new`]'s defaults, so a host only needs to declare the
//! endpoints it wants to customise.

use crate::endpoint_config::{EndpointConfig, EndpointConfigSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigSourceError {
    #[error("failed to load configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigSourceError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load(err.to_string())
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct RawEndpointConfig {
    timeout_secs: Option<u64>,
    failure_threshold: Option<f64>,
    failure_sampling_duration_secs: Option<u64>,
    failure_minimum_throughput: Option<usize>,
    failure_break_duration_secs: Option<u64>,
    retries: Option<usize>,
    retry_delay_seed_millis: Option<u64>,
    retry_delay_maximum_millis: Option<u64>,
    rate_limit: Option<u32>,
    rate_limit_period_secs: Option<u64>,
    isolate: Option<bool>,
}

impl RawEndpointConfig {
    fn into_endpoint_config(self, name: &str) -> EndpointConfig {
        let mut cfg = EndpointConfig::new(name);
        if let Some(secs) = self.timeout_secs {
            cfg = cfg.timeout(Duration::from_secs(secs));
        }
        if let Some(threshold) = self.failure_threshold {
            cfg = cfg.failure_threshold(threshold);
        }
        if let Some(secs) = self.failure_sampling_duration_secs {
            cfg = cfg.failure_sampling_duration(Duration::from_secs(secs));
        }
        if let Some(throughput) = self.failure_minimum_throughput {
            cfg = cfg.failure_minimum_throughput(throughput);
        }
        if let Some(secs) = self.failure_break_duration_secs {
            cfg = cfg.failure_break_duration(Duration::from_secs(secs));
        }
        if let Some(retries) = self.retries {
            cfg = cfg.retries(retries);
        }
        if let Some(millis) = self.retry_delay_seed_millis {
            cfg = cfg.retry_delay_seed(Duration::from_millis(millis));
        }
        if let Some(millis) = self.retry_delay_maximum_millis {
            cfg = cfg.retry_delay_maximum(Duration::from_millis(millis));
        }
        if let Some(rate_limit) = self.rate_limit {
            let period = self.rate_limit_period_secs.map(Duration::from_secs).unwrap_or(cfg.rate_limit_period);
            cfg = cfg.rate_limit(rate_limit, period);
        }
        if let Some(isolate) = self.isolate {
            cfg = cfg.isolate(isolate);
        }
        cfg
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawApi {
    endpoints: HashMap<String, RawEndpointConfig>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawRoot {
    api: RawApi,
}

/// Loads and, on demand, reloads endpoint configuration from a
/// `config.*` file (searched relative to the current working directory,
/// and entirely optional) overlaid with environment variables prefixed
/// `RESILIENCE__` (double underscore separates nesting, so
/// `RESILIENCE__API__ENDPOINTS__MOVIES__RETRIES=3` overrides the
/// `movies` endpoint's retry count).
pub struct ConfigFileSource {
    endpoints: RwLock<HashMap<String, EndpointConfig>>,
}

impl ConfigFileSource {
    /// Builds the layered source and binds it once.
    pub fn load() -> Result<Self, ConfigSourceError> {
        let endpoints = Self::bind()?;
        Ok(Self {
            endpoints: RwLock::new(endpoints),
        })
    }

    /// Re-binds every endpoint from the current file/environment state,
    /// replacing the snapshot atomically. Callers typically follow this
    /// with `Registry::clear()` so already-built pipelines pick up the
    /// new values on next use.
    pub fn reload(&self) -> Result<(), ConfigSourceError> {
        let endpoints = Self::bind()?;
        *self.endpoints.write().unwrap() = endpoints;
        Ok(())
    }

    fn bind() -> Result<HashMap<String, EndpointConfig>, ConfigSourceError> {
        let raw = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("RESILIENCE").separator("__"))
            .build()?;

        let root: RawRoot = raw.try_deserialize().unwrap_or_default();
        Ok(root
            .api
            .endpoints
            .into_iter()
            .map(|(name, raw)| {
                let cfg = raw.into_endpoint_config(&name);
                (name, cfg)
            })
            .collect())
    }
}

impl EndpointConfigSource for ConfigFileSource {
    fn get(&self, name: &str) -> Option<EndpointConfig> {
        self.endpoints.read().unwrap().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_endpoint_with_no_fields_set_keeps_the_endpoint_config_defaults() {
        let raw = RawEndpointConfig::default();
        let cfg = raw.into_endpoint_config("movies");
        let defaults = EndpointConfig::new("movies");
        assert_eq!(cfg, defaults);
    }

    #[test]
    fn raw_endpoint_overrides_only_the_fields_it_sets() {
        let raw = RawEndpointConfig {
            retries: Some(3),
            rate_limit: Some(50),
            ..Default::default()
        };
        let cfg = raw.into_endpoint_config("movies");
        assert_eq!(cfg.retries, 3);
        assert_eq!(cfg.rate_limit, 50);
        assert_eq!(cfg.timeout, EndpointConfig::new("movies").timeout);
    }

    #[test]
    fn loading_with_no_file_and_no_env_yields_no_endpoints() {
        let source = ConfigFileSource::load().expect("binding with nothing configured should still succeed");
        assert!(source.get("movies").is_none());
    }
}
