//! Layered process configuration.
//!
//! Values are resolved once at startup, lowest precedence first: built-in
//! defaults, `config/default`, `config/{CONTACT_ROUTER_ENV}`, `config/local`,
//! `APP__SECTION__KEY` variables, and finally the flat variables the contact
//! platform injects (`QUEUE_MAP`, `LOCALE`, `FAQ_CACHE_TABLE`, ...).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::types::ModerationPolicy;

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en_US";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub router: RouterConfig,
    pub cache: CacheConfig,
    pub model_gateway: ModelGatewayConfig,
    /// No policy keys exist by default, so the section may be absent.
    #[serde(default)]
    pub moderation: ModerationConfig,
    pub feedback: FeedbackConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub enable_tracing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    /// Raw JSON object of department name to routing id.
    pub queue_map: Option<String>,
    pub locale: String,
    pub stream_idle_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Name of the answer table. Caching is off when unset.
    pub table: Option<String>,
    pub redis_url: Option<String>,
    pub ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelGatewayConfig {
    /// Base URL of an HTTP inference service. Takes precedence over Rig.
    pub endpoint: Option<String>,
    pub provider: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    /// Bearer token for the HTTP inference service.
    pub api_key: Option<Secret<String>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ModerationConfig {
    pub guardrail_id: Option<String>,
    pub guardrail_version: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackConfig {
    /// Base URL of the intent corpus service. Samples are only logged when unset.
    pub endpoint: Option<String>,
    pub token: Option<Secret<String>>,
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub json_logs: bool,
    pub metrics: bool,
}

impl ModerationConfig {
    /// The policy to attach to inference calls, if both halves are set.
    pub fn policy(&self) -> Option<ModerationPolicy> {
        ModerationPolicy::from_parts(
            self.guardrail_id.as_deref(),
            self.guardrail_version.as_deref(),
        )
    }
}

impl RouterConfig {
    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_idle_timeout_ms)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl ModelGatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from files and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("CONTACT_ROUTER_ENV").unwrap_or_else(|_| "development".into());

        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=3000 to server.port
            .add_source(Environment::with_prefix("APP").separator("__"));

        Self::with_platform_overrides(builder, |name| std::env::var(name).ok())?
            .build()?
            .try_deserialize()
    }

    /// Apply the flat platform variables on top of `builder`.
    ///
    /// Unset and empty variables leave the layer below untouched.
    pub fn with_platform_overrides<F>(
        builder: ConfigBuilder<DefaultState>,
        lookup: F,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        builder
            .set_override_option("router.queue_map", var("QUEUE_MAP"))?
            .set_override_option("router.locale", var("LOCALE"))?
            .set_override_option("cache.table", var("FAQ_CACHE_TABLE"))?
            .set_override_option("cache.redis_url", var("REDIS_URL"))?
            .set_override_option("moderation.guardrail_id", var("GUARDRAIL_ID"))?
            .set_override_option("moderation.guardrail_version", var("GUARDRAIL_VERSION"))?
            .set_override_option("model_gateway.endpoint", var("INFERENCE_ENDPOINT"))?
            .set_override_option("model_gateway.api_key", var("INFERENCE_API_KEY"))?
            .set_override_option("feedback.endpoint", var("CORPUS_ENDPOINT"))
    }

    /// Builder pre-populated with the built-in defaults.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.enable_cors", true)?
            .set_default("server.enable_tracing", true)?
            .set_default("router.locale", DEFAULT_LOCALE)?
            .set_default("router.stream_idle_timeout_ms", 15_000)?
            .set_default("cache.ttl_secs", 24 * 60 * 60)?
            .set_default("model_gateway.provider", "openai")?
            .set_default("model_gateway.max_tokens", 1000)?
            .set_default("model_gateway.timeout_ms", 10_000)?
            .set_default("feedback.queue_capacity", 256)?
            .set_default("telemetry.json_logs", false)?
            .set_default("telemetry.metrics", true)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
                enable_cors: true,
                enable_tracing: true,
            },
            router: RouterConfig {
                queue_map: None,
                locale: DEFAULT_LOCALE.into(),
                stream_idle_timeout_ms: 15_000,
            },
            cache: CacheConfig {
                table: None,
                redis_url: None,
                ttl_secs: 24 * 60 * 60,
            },
            model_gateway: ModelGatewayConfig {
                endpoint: None,
                provider: "openai".into(),
                model: None,
                max_tokens: 1000,
                timeout_ms: 10_000,
                api_key: None,
            },
            moderation: ModerationConfig::default(),
            feedback: FeedbackConfig {
                endpoint: None,
                token: None,
                queue_capacity: 256,
            },
            telemetry: TelemetryConfig {
                json_logs: false,
                metrics: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DestinationCatalog;
    use std::collections::HashMap;

    fn from_platform(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        AppConfig::with_platform_overrides(AppConfig::defaults().unwrap(), |name| {
            vars.get(name).cloned()
        })
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
    }

    #[test]
    fn defaults_deserialize_without_any_files() {
        let cfg: AppConfig = AppConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.router.locale, "en_US");
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(86_400));
        assert!(cfg.cache.table.is_none());
        assert!(cfg.router.queue_map.is_none());
        assert!(cfg.moderation.policy().is_none());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let cfg: AppConfig = AppConfig::defaults()
            .unwrap()
            .set_override("router.queue_map", r#"{"Sales":"arnA"}"#)
            .unwrap()
            .set_override("cache.table", "FaqCache")
            .unwrap()
            .set_override("moderation.guardrail_id", "gr-1")
            .unwrap()
            .set_override("moderation.guardrail_version", "3")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.router.queue_map.as_deref(), Some(r#"{"Sales":"arnA"}"#));
        assert_eq!(cfg.cache.table.as_deref(), Some("FaqCache"));
        let policy = cfg.moderation.policy().expect("both halves present");
        assert_eq!(policy.identifier, "gr-1");
        assert_eq!(policy.version, "3");
    }

    #[test]
    fn half_configured_moderation_is_ignored() {
        let moderation = ModerationConfig {
            guardrail_id: Some("gr-1".into()),
            guardrail_version: None,
        };
        assert!(moderation.policy().is_none());
    }

    #[test]
    fn bare_platform_environment_still_builds() {
        let cfg = from_platform(&[]);

        assert_eq!(cfg.router.locale, DEFAULT_LOCALE);
        assert!(cfg.moderation.policy().is_none());
        assert!(cfg.cache.table.is_none());
        assert!(cfg.model_gateway.endpoint.is_none());
        assert!(DestinationCatalog::from_json(cfg.router.queue_map.as_deref()).is_empty());
    }

    #[test]
    fn malformed_queue_map_degrades_to_empty_catalog() {
        let cfg = from_platform(&[("QUEUE_MAP", "{not json"), ("LOCALE", "")]);

        assert_eq!(cfg.router.queue_map.as_deref(), Some("{not json"));
        assert_eq!(cfg.router.locale, "en_US");
        assert!(DestinationCatalog::from_json(cfg.router.queue_map.as_deref()).is_empty());
    }

    #[test]
    fn platform_variables_reach_their_sections() {
        let cfg = from_platform(&[
            ("QUEUE_MAP", r#"{"Sales":"arnA"}"#),
            ("LOCALE", "fr_FR"),
            ("FAQ_CACHE_TABLE", "FaqCache"),
            ("GUARDRAIL_ID", "gr-1"),
            ("GUARDRAIL_VERSION", "3"),
            ("INFERENCE_ENDPOINT", "http://inference.local"),
            ("CORPUS_ENDPOINT", "http://corpus.local"),
        ]);

        assert_eq!(cfg.router.locale, "fr_FR");
        assert_eq!(cfg.cache.table.as_deref(), Some("FaqCache"));
        assert_eq!(cfg.model_gateway.endpoint.as_deref(), Some("http://inference.local"));
        assert_eq!(cfg.feedback.endpoint.as_deref(), Some("http://corpus.local"));
        assert_eq!(
            DestinationCatalog::from_json(cfg.router.queue_map.as_deref()).resolve("Sales"),
            Some("arnA")
        );
        let policy = cfg.moderation.policy().expect("both halves present");
        assert_eq!(policy.identifier, "gr-1");
    }

    #[test]
    fn single_guardrail_variable_attaches_no_policy() {
        let cfg = from_platform(&[("GUARDRAIL_ID", "gr-1")]);
        assert_eq!(cfg.moderation.guardrail_id.as_deref(), Some("gr-1"));
        assert!(cfg.moderation.policy().is_none());

        let cfg = from_platform(&[("GUARDRAIL_VERSION", "3")]);
        assert!(cfg.moderation.policy().is_none());
    }
}
