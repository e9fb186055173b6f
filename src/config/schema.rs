//! Configuration schema definitions.
//!
//! This module defines the rule file consumed by the `condition-router`
//! binary and by anything else that pushes rules from disk.
//! All types derive Serde traits for deserialization from TOML.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::endpoint::{ServiceUrl, StaticInvoker, UrlError};
use crate::routing::factory::{
    encode_rule, ENABLED_KEY, FORCE_KEY, PRIORITY_KEY, RULE_KEY, RUNTIME_KEY, SCOPE_KEY,
};
use crate::routing::Scope;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Logging settings.
    pub logging: LoggingConfig,

    /// Condition rules to install.
    pub rules: Vec<RuleConfig>,

    /// Provider endpoints to route over.
    pub providers: Vec<ProviderConfig>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info", "condition_router=debug").
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// One condition rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Rule identifier for logging.
    pub name: String,

    /// What the rule is attached to.
    #[serde(default)]
    pub scope: Scope,

    /// Target service interface (service scope).
    #[serde(default)]
    pub service: Option<String>,

    /// Target consumer application (application scope).
    #[serde(default)]
    pub application: Option<String>,

    /// Rule text, e.g. "host = 10.0.0.1 => host = 10.0.1.*".
    pub rule: String,

    /// Honor empty results (default: true).
    #[serde(default = "default_true")]
    pub force: bool,

    /// Chain position (lower = applied first).
    #[serde(default)]
    pub priority: i64,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub runtime: bool,
}

fn default_true() -> bool {
    true
}

impl RuleConfig {
    /// Express this rule as the configuration url the router factory reads.
    pub fn to_config_url(&self) -> ServiceUrl {
        let path = self.service.as_deref().unwrap_or_default();
        let mut url = ServiceUrl::new("condition", "0.0.0.0", path)
            .with_param(RULE_KEY, encode_rule(&self.rule))
            .with_param(FORCE_KEY, self.force.to_string())
            .with_param(PRIORITY_KEY, self.priority.to_string())
            .with_param(ENABLED_KEY, self.enabled.to_string())
            .with_param(RUNTIME_KEY, self.runtime.to_string())
            .with_param(SCOPE_KEY, self.scope.as_str());
        if let Some(app) = &self.application {
            url.set_param("application", app.as_str());
        }
        url
    }
}

/// One provider endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider url, e.g. "dubbo://10.20.3.3:20880/com.foo.BarService".
    pub url: String,

    #[serde(default = "default_true")]
    pub available: bool,
}

impl RouterConfig {
    /// Configuration urls for every rule, in file order.
    pub fn rule_urls(&self) -> Vec<ServiceUrl> {
        self.rules.iter().map(RuleConfig::to_config_url).collect()
    }

    /// Provider handles for every configured provider, in file order.
    pub fn build_invokers(&self) -> Result<Vec<Arc<StaticInvoker>>, UrlError> {
        self.providers
            .iter()
            .map(|p| -> Result<Arc<StaticInvoker>, UrlError> {
                let invoker = StaticInvoker::new(ServiceUrl::parse(&p.url)?);
                invoker.set_available(p.available);
                Ok(Arc::new(invoker))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Invoker;
    use crate::routing::ConditionRouterFactory;

    fn rule(name: &str) -> RuleConfig {
        RuleConfig {
            name: name.into(),
            scope: Scope::Service,
            service: Some("com.foo.BarService".into()),
            application: None,
            rule: "host = 1.1.1.1 => host = $host".into(),
            force: false,
            priority: 3,
            enabled: true,
            runtime: false,
        }
    }

    #[test]
    fn test_rule_config_builds_router() {
        let url = rule("r1").to_config_url();
        let router = ConditionRouterFactory::application().build(&url).unwrap();
        assert_eq!(router.scope(), Scope::Service);
        assert_eq!(router.key(), "com.foo.BarService");
        assert_eq!(router.priority(), 3);
        assert!(!router.force());
        assert_eq!(router.rule().to_string(), "host = 1.1.1.1 => host = $host");
    }

    #[test]
    fn test_application_rule_url() {
        let mut cfg = rule("r2");
        cfg.scope = Scope::Application;
        cfg.service = None;
        cfg.application = Some("shop".into());
        let router = ConditionRouterFactory::service()
            .build(&cfg.to_config_url())
            .unwrap();
        assert_eq!(router.scope(), Scope::Application);
        assert_eq!(router.key(), "shop");
    }

    #[test]
    fn test_build_invokers() {
        let config = RouterConfig {
            providers: vec![
                ProviderConfig {
                    url: "dubbo://10.0.0.1:20880/com.foo.BarService".into(),
                    available: true,
                },
                ProviderConfig {
                    url: "dubbo://10.0.0.2:20880/com.foo.BarService".into(),
                    available: false,
                },
            ],
            ..RouterConfig::default()
        };
        let invokers = config.build_invokers().unwrap();
        assert_eq!(invokers.len(), 2);
        assert!(invokers[0].is_available());
        assert!(!invokers[1].is_available());
        assert_eq!(invokers[1].url().host(), "10.0.0.2");
    }
}
