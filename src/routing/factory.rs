//! Router construction from configuration urls.
//!
//! # Responsibilities
//! - Decode the transport-encoded `rule` payload
//! - Read routing metadata (force, priority, enabled, runtime, category, scope)
//! - Build a router, or report why the rule cannot be installed
//!
//! # Design Decisions
//! - One factory type; service and application variants differ only in the
//!   scope used when the url does not name one
//! - `force` defaults to true (strict)
//! - No partially built router is ever returned

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::endpoint::ServiceUrl;
use crate::routing::error::MalformedRuleError;
use crate::routing::router::{ConditionRouter, RouterOptions, Scope};
use crate::routing::rule::Rule;

pub const RULE_KEY: &str = "rule";
pub const FORCE_KEY: &str = "force";
pub const PRIORITY_KEY: &str = "priority";
pub const ENABLED_KEY: &str = "enabled";
pub const RUNTIME_KEY: &str = "runtime";
pub const CATEGORY_KEY: &str = "category";
pub const SCOPE_KEY: &str = "scope";

const DEFAULT_CATEGORY: &str = "routers";

/// URL-safe base64; padding is optional when decoding.
const RULE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode rule text for the `rule` url parameter.
pub fn encode_rule(text: &str) -> String {
    RULE_ENGINE.encode(text.as_bytes())
}

/// Decode the `rule` url parameter into rule text.
pub fn decode_rule(encoded: &str) -> Result<String, MalformedRuleError> {
    let bytes = RULE_ENGINE
        .decode(encoded.trim())
        .map_err(|e| MalformedRuleError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| MalformedRuleError::Decode(e.to_string()))
}

/// Builds [`ConditionRouter`]s from rule-bearing configuration urls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionRouterFactory {
    default_scope: Scope,
}

impl ConditionRouterFactory {
    /// Factory for rules attached to one service.
    pub fn service() -> Self {
        Self {
            default_scope: Scope::Service,
        }
    }

    /// Factory for rules attached to a consumer application.
    pub fn application() -> Self {
        Self {
            default_scope: Scope::Application,
        }
    }

    pub fn default_scope(&self) -> Scope {
        self.default_scope
    }

    pub fn build(&self, config_url: &ServiceUrl) -> Result<ConditionRouter, MalformedRuleError> {
        let encoded = config_url
            .param(RULE_KEY)
            .filter(|r| !r.trim().is_empty())
            .ok_or(MalformedRuleError::MissingRule)?;

        let rule = decode_rule(encoded)
            .and_then(|text| Rule::parse(&text))
            .inspect_err(|e| {
                tracing::warn!(url = %config_url, error = %e, "Rejected condition route rule");
            })?;

        let scope = match config_url.param(SCOPE_KEY) {
            Some(raw) => raw.parse::<Scope>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, fallback = %self.default_scope, "Ignoring scope parameter");
                self.default_scope
            }),
            None => self.default_scope,
        };
        let key = match scope {
            Scope::Service => config_url.service_key(),
            Scope::Application => match config_url.application() {
                "" => {
                    tracing::warn!(
                        url = %config_url,
                        key = config_url.path(),
                        "Application rule has no application parameter, keying on the path"
                    );
                    config_url.path().to_string()
                }
                app => app.to_string(),
            },
        };

        let options = RouterOptions {
            priority: config_url.param_i64(PRIORITY_KEY, 0),
            force: config_url.param_bool(FORCE_KEY, true),
            enabled: config_url.param_bool(ENABLED_KEY, true),
            runtime: config_url.param_bool(RUNTIME_KEY, false),
            scope,
            category: config_url.param_or(CATEGORY_KEY, DEFAULT_CATEGORY).to_string(),
            key,
        };

        tracing::debug!(
            rule = %rule,
            scope = %options.scope,
            key = %options.key,
            priority = options.priority,
            force = options.force,
            "Built condition router"
        );

        Ok(ConditionRouter::new(rule, options).with_url(config_url.clone()))
    }
}

impl Default for ConditionRouterFactory {
    fn default() -> Self {
        Self::service()
    }
}
