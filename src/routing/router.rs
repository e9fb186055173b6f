//! Condition router.
//!
//! # Responsibilities
//! - Hold one parsed rule plus its routing metadata
//! - Decide whether the rule applies to a call (`match_when`)
//! - Filter a provider list with the then side (`route`)
//! - Apply the force policy to empty results
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks); updates
//!   replace the whole router
//! - Stable filter: survivors keep their input order
//! - Empty result + force=false returns the unfiltered list, so an advisory
//!   rule can never strand a caller without providers

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::endpoint::{Invocation, Invoker, ServiceUrl};
use crate::routing::error::MalformedRuleError;
use crate::routing::matcher::{self, MatchContext};
use crate::routing::rule::Rule;

/// What a rule is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One service interface.
    #[default]
    Service,
    /// Every service consumed by one application.
    Application,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Service => "service",
            Scope::Application => "application",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service" => Ok(Scope::Service),
            "application" | "app" => Ok(Scope::Application),
            other => Err(format!("unknown router scope: {}", other)),
        }
    }
}

/// Routing metadata attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// Lower runs first in a chain.
    pub priority: i64,
    /// Honor empty results instead of falling back to all providers.
    pub force: bool,
    pub enabled: bool,
    pub runtime: bool,
    pub scope: Scope,
    pub category: String,
    /// Service key or application name the rule targets. Blank or `*` means all.
    pub key: String,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            priority: 0,
            force: true,
            enabled: true,
            runtime: false,
            scope: Scope::Service,
            category: "routers".to_string(),
            key: String::new(),
        }
    }
}

/// A single condition routing rule, ready to filter providers.
#[derive(Debug, Clone)]
pub struct ConditionRouter {
    url: ServiceUrl,
    rule: Rule,
    options: RouterOptions,
}

impl ConditionRouter {
    pub fn new(rule: Rule, options: RouterOptions) -> Self {
        Self {
            url: ServiceUrl::default(),
            rule,
            options,
        }
    }

    /// Parse `text` and build a router from it.
    pub fn parse(text: &str, options: RouterOptions) -> Result<Self, MalformedRuleError> {
        Ok(Self::new(Rule::parse(text)?, options))
    }

    /// Attach the configuration url the router was built from.
    pub fn with_url(mut self, url: ServiceUrl) -> Self {
        self.url = url;
        self
    }

    pub fn url(&self) -> &ServiceUrl {
        &self.url
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn priority(&self) -> i64 {
        self.options.priority
    }

    pub fn force(&self) -> bool {
        self.options.force
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn runtime(&self) -> bool {
        self.options.runtime
    }

    pub fn scope(&self) -> Scope {
        self.options.scope
    }

    pub fn category(&self) -> &str {
        &self.options.category
    }

    pub fn key(&self) -> &str {
        &self.options.key
    }

    /// Whether the rule targets the consumer's service or application.
    pub fn is_applicable(&self, consumer: &ServiceUrl) -> bool {
        let key = self.options.key.as_str();
        if key.is_empty() || key == "*" {
            return true;
        }
        match self.options.scope {
            Scope::Service => consumer.service_key() == key,
            Scope::Application => consumer.application() == key,
        }
    }

    /// Ascending priority order.
    pub fn compare_priority(&self, other: &Self) -> Ordering {
        self.options.priority.cmp(&other.options.priority)
    }

    /// Does the when side hold for this call?
    pub fn match_when(&self, consumer: &ServiceUrl, invocation: &dyn Invocation) -> bool {
        let ctx = MatchContext::new(consumer, Some(invocation));
        matcher::matches(self.rule.when(), &ctx, &ctx)
    }

    /// Does the then side accept `provider` for a call from `consumer`?
    pub fn match_then(
        &self,
        provider: &ServiceUrl,
        consumer: &ServiceUrl,
        invocation: &dyn Invocation,
    ) -> bool {
        let subject = MatchContext::new(provider, Some(invocation));
        let request = MatchContext::new(consumer, Some(invocation));
        matcher::matches(self.rule.then(), &subject, &request)
    }

    /// Filter `invokers` for one call.
    ///
    /// Returns the input unchanged when the router is disabled or the when
    /// side does not hold. Otherwise keeps the invokers accepted by the then
    /// side, in input order; an empty outcome is returned only when `force`
    /// is set, else the input is returned unfiltered.
    pub fn route<I>(
        &self,
        invokers: &[Arc<I>],
        consumer: &ServiceUrl,
        invocation: &dyn Invocation,
    ) -> Vec<Arc<I>>
    where
        I: Invoker + ?Sized,
    {
        if !self.options.enabled || invokers.is_empty() {
            return invokers.to_vec();
        }
        // A lone invoker survives either way unless the rule is forced.
        if invokers.len() == 1 && !self.options.force {
            return invokers.to_vec();
        }

        if !self.match_when(consumer, invocation) {
            tracing::debug!(
                consumer = %consumer,
                rule = %self.rule,
                "When condition not matched, skipping router"
            );
            return invokers.to_vec();
        }

        let result: Vec<Arc<I>> = invokers
            .iter()
            .filter(|invoker| self.match_then(invoker.url(), consumer, invocation))
            .cloned()
            .collect();

        if !result.is_empty() {
            return result;
        }

        if self.options.force {
            tracing::warn!(
                consumer = %consumer.host(),
                service = %consumer.service_key(),
                rule = %self.rule,
                "The route result is empty and force execute"
            );
            return result;
        }

        tracing::info!(
            consumer = %consumer.host(),
            service = %consumer.service_key(),
            rule = %self.rule,
            candidates = invokers.len(),
            "The route result is empty, ignoring non-forced router"
        );
        invokers.to_vec()
    }
}

/// Sort routers into chain order (ascending priority, stable).
pub fn sort_by_priority(routers: &mut [ConditionRouter]) {
    routers.sort_by(|a, b| a.compare_priority(b));
}
