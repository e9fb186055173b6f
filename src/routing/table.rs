//! Published set of condition routers.
//!
//! # Responsibilities
//! - Hold the current routers in chain order
//! - Replace them atomically when configuration changes
//! - Keep the last good set when an update carries a malformed rule
//!
//! # Design Decisions
//! - Readers load an `Arc` snapshot (arc-swap), never a lock
//! - An update is all-or-nothing: one bad rule rejects the whole batch

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::endpoint::{Invocation, Invoker, ServiceUrl};
use crate::routing::error::MalformedRuleError;
use crate::routing::factory::ConditionRouterFactory;
use crate::routing::router::{sort_by_priority, ConditionRouter};

pub type RouterSnapshot = Arc<Vec<Arc<ConditionRouter>>>;

#[derive(Debug)]
pub struct RouterTable {
    routers: ArcSwap<Vec<Arc<ConditionRouter>>>,
}

impl Default for RouterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterTable {
    pub fn new() -> Self {
        Self {
            routers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// The current routers, lowest priority first.
    pub fn snapshot(&self) -> RouterSnapshot {
        self.routers.load_full()
    }

    pub fn len(&self) -> usize {
        self.routers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.load().is_empty()
    }

    /// Publish `routers`, replacing whatever was there.
    pub fn publish(&self, mut routers: Vec<ConditionRouter>) {
        sort_by_priority(&mut routers);
        let routers: Vec<Arc<ConditionRouter>> = routers.into_iter().map(Arc::new).collect();
        tracing::info!(count = routers.len(), "Published condition routers");
        self.routers.store(Arc::new(routers));
    }

    /// Build a router per url and publish them together.
    ///
    /// On the first malformed rule nothing is published and the current
    /// routers stay in effect.
    pub fn replace_from_urls(
        &self,
        factory: &ConditionRouterFactory,
        urls: &[ServiceUrl],
    ) -> Result<usize, MalformedRuleError> {
        let routers = urls
            .iter()
            .map(|url| factory.build(url))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    current = self.len(),
                    "Rejected router update. Keeping current routers."
                );
            })?;
        let count = routers.len();
        self.publish(routers);
        Ok(count)
    }

    /// Run the applicable routers over `invokers` in priority order.
    pub fn route<I>(
        &self,
        invokers: &[Arc<I>],
        consumer: &ServiceUrl,
        invocation: &dyn Invocation,
    ) -> Vec<Arc<I>>
    where
        I: Invoker + ?Sized,
    {
        let snapshot = self.routers.load();
        snapshot
            .iter()
            .filter(|router| router.is_applicable(consumer))
            .fold(invokers.to_vec(), |current, router| {
                router.route(&current, consumer, invocation)
            })
    }
}
