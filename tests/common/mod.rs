//! Shared utilities for routing integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use condition_router::endpoint::{Invocation, Invoker, RpcError, RpcResult, ServiceUrl};
use condition_router::routing::factory::{encode_rule, FORCE_KEY, RULE_KEY};
use serde_json::json;

pub const ANY_URL: &str = "condition://0.0.0.0/com.foo.BarService";

/// Stand-in for the local address of the calling host.
pub const LOCAL_IP: &str = "172.16.8.20";

/// Invoker that fails until it has been called `success_after` times.
#[derive(Debug)]
pub struct MockInvoker {
    url: ServiceUrl,
    available: AtomicBool,
    calls: AtomicUsize,
    success_after: usize,
}

impl MockInvoker {
    pub fn new(url: ServiceUrl, success_after: usize) -> Self {
        Self {
            url,
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            success_after,
        }
    }
}

impl Invoker for MockInvoker {
    fn url(&self) -> &ServiceUrl {
        &self.url
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn invoke(&self, _invocation: &dyn Invocation) -> RpcResult {
        let tried = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if tried >= self.success_after {
            Ok(json!({ "tried": tried }))
        } else {
            Err(RpcError::Remote("error".into()))
        }
    }

    fn destroy(&self) {
        self.available.store(false, Ordering::Relaxed);
    }
}

pub fn url(text: &str) -> ServiceUrl {
    ServiceUrl::parse(text).unwrap()
}

/// Configuration url carrying `rule` with force=true.
pub fn route_url(rule: &str) -> ServiceUrl {
    route_url_with_force(rule, "true")
}

#[allow(dead_code)]
pub fn route_url_with_force(rule: &str, force: &str) -> ServiceUrl {
    route_url_without_force(rule).with_param(FORCE_KEY, force)
}

#[allow(dead_code)]
pub fn route_url_without_force(rule: &str) -> ServiceUrl {
    url(ANY_URL).with_param(RULE_KEY, encode_rule(rule))
}

pub fn consumer(host: &str) -> ServiceUrl {
    url(&format!("consumer://{}/com.foo.BarService", host))
}
