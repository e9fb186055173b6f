//! Provider handle abstraction.
//!
//! # Responsibilities
//! - Represent a single callable provider instance
//! - Expose its URL and availability to routing
//! - Track destruction (destroyed invokers are never available again)
//!
//! # Design Decisions
//! - Routing reads `url()` only; `invoke` belongs to the caller after filtering
//! - Availability is an atomic flag so handles can be shared via Arc

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{json, Value};
use thiserror::Error;

use crate::endpoint::invocation::Invocation;
use crate::endpoint::url::ServiceUrl;

/// Errors returned by [`Invoker::invoke`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The invoker was destroyed or marked unavailable.
    #[error("invoker {0} is not available")]
    Unavailable(String),

    /// The remote side reported a failure.
    #[error("remote call failed: {0}")]
    Remote(String),
}

pub type RpcResult = Result<Value, RpcError>;

/// A callable remote endpoint.
pub trait Invoker: Send + Sync + std::fmt::Debug {
    fn url(&self) -> &ServiceUrl;

    fn is_available(&self) -> bool;

    fn invoke(&self, invocation: &dyn Invocation) -> RpcResult;

    fn destroy(&self);
}

/// Invoker backed by a fixed URL, without a transport.
///
/// `invoke` answers with a dry-run description of the call.
#[derive(Debug)]
pub struct StaticInvoker {
    url: ServiceUrl,
    available: AtomicBool,
}

impl StaticInvoker {
    pub fn new(url: ServiceUrl) -> Self {
        Self {
            url,
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }
}

impl Invoker for StaticInvoker {
    fn url(&self) -> &ServiceUrl {
        &self.url
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn invoke(&self, invocation: &dyn Invocation) -> RpcResult {
        if !self.is_available() {
            return Err(RpcError::Unavailable(self.url.to_string()));
        }
        Ok(json!({
            "provider": self.url.to_string(),
            "method": invocation.method_name(),
            "arguments": invocation.arguments(),
        }))
    }

    fn destroy(&self) {
        tracing::info!(url = %self.url, "Destroy invoker");
        self.available.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::invocation::RpcInvocation;

    #[test]
    fn test_static_invoker_echo() {
        let url = ServiceUrl::parse("dubbo://10.20.3.3:20880/com.foo.BarService").unwrap();
        let invoker = StaticInvoker::new(url);
        let inv = RpcInvocation::new()
            .with_method_name("getFoo")
            .with_arguments(vec![json!(1)]);

        let result = invoker.invoke(&inv).unwrap();
        assert_eq!(result["method"], "getFoo");
        assert_eq!(result["provider"], "dubbo://10.20.3.3:20880/com.foo.BarService");
    }

    #[test]
    fn test_destroyed_invoker_is_unavailable() {
        let url = ServiceUrl::parse("dubbo://10.20.3.3:20880/com.foo.BarService").unwrap();
        let invoker = StaticInvoker::new(url);
        assert!(invoker.is_available());

        invoker.destroy();
        assert!(!invoker.is_available());
        assert!(matches!(
            invoker.invoke(&RpcInvocation::new()),
            Err(RpcError::Unavailable(_))
        ));
    }
}
