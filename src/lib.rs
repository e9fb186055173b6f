//! Condition-based traffic routing for RPC clients.
//!
//! For every outgoing call, decides which of the currently known provider
//! endpoints may receive it, according to `when => then` rules such as
//! `host = 10.0.0.* => host = $host`.

pub mod config;
pub mod endpoint;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use endpoint::{Invocation, Invoker, RpcInvocation, ServiceUrl};
pub use routing::{ConditionRouter, ConditionRouterFactory, MalformedRuleError, RouterTable};
