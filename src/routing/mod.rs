//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration url (rule=<base64>, force, priority, ...)
//!     → factory.rs (decode payload, read metadata)
//!     → rule.rs (parse "when => then" into conditions)
//!     → router.rs (immutable ConditionRouter)
//!     → table.rs (published snapshot, last good kept on failure)
//!
//! Per call:
//!     router.route(invokers, consumer, invocation)
//!     → matcher.rs (when side against the consumer)
//!     → matcher.rs (then side against each provider)
//!     → force policy on empty result
//!     → filtered invokers to load balancing
//! ```
//!
//! # Design Decisions
//! - Rules compiled once per configuration push, immutable at runtime
//! - No regex in hot path (single-wildcard prefix/suffix matching only)
//! - Deterministic: same input always yields the same survivors, in order

pub mod error;
pub mod factory;
pub mod matcher;
pub mod router;
pub mod rule;
pub mod table;

pub use error::MalformedRuleError;
pub use factory::ConditionRouterFactory;
pub use matcher::MatchContext;
pub use router::{ConditionRouter, RouterOptions, Scope};
pub use rule::{Clause, Condition, MatchValue, Rule, ValueGroup};
pub use table::RouterTable;
