//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / config subsystems emit:
//!     → tracing events (structured fields: rule, consumer, service)
//!
//! Binary startup:
//!     → logging.rs installs the subscriber (EnvFilter + fmt)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Hot path logs at debug only; empty-result policy decisions at warn/info

pub mod logging;
