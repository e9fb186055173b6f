//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! rule file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (rules parse, targets named, urls valid)
//!     → RouterConfig (validated, immutable)
//!     → RuleConfig::to_config_url → routing::factory
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → sent to the consumer, which swaps its RouterTable
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{LogFormat, LoggingConfig, ProviderConfig, RouterConfig, RuleConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
