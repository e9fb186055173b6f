//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every rule parses and names the target its scope needs
//! - Rule names are unique, provider urls parse, log level is a valid filter
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::RouterConfig;
use crate::endpoint::{ServiceUrl, UrlError};
use crate::routing::{MalformedRuleError, Rule, Scope};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rule #{0} has an empty name")]
    EmptyRuleName(usize),

    #[error("duplicate rule name {0:?}")]
    DuplicateRuleName(String),

    #[error("rule {name:?}: {source}")]
    InvalidRule {
        name: String,
        #[source]
        source: MalformedRuleError,
    },

    #[error("rule {0:?} is service scoped but names no service")]
    MissingService(String),

    #[error("rule {0:?} is application scoped but names no application")]
    MissingApplication(String),

    #[error("provider: {0}")]
    InvalidProvider(#[from] UrlError),

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    let mut names = HashSet::new();
    for (index, rule) in config.rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRuleName(index));
        } else if !names.insert(rule.name.as_str()) {
            errors.push(ValidationError::DuplicateRuleName(rule.name.clone()));
        }

        if let Err(source) = Rule::parse(&rule.rule) {
            errors.push(ValidationError::InvalidRule {
                name: rule.name.clone(),
                source,
            });
        }

        match rule.scope {
            Scope::Service if is_blank(&rule.service) => {
                errors.push(ValidationError::MissingService(rule.name.clone()));
            }
            Scope::Application if is_blank(&rule.application) => {
                errors.push(ValidationError::MissingApplication(rule.name.clone()));
            }
            _ => {}
        }
    }

    for provider in &config.providers {
        if let Err(e) = ServiceUrl::parse(&provider.url) {
            errors.push(e.into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
