//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Check binding templates: wildcard names, reference counts, duplicates
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Stricter than `AliasRouter::bind`, which accepts any template

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::compiler::{unknown_placeholders, TemplateShape};
use crate::routing::normalize;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("router.base_path must start with '/', got {0:?}")]
    InvalidBasePath(String),

    #[error("binding {alias:?}: unknown wildcard <:{name}>")]
    UnknownWildcard { alias: String, name: String },

    #[error("binding {alias:?}: route {route:?} has {references} reference(s) but only {wildcards} wildcard(s)")]
    UnpairedReference {
        alias: String,
        route: String,
        references: usize,
        wildcards: usize,
    },

    #[error("binding {0:?} is declared more than once")]
    DuplicateAlias(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if !config.router.base_path.starts_with('/') {
        errors.push(ValidationError::InvalidBasePath(config.router.base_path.clone()));
    }

    let mut seen = HashSet::new();
    for binding in &config.router.bindings {
        errors.extend(check_binding(&binding.alias, &binding.route));

        let alias = normalize(&binding.alias);
        if !seen.insert(alias) {
            errors.push(ValidationError::DuplicateAlias(alias.to_string()));
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Template checks for a single binding, shared with the admin API.
pub fn check_binding(alias: &str, route: &str) -> Vec<ValidationError> {
    let alias = normalize(alias);
    let route = normalize(route);
    let mut errors = Vec::new();

    for name in unknown_placeholders(alias) {
        errors.push(ValidationError::UnknownWildcard {
            alias: alias.to_string(),
            name: name.to_string(),
        });
    }

    let shape = TemplateShape::of(alias, route);
    if shape.unpaired_references() > 0 {
        errors.push(ValidationError::UnpairedReference {
            alias: alias.to_string(),
            route: route.to_string(),
            references: shape.references,
            wildcards: shape.wildcards,
        });
    }

    errors
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
