//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, binding templates)
//!     → AppConfig (validated, immutable)
//!     → router bindings applied in file order
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → watcher.rs forwards it if the router section differs
//!     → server applies the binding diff and swaps router settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the router section is hot reloaded; other sections wait for restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, BindingConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RouterConfig, TimeoutConfig,
};
pub use validation::{check_binding, validate_config, ValidationError};
