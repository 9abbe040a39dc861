//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Attach router cache → Apply bindings → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Flush router cache → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then router state, then listeners
//! - The router cache is flushed after the listeners stop, so no request can
//!   race the final write

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
