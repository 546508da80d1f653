//! Application-level utilities for the confseal CLI.
//!
//! This module provides:
//! - Path resolution for the config file and config directory
//! - The per-invocation context with lazily loaded settings
//! - Passphrase acquisition (prompt, env, keychain, tool)

mod context;
mod passphrase;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use passphrase::PassphrasePlan;
pub use resolver::layout_dir_for;
