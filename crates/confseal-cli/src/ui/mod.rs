//! UI primitives for the confseal CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, width, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badge tokens and colors
//! - **Render**: Tables, headers, hints, error lines
//! - **Progress**: Spinner for the verify pass
//!
//! # Usage
//!
//! ```ignore
//! use crate::ui::{UiContext, Badge};
//! use crate::ui::render::{header, table, badge, hint};
//!
//! let ctx = UiContext::from_env(args.json, cli.no_color, cli.ascii);
//!
//! if ctx.mode.is_json() {
//!     // Handle JSON output separately
//!     return Ok(());
//! }
//!
//! println!("{}", header(&ctx, "status", Some("config")));
//! println!("{}", table(&ctx, &columns, &rows));
//! println!("{}", hint(&ctx, "confseal decrypt"));
//! ```

mod context;
mod mode;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::OutputMode;
pub use theme::Badge;

pub use render::{badge, field, header, hint, kv, print, print_error, table, Column};

pub use progress::Spinner;
