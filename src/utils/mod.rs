//! Utility modules for common functionality.
//!
//! Logging setup and the drop guard `main` uses to restore the terminal.

pub mod guard;
pub mod logger;
