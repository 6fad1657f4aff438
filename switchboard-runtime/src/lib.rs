//! Switchboard Runtime
//!
//! Environment bootstrap and the interactive shell that drive a
//! [`switchboard_core::Agent`] from the terminal.

pub mod bootstrap;
pub mod shell;

// Re-export core types for convenience
pub use switchboard_core;
