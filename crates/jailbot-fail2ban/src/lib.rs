//! fail2ban-client adapter for jailbot.
//!
//! Builds the fixed `fail2ban-client` invocation templates, runs them through
//! the [`CommandRunner`] seam, classifies their outcome and parses the
//! human-readable status reports into typed snapshots.

pub mod command_outcome;
pub mod command_runner;
pub mod fail2ban_client;
pub mod status_parser;
pub mod validation;

pub use command_outcome::*;
pub use command_runner::*;
pub use fail2ban_client::*;
pub use status_parser::*;
pub use validation::*;
