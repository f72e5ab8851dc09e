//! CLI argument models and startup validation for the jailbot binary.
//!
//! Every flag can also be supplied through a `JAILBOT_*` environment
//! variable; [`Cli::into_bot_settings`] turns the parsed flags into the
//! immutable runtime configuration.

pub mod bot_settings;
pub mod cli_args;
pub mod cli_types;

pub use bot_settings::*;
pub use cli_args::Cli;
pub use cli_types::*;
