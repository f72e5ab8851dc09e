//! Allow-list access control for jailbot.
//!
//! The authorized identity set is parsed once at startup and never mutated;
//! every inbound chat command is checked against it before any side effect.

pub mod allowlist;

pub use allowlist::*;
