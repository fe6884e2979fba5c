//! CLI subcommands.

pub mod check;
pub mod classify;
pub mod common;
pub mod run;
pub mod traffic;
