//! CLI subcommands.

pub mod apply;
pub mod plan;
pub mod verify;
