//! Command implementations for the `brimley` CLI. Each submodule
//! corresponds to one subcommand of the `brimley` CLI surface.

pub mod build;
pub mod invoke;
pub mod mcp_serve;
pub mod repl;
pub mod schema_convert;
pub mod validate;
