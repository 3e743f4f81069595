//! # brimley-cli
//!
//! Command-line tool for running a Brimley project: discovering SQL,
//! template, and native functions in a directory tree, dispatching calls
//! against them, and keeping the live registries in sync with the
//! filesystem while the process runs.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `brimley invoke <name>` | Resolve arguments and dispatch one call |
//! | `brimley repl` | Interactive loop over the same dispatch path |
//! | `brimley mcp-serve` | Serve tool-exports over stdio |
//! | `brimley validate` | Discovery-only diagnostics check |
//! | `brimley schema-convert` | Print the advertised tool-export schemas |
//! | `brimley build` | One-shot discover + reload CI check |

pub mod commands;
pub mod project;
