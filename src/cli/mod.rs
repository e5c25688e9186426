//! # CLI Module
//!
//! Command-line front end for the route generator.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Scan the handler tree and write `routegen_gen.rs` next to the entry file:
//!
//! ```bash
//! routegen generate --root . --handler src/handlers
//! ```
//!
//! Options:
//! - `--root <DIR>` - crate root holding `Cargo.toml` (default `.`, env `ROUTEGEN_ROOT`)
//! - `--entry <FILE>` - entry file, `src/lib.rs` or `src/main.rs` when omitted (env `ROUTEGEN_ENTRY`)
//! - `--handler <DIR>` - handler directory (env `ROUTEGEN_HANDLER`)
//! - `--grammar <tag|tag-strict|directive>` - annotation grammar (env `ROUTEGEN_GRAMMAR`)
//! - `--marker <TOKEN>` - directive marker for the `directive` grammar
//! - `--dry-run` - print the module to stdout instead of writing it
//!
//! Flags override `[package.metadata.routegen]`, which overrides the defaults.
//!
//! ### `routes`
//!
//! Print the scanned route table without generating anything:
//!
//! ```bash
//! routegen routes --handler src/api --format yaml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use routegen::cli::{run_cli, Cli};
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{render_table, run_cli, Cli, Commands, TableFormat};
