//! # CLI Module
//!
//! Command-line entry points for a swaggery service.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Run the boot checks, mount the configured APIs and serve them:
//!
//! ```bash
//! swaggery --config swaggery.yaml serve --addr 0.0.0.0:8080
//! ```
//!
//! Startup is refused when the checks report any error, unless
//! `application.disable_boot_checks` is set.
//!
//! ### `check`
//!
//! Run the consistency checks and print the findings grouped by severity.
//! Exits non-zero when an error is found:
//!
//! ```bash
//! swaggery check --errors-only
//! ```
//!
//! ### `routes`
//!
//! Print the method, path template and handler of every mounted route.
//!
//! ### `introspect`
//!
//! Print the swagger 1.2 resource listing, or the declaration of one API:
//!
//! ```bash
//! swaggery introspect
//! swaggery introspect calc --host api.example.org
//! ```
//!
//! ## Usage from Code
//!
//! The `swaggery` binary only knows the introspection API. Services declare
//! their own APIs on a [`Catalog`](crate::api::Catalog) and hand it over:
//!
//! ```rust,ignore
//! use clap::Parser;
//! use swaggery::cli::{run_cli_with, Cli};
//!
//! let mut catalog = swaggery::api::Catalog::new()?;
//! calc::register(&mut catalog)?;
//! run_cli_with(Cli::parse(), catalog)?;
//! ```

mod commands;

pub use commands::{run_cli, run_cli_with, serve, Cli, Commands};
