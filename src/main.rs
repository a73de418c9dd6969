//! `swaggery` binary: serves and inspects the built-in introspection API.
//!
//! Services with their own APIs build a catalog and call
//! [`swaggery::cli::run_cli_with`] from their own `main`.

fn main() -> anyhow::Result<()> {
    swaggery::cli::run_cli()
}
