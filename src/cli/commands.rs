use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::Catalog;
use crate::checker::{check_catalog, has_errors, print_check_issues, CheckSeverity};
use crate::config::{AppConfig, LogFormat};
use crate::dispatcher::Dispatcher;
use crate::render::to_pretty_vec;
use crate::server::{AppService, HttpServer, ServerHandle};
use crate::telemetry::init_logging;

/// Command-line interface for a swaggery service
#[derive(Debug, Parser)]
#[command(name = "swaggery")]
#[command(about = "Serve and inspect declarative swaggery APIs", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "SWAGGERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address and port to bind, overriding the configuration
        #[arg(long)]
        addr: Option<String>,
    },
    /// Run the consistency checks over every registered declaration
    Check {
        /// Show only errors (hide warnings)
        #[arg(long, default_value_t = false)]
        errors_only: bool,
    },
    /// Print the routing table
    Routes,
    /// Print the resource listing, or the declaration of one API
    Introspect {
        /// API path to describe; omit for the resource listing
        api_path: Option<String>,

        /// Host used for the declaration's basePath
        #[arg(long, default_value = "localhost")]
        host: String,
    },
}

/// Parse the process arguments and run against a catalog holding only the
/// built-in introspection API.
pub fn run_cli() -> anyhow::Result<()> {
    let catalog = Catalog::new().context("Failed to build the catalog")?;
    run_cli_with(Cli::parse(), catalog)
}

/// Run `cli` against `catalog`. Binaries embedding their own APIs register
/// them on the catalog first.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read or parsed
/// - `check` (or the boot checks of `serve`) finds errors
/// - The route table cannot be built
/// - The server fails to start
pub fn run_cli_with(cli: Cli, catalog: Catalog) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let format = match cli.command {
        Commands::Serve { .. } => config.application.log_format,
        _ => LogFormat::Pretty,
    };
    if let Err(e) = init_logging(&config.application.log_level, format) {
        eprintln!("Logging not initialised: {e:#}");
    }

    match cli.command {
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                config.application.addr = addr;
            }
            let handle = serve(&config, catalog)?;
            handle
                .join()
                .map_err(|e| anyhow!("Server coroutine panicked: {e:?}"))
        }
        Commands::Check { errors_only } => {
            let mut issues = check_catalog(&catalog);
            if errors_only {
                issues.retain(|i| i.severity == CheckSeverity::Error);
            }
            print_check_issues(&issues);
            if has_errors(&issues) {
                bail!("Declarations failed the consistency checks");
            }
            Ok(())
        }
        Commands::Routes => {
            let dispatcher = Dispatcher::with_apis(Arc::new(catalog), &config.apis)?;
            for route in dispatcher.router().routes() {
                println!(
                    "{:<7} {:<40} -> {}",
                    route.method.as_str(),
                    route.template,
                    route.handler_id
                );
            }
            Ok(())
        }
        Commands::Introspect { api_path, host } => {
            let doc = match api_path {
                None => catalog.introspector().resource_listing(&catalog),
                Some(path) => catalog
                    .introspector()
                    .api_declaration(&catalog, &path, Some(&host))?
                    .as_ref()
                    .clone(),
            };
            println!("{}", String::from_utf8_lossy(&to_pretty_vec(&doc)?));
            Ok(())
        }
    }
}

/// Configure the runtime, run the boot checks and start serving `catalog`.
pub fn serve(config: &AppConfig, catalog: Catalog) -> anyhow::Result<ServerHandle> {
    config.runtime.apply();

    if config.application.disable_boot_checks {
        info!("Boot checks disabled");
    } else {
        let issues = check_catalog(&catalog);
        if has_errors(&issues) {
            error!(issues = issues.len(), "Boot checks failed, refusing to start");
            bail!("Declarations failed the consistency checks; run `swaggery check` for details");
        }
    }

    let dispatcher = Dispatcher::with_apis(Arc::new(catalog), &config.apis)?;
    info!(routes = dispatcher.router().len(), "Dispatcher ready");
    let service = AppService::new(Arc::new(dispatcher))
        .with_max_stream_bytes(config.application.max_stream_bytes);
    let handle = HttpServer(service)
        .start(config.application.addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.application.addr))?;
    Ok(handle)
}
