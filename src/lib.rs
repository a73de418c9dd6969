//! # swaggery
//!
//! **swaggery** serves self-describing declarative HTTP APIs on the `may`
//! coroutine runtime. Every endpoint is declared once, as data, and that
//! single declaration drives routing, parameter injection, response
//! rendering, pre-flight consistency checks and the swagger 1.2 documents
//! served under `/introspect`.
//!
//! ## Architecture
//!
//! - **[`registry`]** - Named registries that reject duplicates and resolve
//!   extension chains
//! - **[`model`]** - Native and custom data models, and the references that
//!   parameters and responses hold to them
//! - **[`api`]** - API, resource and operation declarations, and the
//!   [`Catalog`](api::Catalog) that owns them
//! - **[`flow`]** - What a handler sees ([`Call`](flow::Call)) and how it
//!   terminates ([`Respond`](flow::Respond), resolved into a
//!   [`HandlerOutcome`](flow::HandlerOutcome))
//! - **[`router`]** - Regex path matching over `<placeholder>` templates
//! - **[`dispatcher`]** - Routing plus parameter injection from path, query,
//!   header, form and body
//! - **[`render`]** - Outcomes to status, headers and a full or streamed
//!   JSON body
//! - **[`introspection`]** - The built-in swagger 1.2 API
//! - **[`checker`]** - Consistency checks run at boot and by `swaggery check`
//! - **[`server`]** - The `may_minihttp` service and server handle
//! - **[`config`]** and **[`telemetry`]** - YAML configuration and `tracing`
//!   setup
//! - **[`cli`]** - The `swaggery` command line
//! - **[`testing`]** - Calling operations directly from unit tests
//!
//! ## Request Flow
//!
//! ```text
//! HTTP request
//!   -> server::parse_request        RawRequest (query, headers, form, body)
//!   -> Dispatcher::dispatch         route match + parameter injection
//!   -> PreparedCall::run            handler on the connection coroutine,
//!                                   panics caught, status resolved
//!   -> render::render_outcome       JSON body, or a lazily pulled array
//!   -> server::write_rendered       CORS + Content-Type + body
//! ```
//!
//! A handler can only finish in one of three ways: a declared 2xx status
//! (success, with an optional payload), a declared non-2xx status (rendered
//! as `{"code", "message"}` with the declared message) or anything else,
//! which becomes an opaque 500 with a correlation id in the logs.
//!
//! ## Declaring an API
//!
//! ```rust
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//! use swaggery::api::{ApiDef, Catalog, OperationDef, ParameterMeta, ResourceDef};
//! use swaggery::dispatcher::{Dispatcher, RawRequest};
//! use swaggery::flow::Respond;
//! use swaggery::model::{ModelRef, NativeType};
//! use swaggery::server::AppService;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut catalog = Catalog::new()?;
//! catalog.register_api(ApiDef::new("Calc", "calc", "1.0").doc("Basic arithmetic."))?;
//! catalog.register_resource(
//!     ResourceDef::new("Adder", "Calc")
//!         .subpath("add/<a>")
//!         .doc("Addition.")
//!         .operation(
//!             OperationDef::new("add", Method::GET, |call| {
//!                 let a: i64 = call.param_as("a")?;
//!                 let b: i64 = call.param_as("b")?;
//!                 Ok(Respond::json(200, a + b))
//!             })
//!             .doc("Add two integers.")
//!             .param(ParameterMeta::path("a", ModelRef::native(NativeType::Integer, "Left.")))
//!             .param(ParameterMeta::query("b", ModelRef::native(NativeType::Integer, "Right.")))
//!             .response(200, "Ok", Some("integer")),
//!         ),
//! )?;
//!
//! let service = AppService::new(Arc::new(Dispatcher::new(Arc::new(catalog))?));
//! let rendered = service.handle(&RawRequest::get("/calc/add/2?b=3"));
//! assert_eq!(rendered.status, 200);
//! assert_eq!(rendered.into_bytes(), b"5".to_vec());
//! # Ok(())
//! # }
//! ```
//!
//! To serve it, hand the catalog to [`cli::run_cli_with`] or
//! [`cli::serve`].

pub mod api;
pub mod checker;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod flow;
mod ids;
pub mod introspection;
pub mod model;
pub mod registry;
pub mod render;
pub mod router;
pub mod server;
pub mod telemetry;
pub mod testing;
