//! # API Module
//!
//! Declarations of APIs, Resources and Operations, and the [`Catalog`]
//! that holds them.
//!
//! ## Overview
//!
//! An **API** groups resources under one base path and carries a version.
//! A **Resource** is one URL template under that path (`<name>`
//! placeholders) exposing one operation per HTTP verb. An **Operation** is
//! a handler plus the statically declared metadata the dispatcher and the
//! introspection endpoints read: parameter locations and models, and the
//! response table.
//!
//! ## Declaring an API
//!
//! ```rust
//! use http::Method;
//! use swaggery::api::{ApiDef, Catalog, OperationDef, ParameterMeta, ResourceDef};
//! use swaggery::flow::Respond;
//! use swaggery::model::{ModelRef, NativeType};
//!
//! let mut catalog = Catalog::new()?;
//! catalog.register_api(ApiDef::new("Calc", "calc", "1.0").doc("Simple calculator."))?;
//! catalog.register_resource(
//!     ResourceDef::new("Double", "Calc")
//!         .subpath("double/<n>")
//!         .doc("Double a number.")
//!         .operation(
//!             OperationDef::new("double", Method::GET, |call| {
//!                 let n: i64 = call.param_as("n")?;
//!                 Ok(Respond::json(200, n * 2))
//!             })
//!             .doc("Return twice the number.")
//!             .param(ParameterMeta::path("n", ModelRef::native(NativeType::Integer, "A number.")))
//!             .response(200, "Ok", Some("integer")),
//!         ),
//! )?;
//! # Ok::<(), swaggery::registry::RegistryError>(())
//! ```
//!
//! Registration replaces the class-creation hooks a dynamic language would
//! use: each declaration is registered once, optionally as a specialisation
//! of an earlier one, and only leaves are ever mounted.

mod catalog;
mod types;

pub use catalog::Catalog;
pub use types::{
    split_doc, ApiDef, Handler, OperationDef, ParamLocation, ParameterMeta, ResourceDef,
    ResponseMeta,
};
