//! # Router Module
//!
//! Path matching and route resolution for Swaggery resources.
//!
//! ## Overview
//!
//! Every leaf resource contributes one route per (verb, operation) pair. A
//! route's URL template is the resource's endpoint path: `/` + API path +
//! `/` + resource subpath, where the subpath uses `<name>` placeholders.
//!
//! The router works in two phases:
//!
//! 1. **Compilation**: at startup each template (e.g. `/calc/<op>/<a>`) is
//!    compiled into an anchored regex capturing one segment per
//!    placeholder. Templates with the same shape share one entry, which
//!    holds one route per verb; a verb bound twice on one shape is an error.
//!
//! 2. **Matching**: a request path (trailing `/` ignored) is tested against
//!    each compiled template. A template that matches but lacks the verb
//!    yields [`RouteMiss::MethodNotAllowed`] with the verbs it does offer;
//!    no matching template at all yields [`RouteMiss::NotFound`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let router = Router::new(routes)?;
//! match router.route(&Method::GET, "/calc/add/1/2") {
//!     Ok(m) => println!("{} {:?}", m.route.handler_id, m.path_params),
//!     Err(RouteMiss::NotFound) => println!("404"),
//!     Err(RouteMiss::MethodNotAllowed { allowed }) => println!("405 {allowed:?}"),
//! }
//! ```
//!
//! Captured values are percent-decoded; no other URL handling happens here.

mod core;
#[cfg(test)]
mod tests;

pub use core::{ParamVec, Route, RouteError, RouteMatch, RouteMiss, Router, MAX_INLINE_PARAMS};
