//! # Dispatcher Module
//!
//! Turns an incoming request into a running operation.
//!
//! ## Overview
//!
//! The [`Dispatcher`] owns the route table built from the catalog's leaf
//! resources and, for every request:
//!
//! 1. matches method and path against the table (404 / 405 on failure);
//! 2. injects each declared parameter from its location: path captures,
//!    query string, headers (case-insensitive), form fields, or the whole
//!    body decoded as JSON for the single `body` parameter;
//! 3. returns a [`PreparedCall`] that drives the handler when run.
//!
//! String facets are coerced to the parameter's native model type. A
//! missing required parameter or an undecodable body is a
//! [`DispatchError`] with status 400; a missing optional parameter takes
//! its declared `defaultValue`, if any.
//!
//! ## Running a handler
//!
//! [`PreparedCall::run`] (and [`invoke`], used directly by tests) call the
//! handler under `catch_unwind` and resolve its result against the
//! operation's response table:
//!
//! ```rust,ignore
//! let mut prepared = dispatcher.dispatch(&RawRequest::get("/calc/add/1/2"))?;
//! match prepared.run() {
//!     HandlerOutcome::Success { status, payload, .. } => { /* render */ }
//!     HandlerOutcome::Failure { status, message } => { /* {code, message} */ }
//!     HandlerOutcome::Fault(err) => { /* 500 with a correlation id */ }
//! }
//! ```
//!
//! Handlers run on whatever coroutine calls `run`; under the HTTP server
//! that is the connection's `may` coroutine, so a handler that calls
//! [`Call::suspend`](crate::flow::Call::suspend) yields to other
//! connections on the same worker.

mod core;

pub use core::{
    invoke, parse_urlencoded, DispatchError, Dispatcher, HeaderVec, PreparedCall, RawRequest,
    MAX_INLINE_HEADERS,
};
