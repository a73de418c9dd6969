//! # Render Module
//!
//! Turns a [`HandlerOutcome`](crate::flow::HandlerOutcome) or a
//! [`DispatchError`](crate::dispatcher::DispatchError) into a [`Rendered`]
//! response the server can write.
//!
//! Every response carries the same CORS headers and, when it has a body,
//! `Content-Type: application/json; charset=utf-8`. JSON is encoded with
//! sorted keys and a four-space indent.
//!
//! ## Bodies
//!
//! | Outcome                 | Body                                          |
//! |-------------------------|-----------------------------------------------|
//! | success, JSON payload   | [`Body::Full`] with an exact length           |
//! | success, stream payload | [`Body::Stream`], a JSON array chunk by chunk |
//! | success, 204            | [`Body::Empty`]                               |
//! | failure                 | `{"code": .., "message": ..}`                 |
//! | fault                   | 500 with a six-character correlation id       |
//!
//! A host that must know the body length up front drains a stream with
//! [`Rendered::buffered`], which turns a stream larger than its limit into
//! a fault instead of holding it all in memory.
//!
//! A fault is logged as three error records (message, arguments and the
//! error chain) all tagged with the same correlation id, so an operator can
//! find them from the id the client reports.

mod core;
mod json;

pub use core::{
    render_dispatch_error, render_fault, render_outcome, render_preflight, Body, Header, Rendered,
    StreamBody, CONTENT_TYPE_JSON, CORS_HEADERS, DEFAULT_MAX_STREAM_BYTES,
};
pub use json::to_pretty_vec;
