//! # Flow Module
//!
//! How a handler body ends, and how it hands control back to the scheduler
//! while it runs.
//!
//! ## Terminating a handler
//!
//! A handler body returns `anyhow::Result<Respond>`. [`Respond`] carries
//! a status and a [`Payload`]: nothing, a single JSON value, or a lazy
//! [`JsonStream`] that is rendered element by element. The status is then
//! resolved against the operation's declared response table into a
//! [`HandlerOutcome`]:
//!
//! | Handler returns | Outcome |
//! |---|---|
//! | `Ok(Respond)` with a declared 2xx | `Success` |
//! | `Ok(Respond)` with another declared status | `Failure` |
//! | `Ok(Respond)` with an undeclared status | `Fault` |
//! | `Err(_)` or a panic | `Fault` |
//!
//! ## Cooperative suspension
//!
//! Handlers run on `may` coroutines. A body that wants to let other
//! requests progress calls [`Call::suspend`] (or the free [`suspend`]),
//! which yields to the coroutine scheduler. Streams may do the same between
//! elements.

mod call;
mod outcome;
mod respond;

pub use call::{suspend, Call};
pub use outcome::HandlerOutcome;
pub use respond::{JsonStream, Payload, Respond};
