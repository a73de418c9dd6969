//! # Server Module
//!
//! Host HTTP layer on `may_minihttp`. Each connection runs on its own `may`
//! coroutine; [`AppService`] parses the request into a
//! [`RawRequest`](crate::dispatcher::RawRequest), dispatches it, runs the
//! handler inline and writes the [`Rendered`](crate::render::Rendered)
//! response.
//!
//! [`AppService::handle`] is the same pipeline without a socket, which is
//! what the integration tests drive.
//!
//! ```rust,ignore
//! let dispatcher = Arc::new(Dispatcher::new(Arc::new(catalog))?);
//! let handle = HttpServer(AppService::new(dispatcher)).start("127.0.0.1:8080")?;
//! handle.wait_ready()?;
//! handle.join().ok();
//! ```

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{build_raw_request, parse_request};
pub use response::write_rendered;
pub use service::AppService;
