use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::request::parse_request;
use super::response::write_rendered;
use crate::dispatcher::{DispatchError, Dispatcher, RawRequest};
use crate::render::{
    render_dispatch_error, render_outcome, render_preflight, Rendered, DEFAULT_MAX_STREAM_BYTES,
};

/// The `may_minihttp` service: one clone per connection, all sharing the
/// dispatcher.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
    /// Streamed bodies are buffered up to this many bytes before writing
    pub max_stream_bytes: usize,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            max_stream_bytes: DEFAULT_MAX_STREAM_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_stream_bytes(mut self, limit: usize) -> Self {
        self.max_stream_bytes = limit;
        self
    }

    /// Serve one request end to end without touching a socket.
    ///
    /// `OPTIONS` on a routed path that declares no `OPTIONS` operation is a
    /// CORS preflight and answers 204.
    pub fn handle(&self, req: &RawRequest) -> Rendered {
        let start = Instant::now();
        let rendered = match self.dispatcher.dispatch(req) {
            Ok(mut prepared) => {
                let outcome = prepared.run();
                render_outcome(outcome, prepared.call())
            }
            Err(DispatchError::MethodNotAllowed { .. }) if req.method == Method::OPTIONS => {
                render_preflight()
            }
            Err(err) => {
                if matches!(
                    err,
                    DispatchError::NotFound { .. } | DispatchError::MethodNotAllowed { .. }
                ) {
                    warn!(method = %req.method, path = %req.path, error = %err, "Routing failed");
                }
                render_dispatch_error(&err)
            }
        };
        info!(
            method = %req.method,
            path = %req.path,
            status = rendered.status,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Request handled"
        );
        rendered
    }
}

impl std::fmt::Debug for AppService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppService")
            .field("dispatcher", &self.dispatcher)
            .field("max_stream_bytes", &self.max_stream_bytes)
            .finish()
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let raw = parse_request(req)?;
        // `may_minihttp` writes Content-Length from the finished body, so a
        // stream is buffered here, up to the configured limit.
        let rendered = self.handle(&raw).buffered(self.max_stream_bytes);
        write_rendered(res, rendered);
        Ok(())
    }
}
