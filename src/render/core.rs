use http::Method;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, error};

use super::json::to_pretty_vec;
use crate::dispatcher::DispatchError;
use crate::flow::{Call, HandlerOutcome, JsonStream, Payload};
use crate::ids::CorrelationId;

/// Headers sent with every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Methods",
        "GET, POST, DELETE, PUT, PATCH, OPTIONS",
    ),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, api_key, Authorization",
    ),
];

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Default cap on a streamed body held in memory before it is written (16 MiB).
pub const DEFAULT_MAX_STREAM_BYTES: usize = 16 * 1024 * 1024;

/// Response header: a fixed name and a value that is usually static.
pub type Header = (&'static str, Cow<'static, str>);

/// Wire-ready response.
#[derive(Debug)]
pub struct Rendered {
    pub status: u16,
    pub headers: Vec<Header>,
    pub body: Body,
}

pub enum Body {
    Empty,
    /// Fully encoded body; its length is the exact `Content-Length`.
    Full(Vec<u8>),
    /// Chunks of an incrementally encoded JSON array.
    Stream(StreamBody),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Full(bytes) => write!(f, "Full({} bytes)", bytes.len()),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl Rendered {
    fn new(status: u16, body: Body) -> Self {
        let mut headers: Vec<Header> = CORS_HEADERS
            .iter()
            .map(|&(name, value)| (name, Cow::Borrowed(value)))
            .collect();
        if !matches!(body, Body::Empty) {
            headers.push(("Content-Type", Cow::Borrowed(CONTENT_TYPE_JSON)));
        }
        Self {
            status,
            headers,
            body,
        }
    }

    /// First header named `name`, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }

    /// Exact body length, known up front for monolithic bodies only.
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        match &self.body {
            Body::Empty => Some(0),
            Body::Full(bytes) => Some(bytes.len()),
            Body::Stream(_) => None,
        }
    }

    /// Drain the body, pulling a stream to its end.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self.body {
            Body::Empty => Vec::new(),
            Body::Full(bytes) => bytes,
            Body::Stream(stream) => stream.flatten().collect(),
        }
    }
    /// Pull a streamed body into a [`Body::Full`] of at most `limit` bytes,
    /// for hosts that need the length before the first byte goes out.
    ///
    /// A stream that outgrows `limit` is abandoned and the whole response
    /// becomes a fault, so an endless sequence costs `limit` bytes rather
    /// than the connection.
    #[must_use]
    pub fn buffered(self, limit: usize) -> Rendered {
        let stream = match self.body {
            Body::Stream(stream) => stream,
            body => return Rendered { body, ..self },
        };
        let handler_id = stream.handler_id.clone();
        let mut bytes = Vec::new();
        for chunk in stream {
            if bytes.len() + chunk.len() > limit {
                let err = anyhow::anyhow!("streamed body exceeds {limit} bytes");
                return render_fault(&err, &handler_id, &Value::Null);
            }
            bytes.extend_from_slice(&chunk);
        }
        Rendered {
            body: Body::Full(bytes),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open,
    First,
    Rest,
    Done,
}

/// Iterator of byte chunks rendering a [`JsonStream`] as a JSON array.
///
/// Emits `[`, the first element, then `,` plus a newline before each
/// further element, and `]` once the sequence is exhausted. An element
/// that fails (or cannot be encoded) is logged as a fault and ends the
/// body without the closing bracket, so the client sees a truncated array
/// rather than a well-formed lie.
pub struct StreamBody {
    items: JsonStream,
    state: StreamState,
    handler_id: String,
}

impl StreamBody {
    #[must_use]
    pub fn new(items: JsonStream, handler_id: &str) -> Self {
        Self {
            items,
            state: StreamState::Open,
            handler_id: handler_id.to_string(),
        }
    }
}

impl Iterator for StreamBody {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        match self.state {
            StreamState::Done => None,
            StreamState::Open => {
                debug!(handler_id = %self.handler_id, "Data stream started");
                self.state = StreamState::First;
                Some(b"[".to_vec())
            }
            StreamState::First | StreamState::Rest => {
                let encoded = match self.items.next() {
                    None => {
                        self.state = StreamState::Done;
                        debug!(handler_id = %self.handler_id, "Data stream ended");
                        return Some(b"]".to_vec());
                    }
                    Some(item) => item.and_then(|v| to_pretty_vec(&v).map_err(anyhow::Error::from)),
                };
                match encoded {
                    Ok(bytes) => {
                        let chunk = if self.state == StreamState::First {
                            bytes
                        } else {
                            let mut chunk = Vec::with_capacity(bytes.len() + 2);
                            chunk.extend_from_slice(b",\n");
                            chunk.extend_from_slice(&bytes);
                            chunk
                        };
                        self.state = StreamState::Rest;
                        Some(chunk)
                    }
                    Err(err) => {
                        let id = CorrelationId::new();
                        error!(
                            correlation_id = %id,
                            handler_id = %self.handler_id,
                            error = ?err,
                            "Data stream aborted"
                        );
                        self.state = StreamState::Done;
                        None
                    }
                }
            }
        }
    }
}

fn envelope(status: u16, message: &str) -> Rendered {
    let body = json!({"code": status, "message": message});
    match to_pretty_vec(&body) {
        Ok(bytes) => Rendered::new(status, Body::Full(bytes)),
        Err(_) => Rendered::new(status, Body::Empty),
    }
}

/// Render the outcome of a dispatched call.
#[must_use]
pub fn render_outcome(outcome: HandlerOutcome, call: &Call) -> Rendered {
    match outcome {
        HandlerOutcome::Success {
            status, payload, ..
        } => match payload {
            Payload::Stream(items) => {
                debug!(handler_id = %call.handler_id(), "Starting stream response");
                Rendered::new(status, Body::Stream(StreamBody::new(items, call.handler_id())))
            }
            Payload::Empty if status == 204 => Rendered::new(status, Body::Empty),
            Payload::Empty => monolithic(status, &Value::Null, call),
            Payload::Json(value) => monolithic(status, &value, call),
        },
        HandlerOutcome::Failure { status, message } => envelope(status, &message),
        HandlerOutcome::Fault(err) => render_fault(&err, call.handler_id(), &call.args()),
    }
}

fn monolithic(status: u16, value: &Value, call: &Call) -> Rendered {
    debug!(handler_id = %call.handler_id(), "Starting monolithic response");
    match to_pretty_vec(value) {
        Ok(bytes) => Rendered::new(status, Body::Full(bytes)),
        Err(err) => render_fault(&err.into(), call.handler_id(), &call.args()),
    }
}

/// Render an unhandled fault: log it in full under a fresh correlation id
/// and tell the client only the id.
#[must_use]
pub fn render_fault(err: &anyhow::Error, handler_id: &str, args: &Value) -> Rendered {
    let id = CorrelationId::new();
    let message = format!("Internal server error: 500. Unique error identifier is {id}");
    error!(correlation_id = %id, handler_id = %handler_id, "HTTP 500 [Message - {id}]: {message}");
    error!(correlation_id = %id, handler_id = %handler_id, "HTTP 500 [Arguments - {id}]: {args}");
    error!(correlation_id = %id, handler_id = %handler_id, "HTTP 500 [Traceback - {id}]: {err:?}");
    envelope(500, &message)
}

/// Render a request-level failure as `{code, message}`.
#[must_use]
pub fn render_dispatch_error(err: &DispatchError) -> Rendered {
    let mut rendered = envelope(err.status(), &err.to_string());
    if let DispatchError::MethodNotAllowed { allowed, .. } = err {
        rendered.headers.push(("Allow", Cow::Owned(join_methods(allowed))));
    }
    rendered
}

/// Answer a CORS preflight.
#[must_use]
pub fn render_preflight() -> Rendered {
    Rendered::new(204, Body::Empty)
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
