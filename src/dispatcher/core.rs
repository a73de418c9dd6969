use anyhow::anyhow;
use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{Catalog, OperationDef, ParamLocation, ParameterMeta};
use crate::flow::{Call, HandlerOutcome};
use crate::introspection::INTROSPECTION_PATH;
use crate::router::{ParamVec, Route, RouteError, RouteMatch, RouteMiss, Router};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The facets of an HTTP request the dispatcher reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    pub query: ParamVec,
    pub headers: HeaderVec,
    pub form: ParamVec,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Build a request from a method and a request target, which may carry
    /// a query string.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, qs)) => (path, parse_urlencoded(qs.as_bytes())),
            None => (target, ParamVec::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderVec::new(),
            form: ParamVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn form(mut self, name: &str, value: &str) -> Self {
        self.form.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value, case-insensitively.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query value; the last occurrence wins.
    #[must_use]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Form field; the last occurrence wins.
    #[must_use]
    pub fn get_form(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode an `application/x-www-form-urlencoded` byte string.
#[must_use]
pub fn parse_urlencoded(input: &[u8]) -> ParamVec {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

/// Request-level failures, resolved before any handler runs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("The requested URL {path} was not found on the server.")]
    NotFound { path: String },
    #[error("The method {method} is not allowed for the requested URL.")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },
    #[error("Missing required {location} parameter \"{name}\".")]
    MissingParameter {
        name: String,
        location: ParamLocation,
    },
    #[error("The request body is not valid JSON: {0}")]
    MalformedBody(String),
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::MissingParameter { .. } | DispatchError::MalformedBody(_) => 400,
        }
    }
}

/// A routed request with its parameters injected, ready to run.
#[derive(Debug)]
pub struct PreparedCall {
    route: Arc<Route>,
    call: Call,
}

impl PreparedCall {
    /// Drive the operation to completion. Never panics and never returns
    /// an error: every failure mode is a [`HandlerOutcome`].
    pub fn run(&mut self) -> HandlerOutcome {
        let start = Instant::now();
        debug!(handler_id = %self.route.handler_id, "Handler execution start");
        let outcome = invoke(&self.route.operation, &mut self.call);
        debug!(
            handler_id = %self.route.handler_id,
            status = outcome.status(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Handler execution complete"
        );
        outcome
    }

    #[must_use]
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    #[must_use]
    pub fn call(&self) -> &Call {
        &self.call
    }
}

/// Run an operation's handler against `call`, catching panics, and resolve
/// the result against the operation's response table.
pub fn invoke(op: &OperationDef, call: &mut Call) -> HandlerOutcome {
    let handler = Arc::clone(op.handler());
    let result = match catch_unwind(AssertUnwindSafe(|| handler(call))) {
        Ok(result) => result,
        Err(panic) => Err(anyhow!("handler panicked: {}", panic_message(&*panic))),
    };
    HandlerOutcome::resolve(&op.responses, result)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Binds the route table to incoming requests.
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    router: Router,
}

impl Dispatcher {
    /// Mount every leaf resource of `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Result<Self, RouteError> {
        Self::with_apis(catalog, &[])
    }

    /// Mount the leaf resources whose API path is in `enabled` (all of them
    /// when `enabled` is empty). The introspection API is always mounted.
    pub fn with_apis(catalog: Arc<Catalog>, enabled: &[String]) -> Result<Self, RouteError> {
        let routes = Self::build_routes(&catalog, enabled);
        let router = Router::new(routes)?;
        Ok(Self { catalog, router })
    }

    /// One route per (verb, operation) of every mounted leaf resource.
    #[must_use]
    pub fn build_routes(catalog: &Catalog, enabled: &[String]) -> Vec<Route> {
        let mut routes = Vec::new();
        for resource in catalog.resources() {
            let api_path = resource.api_path();
            if !enabled.is_empty()
                && api_path != INTROSPECTION_PATH
                && !enabled.iter().any(|p| p.trim_matches('/') == api_path)
            {
                debug!(resource = %resource.name, api_path = %api_path, "Resource not enabled");
                continue;
            }
            for op in &resource.operations {
                for method in &op.methods {
                    routes.push(Route::new(method.clone(), resource, op));
                }
            }
        }
        routes
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Resolve `req` to an operation and inject its declared parameters.
    pub fn dispatch(&self, req: &RawRequest) -> Result<PreparedCall, DispatchError> {
        let route_match = self
            .router
            .route(&req.method, &req.path)
            .map_err(|miss| match miss {
                RouteMiss::NotFound => DispatchError::NotFound {
                    path: req.path.clone(),
                },
                RouteMiss::MethodNotAllowed { allowed } => DispatchError::MethodNotAllowed {
                    method: req.method.clone(),
                    path: req.path.clone(),
                    allowed,
                },
            })?;

        let params = inject(&route_match, req).inspect_err(|e| {
            info!(
                handler_id = %route_match.route.handler_id,
                error = %e,
                "Parameter injection failed"
            );
        })?;

        info!(
            method = %req.method,
            path = %req.path,
            handler_id = %route_match.route.handler_id,
            "Request dispatched to handler"
        );

        let call = Call::new(
            Arc::clone(&route_match.route.handler_id),
            Arc::clone(&self.catalog),
            params,
        )
        .with_host(req.get_header("host").map(str::to_string));

        Ok(PreparedCall {
            route: route_match.route,
            call,
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

fn inject(
    route_match: &RouteMatch,
    req: &RawRequest,
) -> Result<BTreeMap<String, Value>, DispatchError> {
    let mut params = BTreeMap::new();
    for param in &route_match.route.operation.parameters {
        let value = match param.location {
            ParamLocation::Path => route_match.get_path_param(&param.name).map(|v| coerce(param, v)),
            ParamLocation::Query => req.get_query(&param.name).map(|v| coerce(param, v)),
            ParamLocation::Header => req.get_header(&param.name).map(|v| coerce(param, v)),
            ParamLocation::Form => req.get_form(&param.name).map(|v| coerce(param, v)),
            ParamLocation::Body => {
                if req.body.iter().all(u8::is_ascii_whitespace) {
                    None
                } else {
                    let body = serde_json::from_slice(&req.body).map_err(|e| {
                        warn!(error = %e, "Malformed JSON body");
                        DispatchError::MalformedBody(e.to_string())
                    })?;
                    Some(body)
                }
            }
        };

        match value {
            Some(value) => {
                params.insert(param.name.clone(), value);
            }
            None if param.required => {
                return Err(DispatchError::MissingParameter {
                    name: param.name.clone(),
                    location: param.location,
                });
            }
            None => {
                if let Some(default) = param.model.default_value() {
                    params.insert(param.name.clone(), default.clone());
                }
            }
        }
    }
    Ok(params)
}

fn coerce(param: &ParameterMeta, raw: &str) -> Value {
    match param.model.native_type() {
        Some(native) => native.coerce(raw),
        None => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}
