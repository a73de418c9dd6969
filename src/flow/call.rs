use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::Catalog;

/// Yield control to the scheduler.
///
/// Inside a `may` coroutine this lets other in-flight requests on the same
/// worker run; on a plain thread it falls back to a thread yield. Carries
/// no value in either direction.
pub fn suspend() {
    if may::coroutine::is_coroutine() {
        may::coroutine::yield_now();
    } else {
        std::thread::yield_now();
    }
}

/// Everything a handler body can see of the request it serves.
pub struct Call {
    handler_id: Arc<str>,
    params: BTreeMap<String, Value>,
    host: Option<String>,
    catalog: Arc<Catalog>,
}

impl Call {
    #[must_use]
    pub fn new(
        handler_id: Arc<str>,
        catalog: Arc<Catalog>,
        params: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            handler_id,
            params,
            host: None,
            catalog,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    /// `"<Api>.<operation>"`.
    #[must_use]
    pub fn handler_id(&self) -> &str {
        &self.handler_id
    }

    /// An injected parameter, already coerced to its declared type.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Deserialize an injected parameter; missing or mistyped values are
    /// errors, which surface as faults unless the handler handles them.
    pub fn param_as<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self
            .params
            .get(name)
            .with_context(|| format!("parameter `{name}` was not injected"))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("parameter `{name}` has an unexpected type"))
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// The parameters as one JSON object, as logged with faults.
    #[must_use]
    pub fn args(&self) -> Value {
        Value::Object(
            self.params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>(),
        )
    }

    /// Value of the request's `Host` header, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Scheduling checkpoint; see [`suspend`].
    pub fn suspend(&self) {
        suspend();
    }
}

impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("handler_id", &self.handler_id)
            .field("params", &self.params)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
