//! Helpers for unit-testing operations without an HTTP round trip.
//!
//! [`call_endpoint`] runs one operation's handler with an explicit parameter
//! map, skipping routing and injection. A streamed payload is drained into a
//! JSON array so the result can be compared directly:
//!
//! ```rust,ignore
//! let outcome = call_endpoint(&catalog, "Calc", "Sequence", "upto", json!({"n": 3}))?;
//! assert_eq!(outcome.json(), Some(&json!([1, 2, 3])));
//! ```

use anyhow::{anyhow, bail};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::api::Catalog;
use crate::dispatcher::invoke;
use crate::flow::{Call, HandlerOutcome, Payload};

/// Run `operation` of `resource` (declared under the API named `api`) with
/// `params`, which must be a JSON object or `null`.
///
/// # Errors
///
/// Fails if the operation is not registered or `params` is not an object.
/// Handler errors are not errors here: they come back as
/// [`HandlerOutcome::Fault`].
pub fn call_endpoint(
    catalog: &Arc<Catalog>,
    api: &str,
    resource: &str,
    operation: &str,
    params: Value,
) -> anyhow::Result<HandlerOutcome> {
    let resource_def = catalog
        .resources()
        .find(|r| r.api == api && r.name == resource)
        .ok_or_else(|| anyhow!("no resource `{resource}` under API `{api}`"))?;
    let op = resource_def
        .operations
        .iter()
        .find(|o| o.name == operation)
        .ok_or_else(|| anyhow!("resource `{resource}` has no operation `{operation}`"))?;

    let params = match params {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => bail!("parameters must be a JSON object, got {other}"),
    };

    let mut call = Call::new(
        Arc::from(format!("{api}.{operation}")),
        Arc::clone(catalog),
        params.into_iter().collect(),
    );
    Ok(collect_stream(invoke(op, &mut call)))
}

/// Drain a streamed success into `Payload::Json(Value::Array)`. A failing
/// element turns the whole outcome into a fault.
#[must_use]
pub fn collect_stream(outcome: HandlerOutcome) -> HandlerOutcome {
    match outcome {
        HandlerOutcome::Success {
            status,
            message,
            payload: Payload::Stream(stream),
        } => match stream.collect::<anyhow::Result<Vec<Value>>>() {
            Ok(items) => HandlerOutcome::Success {
                status,
                message,
                payload: Payload::Json(Value::Array(items)),
            },
            Err(err) => HandlerOutcome::Fault(err),
        },
        other => other,
    }
}
