use http::StatusCode;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::respond::{Payload, Respond};
use crate::api::ResponseMeta;

/// Result of driving one operation to completion.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// Declared 2xx termination.
    Success {
        status: u16,
        message: String,
        payload: Payload,
    },
    /// Declared non-2xx termination.
    Failure { status: u16, message: String },
    /// Anything else: an error, a panic or an undeclared status.
    Fault(anyhow::Error),
}

impl HandlerOutcome {
    /// Resolve what a handler body returned against its response table.
    pub fn resolve(
        responses: &BTreeMap<u16, ResponseMeta>,
        result: anyhow::Result<Respond>,
    ) -> Self {
        let respond = match result {
            Ok(respond) => respond,
            Err(err) => return HandlerOutcome::Fault(err),
        };
        let (status, payload) = respond.into_parts();

        let Ok(code) = StatusCode::from_u16(status) else {
            return HandlerOutcome::Fault(anyhow::anyhow!("invalid HTTP status {status}"));
        };
        let Some(meta) = responses.get(&status) else {
            return HandlerOutcome::Fault(anyhow::anyhow!(
                "status {status} is not declared by the operation"
            ));
        };

        if code.is_success() {
            debug!(status, message = %meta.message, "Declared success");
            HandlerOutcome::Success {
                status,
                message: meta.message.clone(),
                payload,
            }
        } else {
            info!("HTTP:{} --- {}", status, meta.message);
            HandlerOutcome::Failure {
                status,
                message: meta.message.clone(),
            }
        }
    }

    /// HTTP status this outcome renders with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            HandlerOutcome::Success { status, .. } | HandlerOutcome::Failure { status, .. } => {
                *status
            }
            HandlerOutcome::Fault(_) => 500,
        }
    }

    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, HandlerOutcome::Fault(_))
    }

    /// The JSON payload of a success, if there is one.
    #[must_use]
    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            HandlerOutcome::Success {
                payload: Payload::Json(value),
                ..
            } => Some(value),
            _ => None,
        }
    }
}
