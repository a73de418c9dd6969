use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Lazy sequence of JSON values rendered as an incrementally emitted array.
///
/// An `Err` item aborts the stream; the renderer logs it as a fault.
pub struct JsonStream(Box<dyn Iterator<Item = anyhow::Result<Value>> + Send>);

impl JsonStream {
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<Value>>,
        I::IntoIter: Send + 'static,
    {
        Self(Box::new(iter.into_iter()))
    }
}

impl Iterator for JsonStream {
    type Item = anyhow::Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl fmt::Debug for JsonStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonStream(..)")
    }
}

/// What a handler hands back alongside its status.
#[derive(Debug)]
pub enum Payload {
    Empty,
    Json(Value),
    Stream(JsonStream),
}

/// The terminal signal: the only way a handler body reports its outcome.
///
/// The status is resolved against the operation's response table; 2xx is
/// success, anything else a declared failure.
#[derive(Debug)]
#[must_use]
pub struct Respond {
    status: u16,
    payload: Payload,
}

impl Respond {
    /// Terminate with `status` and no payload.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            payload: Payload::Empty,
        }
    }

    /// Terminate with a single JSON value.
    pub fn json(status: u16, payload: impl Into<Value>) -> Self {
        Self {
            status,
            payload: Payload::Json(payload.into()),
        }
    }

    /// Terminate with any serializable value.
    pub fn serialize<T: Serialize + ?Sized>(status: u16, payload: &T) -> anyhow::Result<Self> {
        Ok(Self::json(status, serde_json::to_value(payload)?))
    }

    /// Terminate with a lazy sequence, streamed as a JSON array.
    pub fn stream<I, V>(status: u16, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        I::IntoIter: Send + 'static,
        V: Into<Value>,
    {
        Self::try_stream(status, items.into_iter().map(|v| Ok(v.into())))
    }

    /// Like [`Respond::stream`] for sequences whose items can fail.
    pub fn try_stream<I>(status: u16, items: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<Value>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            status,
            payload: Payload::Stream(JsonStream::new(items)),
        }
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub fn into_parts(self) -> (u16, Payload) {
        (self.status, self.payload)
    }
}
