use std::fmt::{Display, Formatter};

/// Number of characters of a correlation id shown to clients.
pub const SHORT_ID_LEN: usize = 6;

/// Identifier tying a client-visible fault message to its log records.
///
/// Backed by a ULID; clients only see its last [`SHORT_ID_LEN`] characters,
/// which come from the ULID's random part.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct CorrelationId(pub ulid::Ulid);

impl CorrelationId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// The short, uppercase form used in messages and logs.
    #[must_use]
    pub fn short(&self) -> String {
        let full = self.0.to_string();
        full[full.len() - SHORT_ID_LEN..].to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short())
    }
}
