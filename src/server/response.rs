use dashmap::DashMap;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::render::Rendered;

/// `may_minihttp` only takes `'static` header lines. Each distinct line is
/// leaked once and reused; the set is bounded by the fixed headers plus one
/// `Allow` line per distinct verb set.
static HEADER_LINES: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);

pub(crate) fn header_line(name: &str, value: &str) -> &'static str {
    let line = format!("{name}: {value}");
    if let Some(existing) = HEADER_LINES.get(&line) {
        return *existing;
    }
    *HEADER_LINES
        .entry(line.clone())
        .or_insert_with(|| Box::leak(line.into_boxed_str()))
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Write a rendered response. Callers bound a streamed body first with
/// [`Rendered::buffered`]; anything left streaming is pulled to its end here.
pub fn write_rendered(res: &mut Response, rendered: Rendered) {
    let status = rendered.status;
    res.status_code(usize::from(status), status_reason(status));
    for (name, value) in &rendered.headers {
        res.header(header_line(name, value));
    }
    let body = rendered.into_bytes();
    debug!(status, body_size_bytes = body.len(), "Response written");
    res.body_vec(body);
}
