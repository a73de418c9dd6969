use http::Method;
use may_minihttp::Request;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatcher::{parse_urlencoded, HeaderVec, RawRequest};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build a [`RawRequest`] from already-extracted request parts.
///
/// `target` may carry a query string. When the content type is
/// `application/x-www-form-urlencoded` the body is also decoded into form
/// fields; the raw bytes are kept either way.
pub fn build_raw_request<'a>(
    method: &str,
    target: &str,
    headers: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    body: Vec<u8>,
) -> io::Result<RawRequest> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut raw = RawRequest::new(method, target);
    raw.headers = headers
        .into_iter()
        .map(|(name, value)| {
            (
                Arc::<str>::from(name),
                String::from_utf8_lossy(value).into_owned(),
            )
        })
        .collect::<HeaderVec>();

    let is_form = raw
        .get_header("content-type")
        .is_some_and(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE));
    if is_form {
        raw.form = parse_urlencoded(&body);
        debug!(field_count = raw.form.len(), "Form fields parsed");
    }
    raw.body = body;
    Ok(raw)
}

/// Extract a [`RawRequest`] from a `may_minihttp::Request`.
pub fn parse_request(req: Request) -> io::Result<RawRequest> {
    let method = req.method().to_string();
    let target = req.path().to_string();
    let headers: Vec<(String, Vec<u8>)> = req
        .headers()
        .iter()
        .map(|h| (h.name.to_string(), h.value.to_vec()))
        .collect();

    let header_names: Vec<&str> = headers.iter().take(20).map(|(n, _)| n.as_str()).collect();
    debug!(
        header_count = headers.len(),
        header_names = ?header_names,
        "Headers extracted"
    );

    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;
    if !body.is_empty() {
        debug!(body_size_bytes = body.len(), "Request body read");
    }

    let raw = build_raw_request(
        &method,
        &target,
        headers.iter().map(|(n, v)| (n.as_str(), v.as_slice())),
        body,
    )?;
    info!(
        method = %raw.method,
        path = %raw.path,
        query_params = raw.query.len(),
        headers_count = raw.headers.len(),
        "HTTP request parsed"
    );
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_and_headers() {
        let raw = build_raw_request(
            "GET",
            "/calc/add?a=1&b=two%20words",
            [("Host", b"example.org".as_slice())],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(raw.method, Method::GET);
        assert_eq!(raw.path, "/calc/add");
        assert_eq!(raw.get_query("b"), Some("two words"));
        assert_eq!(raw.get_header("host"), Some("example.org"));
    }

    #[test]
    fn test_form_body_is_decoded() {
        let raw = build_raw_request(
            "POST",
            "/login",
            [(
                "Content-Type",
                b"application/x-www-form-urlencoded; charset=utf-8".as_slice(),
            )],
            b"user=ann&pass=a%26b".to_vec(),
        )
        .unwrap();
        assert_eq!(raw.get_form("pass"), Some("a&b"));
        assert_eq!(raw.body, b"user=ann&pass=a%26b");
    }

    #[test]
    fn test_json_body_is_not_form() {
        let raw = build_raw_request(
            "POST",
            "/x",
            [("Content-Type", b"application/json".as_slice())],
            b"{\"a\":1}".to_vec(),
        )
        .unwrap();
        assert!(raw.form.is_empty());
    }

    #[test]
    fn test_invalid_method() {
        let err = build_raw_request("GE T", "/", Vec::<(&str, &[u8])>::new(), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
