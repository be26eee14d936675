//! Response decoding and pagination extraction.
//!
//! Both decode entry points are generic over any type implementing the
//! [`FromJson`] contract. Array decoding is deliberately tolerant: a
//! single malformed element must not abort the whole page, so failed
//! elements are skipped, and their indices reported alongside the decoded
//! items so callers can observe partial failure.
//!
//! A body that parses but carries a top-level `"message"` field is a
//! service-reported error (rate limit, bad credentials) and fails the
//! decode even when the HTTP status looked successful.

use gisto_protocol::FromJson;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A decoded array page: the items that constructed successfully and the
/// indices of elements that did not.
#[derive(Debug, Clone)]
pub struct DecodedPage<T> {
    /// Successfully decoded elements, in original order.
    pub items: Vec<T>,
    /// Zero-based indices of elements that failed to construct.
    pub skipped: Vec<usize>,
}

/// Parses a response body into a JSON value, honoring the shared failure
/// rules (empty body, unparseable body, service-reported message).
fn parse_body(body: &[u8]) -> Result<serde_json::Value> {
    if body.is_empty() {
        return Err(Error::data("response body was empty"));
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::data(format!("response body was not valid JSON: {e}")))?;

    if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
        return Err(Error::data(message.to_string()));
    }

    Ok(value)
}

/// Decodes a response body into a single `T`.
///
/// # Errors
///
/// Returns a data error if the body is empty, unparseable, carries a
/// service-reported message, or `T` cannot be constructed from it.
pub fn decode_object<T: FromJson>(body: &[u8]) -> Result<T> {
    let value = parse_body(body)?;
    T::from_json(&value).ok_or_else(|| Error::data("object couldn't be created from JSON"))
}

/// Decodes a response body into a page of `T`s, skipping elements that
/// fail to construct.
///
/// # Errors
///
/// Returns a data error if the body is empty, unparseable, carries a
/// service-reported message, or is not a JSON array.
pub fn decode_array<T: FromJson>(body: &[u8]) -> Result<DecodedPage<T>> {
    let value = parse_body(body)?;
    let elements = value
        .as_array()
        .ok_or_else(|| Error::data("expected a JSON array"))?;

    let mut items = Vec::with_capacity(elements.len());
    let mut skipped = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        match T::from_json(element) {
            Some(item) => items.push(item),
            None => {
                warn!(index, "skipping array element that failed to decode");
                skipped.push(index);
            }
        }
    }

    debug!(
        decoded = items.len(),
        skipped = skipped.len(),
        "decoded array response"
    );
    Ok(DecodedPage { items, skipped })
}

/// Extracts the next-page URL from a response's `Link` header.
///
/// The header is RFC5988-style: comma-separated `<url>; rel="value"`
/// entries. Returns the URL of the `rel="next"` entry, or `None` when the
/// header is absent, has no `next` entry, or is unparseable.
#[must_use]
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    parse_link_header(link)
}

/// Parses a `Link` header value into the `rel="next"` URL.
fn parse_link_header(link: &str) -> Option<String> {
    for entry in link.split(',') {
        if !entry.contains(r#"rel="next""#) {
            continue;
        }
        let start = entry.find('<')?;
        let end = entry.find(">;")?;
        if start + 1 > end {
            return None;
        }
        return Some(entry[start + 1..end].to_string());
    }
    None
}
