//! The JSON decoder contract.
//!
//! The gist service returns heterogeneous payloads whose fields come and go
//! between API revisions, so entities are constructed from a dynamic
//! [`serde_json::Value`] rather than through strict `Deserialize` impls.
//! A failed construction yields `None`; the response layer decides whether
//! that aborts the whole decode (single objects) or skips the element
//! (arrays).

/// A type that can construct itself from a JSON value.
///
/// Implementors validate their required fields exactly once, at decode
/// time, and return `None` when a required field is missing or has the
/// wrong shape.
///
/// # Examples
///
/// ```
/// use gisto_protocol::FromJson;
///
/// struct Login(String);
///
/// impl FromJson for Login {
///     fn from_json(value: &serde_json::Value) -> Option<Self> {
///         Some(Login(value.get("login")?.as_str()?.to_string()))
///     }
/// }
///
/// let value = serde_json::json!({ "login": "octocat" });
/// assert!(Login::from_json(&value).is_some());
/// assert!(Login::from_json(&serde_json::json!({})).is_none());
/// ```
pub trait FromJson: Sized {
    /// Constructs `Self` from a JSON value, or `None` if the value does not
    /// carry the required fields.
    fn from_json(value: &serde_json::Value) -> Option<Self>;
}
