use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Multi-valued fields (headers, query parameters, cookies) keyed by name.
///
/// A `BTreeMap` keeps the rendering order independent of insertion order.
pub type Multimap = BTreeMap<String, Vec<String>>;

/// A recorded inbound request, or a pattern describing one.
///
/// The same type plays both roles: the request-handling layer records fully
/// populated values, while tests build sparse values as patterns for
/// [`RequestMatcher`](crate::RequestMatcher). Unset fields are omitted when the
/// request is rendered, so a pattern built from a path alone prints as
/// `{ "path" : "..." }`.
///
/// # Example
///
/// ```rust
/// use mockverify::{HttpRequest, request};
///
/// let recorded = HttpRequest::new()
///     .with_method("POST")
///     .with_path("/orders")
///     .with_header("Content-Type", "application/json")
///     .with_body(r#"{"id":1}"#);
///
/// let pattern = request("/orders").with_method("POST");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    query_string_parameters: Multimap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: Multimap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    cookies: Multimap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    keep_alive: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    secure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

/// Shorthand for `HttpRequest::new().with_path(path)`.
pub fn request(path: impl Into<String>) -> HttpRequest {
    HttpRequest::new().with_path(path)
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Append a header value. Repeated calls with the same name accumulate values.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Append a query string parameter value.
    pub fn with_query_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.query_string_parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    #[inline]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[inline]
    pub fn query_string_parameters(&self) -> &Multimap {
        &self.query_string_parameters
    }

    #[inline]
    pub fn headers(&self) -> &Multimap {
        &self.headers
    }

    #[inline]
    pub fn cookies(&self) -> &Multimap {
        &self.cookies
    }

    #[inline]
    pub fn keep_alive(&self) -> Option<bool> {
        self.keep_alive
    }

    #[inline]
    pub fn secure(&self) -> Option<bool> {
        self.secure
    }

    #[inline]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the values of a header, looked up case-insensitively.
    pub fn header_values(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }
}
