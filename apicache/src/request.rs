//! Request description consumed by key builders.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

/// The closed set of HTTP methods the cache recognizes.
///
/// Key-builder overrides are registered per method, so the set is kept
/// deliberately closed rather than accepting arbitrary method strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
    /// HTTP PATCH.
    Patch,
}

impl Method {
    /// Upper-case wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a method name outside the supported set.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported http method: {0}")]
pub struct InvalidMethod(String);

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(InvalidMethod(other.to_owned())),
        }
    }
}

/// The request data the cache needs to derive a key.
///
/// Produced by the HTTP layer and only ever borrowed by the cache.
/// Query parameters keep their encounter order, including duplicate
/// names - the default key builder is deliberately order-sensitive.
/// The optional body is carried for caller-supplied key builders that
/// hash POST bodies; the built-in algorithm ignores it.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl RequestDescriptor {
    /// Creates a descriptor for `method` and `path`.
    ///
    /// # Example
    ///
    /// ```
    /// use apicache::{Method, RequestDescriptor};
    ///
    /// let request = RequestDescriptor::new(Method::Get, "/users/42")
    ///     .query("page", "1")
    ///     .query("sort", "name");
    /// assert_eq!(request.path(), "/users/42");
    /// ```
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RequestDescriptor {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends a query parameter, preserving encounter order.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Attaches the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The URL path, with its leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in encounter order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// The request body, if one was attached.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }
}
