//! HTTP request wrapper.

use http::{HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Decoded query string.
///
/// Keys may repeat on the wire, so every value is kept. [`QueryParams::get`]
/// only answers for keys that appear exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: HashMap<String, Vec<String>>,
}

impl QueryParams {
    /// Decode `application/x-www-form-urlencoded` pairs (`+` is a space).
    pub fn parse(query: Option<&str>) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(q) = query {
            for (key, value) in url::form_urlencoded::parse(q.as_bytes()) {
                values
                    .entry(key.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }
        Self { values }
    }

    /// Single value for `name`. `None` when absent or repeated.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.values.get(name).map(Vec::as_slice) {
            Some([only]) => Some(only.as_str()),
            _ => None,
        }
    }

    /// Every value for `name`, in order of appearance.
    pub fn all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// HTTP request head. Bodies are not read.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    query: QueryParams,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap) -> Self {
        let query = QueryParams::parse(uri.query());

        Self {
            method,
            uri,
            version,
            headers,
            query,
            remote_addr: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Shorthand for `query().get(name)`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote_addr(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }
}
