use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, Version};
use std::net::SocketAddr;

/// A fully received HTTP request, independent of the transport that produced it.
///
/// Header names are case-insensitive (backed by [`HeaderMap`]) and every value
/// of a repeated header is kept in arrival order. The struct is never mutated
/// after the transport hands it over.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Peer address when the transport exposes it
    pub remote_addr: Option<SocketAddr>,
}

impl InboundRequest {
    /// Start building a request, mostly useful in tests and benches.
    #[must_use]
    pub fn builder(method: Method, target: &str) -> InboundRequestBuilder {
        InboundRequestBuilder {
            method,
            target: target.to_string(),
            version: Version::HTTP_11,
            headers: Vec::new(),
            body: Vec::new(),
            remote_addr: None,
        }
    }

    /// URI path, `/` when the target carried none
    #[must_use]
    pub fn path(&self) -> &str {
        match self.uri.path() {
            "" => "/",
            p => p,
        }
    }

    /// Raw query string without the leading `?`
    #[must_use]
    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    /// First value of a header, lossily decoded
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }

    /// All values of a header in arrival order
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect()
    }

    /// `HTTP/<version>` as sent on the request line
    #[must_use]
    pub fn protocol(&self) -> &'static str {
        match self.version {
            Version::HTTP_09 => "HTTP/0.9",
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_2 => "HTTP/2",
            Version::HTTP_3 => "HTTP/3",
            _ => "HTTP/1.1",
        }
    }
}

/// Builder for [`InboundRequest`].
///
/// Invalid header names or values are dropped rather than failing the build.
#[derive(Debug, Clone)]
pub struct InboundRequestBuilder {
    method: Method,
    target: String,
    version: Version,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
    remote_addr: Option<SocketAddr>,
}

impl InboundRequestBuilder {
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.header_bytes(name, value.as_bytes())
    }

    /// Header with a raw (possibly non-UTF-8) value, as read off the wire
    #[must_use]
    pub fn header_bytes(mut self, name: &str, value: &[u8]) -> Self {
        self.headers.push((name.to_string(), value.to_vec()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Finish the request.
    ///
    /// # Errors
    ///
    /// Returns the URI parse error when the target is not a valid request target.
    pub fn build(self) -> Result<InboundRequest, http::uri::InvalidUri> {
        let uri: Uri = self.target.parse()?;
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(&value),
            ) {
                headers.append(name, value);
            }
        }
        Ok(InboundRequest {
            method: self.method,
            uri,
            version: self.version,
            headers,
            body: self.body,
            remote_addr: self.remote_addr,
        })
    }
}
