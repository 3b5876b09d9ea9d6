use super::error::ServerFault;
use crate::request::InboundRequest;
use http::{Method, Version};
use may_minihttp::Request;
use std::io::Read;
use tracing::debug;

/// Copy a transport request into an [`InboundRequest`].
///
/// Consumes the request because reading the body does.
///
/// # Errors
///
/// [`ServerFault::Protocol`] for an invalid method token or request target, or
/// a body that cannot be read.
pub fn convert_request(req: Request) -> Result<InboundRequest, ServerFault> {
    let method = parse_method(req.method())?;
    let version = http_version(req.version());
    let target = req.path().to_string();

    let mut builder = InboundRequest::builder(method, &target).version(version);
    for header in req.headers() {
        builder = builder.header_bytes(header.name, header.value);
    }

    let mut body = Vec::new();
    req.body()
        .read_to_end(&mut body)
        .map_err(|e| ServerFault::protocol(format!("unreadable body: {e}")))?;

    let inbound = builder
        .body(body)
        .build()
        .map_err(|e| ServerFault::protocol(format!("invalid request target '{target}': {e}")))?;

    debug!(
        method = %inbound.method,
        target = %target,
        http_version = inbound.protocol(),
        headers_count = inbound.headers.len(),
        body_size = inbound.body.len(),
        "HTTP request received"
    );
    Ok(inbound)
}

/// Parse a request-line method token
///
/// # Errors
///
/// [`ServerFault::Protocol`] when the token is not a valid method.
pub fn parse_method(token: &str) -> Result<Method, ServerFault> {
    Method::from_bytes(token.as_bytes())
        .map_err(|_| ServerFault::protocol(format!("invalid method '{token}'")))
}

/// httparse minor version (`1` for HTTP/1.1) to [`Version`]
#[must_use]
pub fn http_version(minor: u8) -> Version {
    match minor {
        0 => Version::HTTP_10,
        _ => Version::HTTP_11,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
        assert_eq!(parse_method("PURGE").unwrap().as_str(), "PURGE");
        assert!(matches!(
            parse_method("BAD METHOD"),
            Err(ServerFault::Protocol { .. })
        ));
    }

    #[test]
    fn test_http_version() {
        assert_eq!(http_version(0), Version::HTTP_10);
        assert_eq!(http_version(1), Version::HTTP_11);
    }
}
