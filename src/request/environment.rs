use super::inbound::InboundRequest;
use super::multipart::{MultipartParser, UploadDescriptor};
use super::params::{parse_form, parse_json_body, ParsedParameters, Params};
use http::Method;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Server name used when the request carries no `Host` header
pub const DEFAULT_SERVER_NAME: &str = "127.0.0.1";

/// Port reported when the request target carries none
pub const DEFAULT_SERVER_PORT: u16 = 80;

/// Per-request server variables (`REQUEST_METHOD`, `HTTP_*`, `SERVER_NAME`, ...).
///
/// Ordered so that two builds of the same request are identical.
pub type Environment = BTreeMap<String, String>;

/// Everything the application sees about one request.
///
/// Built once per request and passed explicitly; nothing here is shared with
/// other requests. Upload temp files are deleted when the context is dropped
/// unless the application persisted them.
#[derive(Debug)]
pub struct RequestContext<'r> {
    pub request: &'r InboundRequest,
    pub environment: Environment,
    pub params: ParsedParameters,
    pub uploads: Vec<UploadDescriptor>,
}

impl RequestContext<'_> {
    #[must_use]
    pub fn env(&self, name: &str) -> Option<&str> {
        self.environment.get(name).map(String::as_str)
    }

    /// Raw request body
    #[must_use]
    pub fn input(&self) -> &[u8] {
        &self.request.body
    }

    /// Upload submitted under `field`
    #[must_use]
    pub fn upload(&self, field: &str) -> Option<&UploadDescriptor> {
        self.uploads.iter().find(|u| u.field == field)
    }
}

/// `HTTP_` + upper-cased header name, every non-alphanumeric byte replaced by `_`.
#[must_use]
pub fn header_env_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 5);
    key.push_str("HTTP_");
    key.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    key
}

/// Turns an [`InboundRequest`] into a [`RequestContext`].
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    fallback_host: String,
    listen_addr: Option<SocketAddr>,
    multipart: MultipartParser,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fallback_host: DEFAULT_SERVER_NAME.to_string(),
            listen_addr: None,
            multipart: MultipartParser::new(),
        }
    }

    /// Server name used when no `Host` header is present
    #[must_use]
    pub fn fallback_host(mut self, host: impl Into<String>) -> Self {
        self.fallback_host = host.into();
        self
    }

    /// Address reported as `REMOTE_ADDR`/`REMOTE_PORT` when the peer is unknown
    #[must_use]
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = Some(addr);
        self
    }

    #[must_use]
    pub fn multipart_parser(mut self, parser: MultipartParser) -> Self {
        self.multipart = parser;
        self
    }

    /// Build the environment and decoded parameters for `request`.
    ///
    /// `received_at` feeds `REQUEST_TIME` and `REQUEST_TIME_FLOAT`, so calling
    /// this twice with the same arguments yields the same environment and
    /// parameters. Malformed query strings and bodies never fail the build.
    #[must_use]
    pub fn build<'r>(&self, request: &'r InboundRequest, received_at: SystemTime) -> RequestContext<'r> {
        let mut env = Environment::new();

        if let Some(remote) = request.remote_addr.or(self.listen_addr) {
            env.insert("REMOTE_ADDR".into(), remote.ip().to_string());
            env.insert("REMOTE_PORT".into(), remote.port().to_string());
        }

        let path = request.path();
        env.insert("REQUEST_METHOD".into(), request.method.as_str().to_string());
        env.insert("REQUEST_URI".into(), path.to_string());
        env.insert("QUERY_STRING".into(), request.query().to_string());
        env.insert("SERVER_PROTOCOL".into(), request.protocol().to_string());

        for name in request.headers.keys() {
            let joined = request.header_values(name.as_str()).join(", ");
            env.insert(header_env_key(name.as_str()), joined);
        }
        if let Some(requested_with) = request.header("x-requested-with") {
            env.insert("HTTP_X_REQUESTED_WITH".into(), requested_with);
        }

        let server_name = request
            .header("host")
            .unwrap_or_else(|| self.fallback_host.clone());
        env.insert("SERVER_NAME".into(), server_name);
        env.insert(
            "SERVER_PORT".into(),
            request.uri.port_u16().unwrap_or(DEFAULT_SERVER_PORT).to_string(),
        );

        env.insert("SCRIPT_NAME".into(), path.to_string());
        env.insert("PHP_SELF".into(), path.to_string());

        let since_epoch = received_at.duration_since(UNIX_EPOCH).unwrap_or_default();
        env.insert("REQUEST_TIME".into(), since_epoch.as_secs().to_string());
        env.insert(
            "REQUEST_TIME_FLOAT".into(),
            format!("{}.{:06}", since_epoch.as_secs(), since_epoch.subsec_micros()),
        );

        let content_type = request.header("content-type");
        if let Some(ct) = &content_type {
            env.insert("CONTENT_TYPE".into(), ct.clone());
        }
        if let Some(len) = request.header("content-length") {
            env.insert("CONTENT_LENGTH".into(), len);
        }

        let query = parse_form(request.query().as_bytes());
        let (body, uploads) = if request.method == Method::POST {
            self.decode_body(content_type.as_deref().unwrap_or(""), &request.body)
        } else {
            (Params::new(), Vec::new())
        };
        let params = ParsedParameters::new(query, body);

        debug!(
            method = %request.method,
            path = %path,
            env_count = env.len(),
            query_count = params.query.len(),
            body_count = params.body.len(),
            upload_count = uploads.len(),
            "Request environment built"
        );

        RequestContext {
            request,
            environment: env,
            params,
            uploads,
        }
    }

    fn decode_body(&self, content_type: &str, body: &[u8]) -> (Params, Vec<UploadDescriptor>) {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("multipart/form-data") {
            let form = self.multipart.parse(body);
            (form.fields, form.files)
        } else if content_type.contains("application/x-www-form-urlencoded") {
            (parse_form(body), Vec::new())
        } else if content_type.contains("application/json") {
            (parse_json_body(body), Vec::new())
        } else {
            (Params::new(), Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn at() -> SystemTime {
        UNIX_EPOCH + Duration::from_micros(1_700_000_000_250_000)
    }

    #[test]
    fn test_header_env_key() {
        assert_eq!(header_env_key("content-type"), "HTTP_CONTENT_TYPE");
        assert_eq!(header_env_key("X-Forwarded-For"), "HTTP_X_FORWARDED_FOR");
        assert_eq!(header_env_key("x.custom"), "HTTP_X_CUSTOM");
    }

    #[test]
    fn test_core_entries() {
        let req = InboundRequest::builder(Method::GET, "/users/7?sort=asc")
            .header("Host", "example.test")
            .header("Accept", "text/html")
            .header("Accept", "application/json")
            .build()
            .unwrap();
        let ctx = EnvironmentBuilder::new().build(&req, at());
        assert_eq!(ctx.env("REQUEST_METHOD"), Some("GET"));
        assert_eq!(ctx.env("REQUEST_URI"), Some("/users/7"));
        assert_eq!(ctx.env("QUERY_STRING"), Some("sort=asc"));
        assert_eq!(ctx.env("SERVER_PROTOCOL"), Some("HTTP/1.1"));
        assert_eq!(ctx.env("HTTP_ACCEPT"), Some("text/html, application/json"));
        assert_eq!(ctx.env("SERVER_NAME"), Some("example.test"));
        assert_eq!(ctx.env("SERVER_PORT"), Some("80"));
        assert_eq!(ctx.env("SCRIPT_NAME"), Some("/users/7"));
        assert_eq!(ctx.env("PHP_SELF"), Some("/users/7"));
        assert_eq!(ctx.env("REQUEST_TIME"), Some("1700000000"));
        assert_eq!(ctx.env("REQUEST_TIME_FLOAT"), Some("1700000000.250000"));
        assert_eq!(ctx.params.query.get("sort"), Some(&json!("asc")));
        assert!(ctx.env("CONTENT_TYPE").is_none());
    }

    #[test]
    fn test_fallback_host_and_uri_port() {
        let req = InboundRequest::builder(Method::GET, "http://internal:8081/ping")
            .build()
            .unwrap();
        let ctx = EnvironmentBuilder::new().build(&req, at());
        assert_eq!(ctx.env("SERVER_NAME"), Some(DEFAULT_SERVER_NAME));
        assert_eq!(ctx.env("SERVER_PORT"), Some("8081"));
        assert_eq!(ctx.env("REQUEST_URI"), Some("/ping"));
    }

    #[test]
    fn test_remote_addr_prefers_peer() {
        let listen: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let peer: SocketAddr = "10.0.0.5:51000".parse().unwrap();
        let builder = EnvironmentBuilder::new().listen_addr(listen);

        let anonymous = InboundRequest::builder(Method::GET, "/").build().unwrap();
        let ctx = builder.build(&anonymous, at());
        assert_eq!(ctx.env("REMOTE_ADDR"), Some("0.0.0.0"));
        assert_eq!(ctx.env("REMOTE_PORT"), Some("8080"));

        let known = InboundRequest::builder(Method::GET, "/")
            .remote_addr(peer)
            .build()
            .unwrap();
        let ctx = builder.build(&known, at());
        assert_eq!(ctx.env("REMOTE_ADDR"), Some("10.0.0.5"));
        assert_eq!(ctx.env("REMOTE_PORT"), Some("51000"));
    }

    #[test]
    fn test_body_ignored_for_get() {
        let req = InboundRequest::builder(Method::GET, "/")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("a=1")
            .build()
            .unwrap();
        let ctx = EnvironmentBuilder::new().build(&req, at());
        assert!(ctx.params.body.is_empty());
        assert_eq!(ctx.env("CONTENT_TYPE"), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_unknown_content_type_yields_empty_body() {
        let req = InboundRequest::builder(Method::POST, "/")
            .header("Content-Type", "text/csv")
            .body("a,b")
            .build()
            .unwrap();
        let ctx = EnvironmentBuilder::new().build(&req, at());
        assert!(ctx.params.body.is_empty());
        assert_eq!(ctx.input(), b"a,b");
    }
}
