use crate::config::GatewayConfig;
use crate::ids::RequestId;
use crate::request::{Environment, ParsedParameters, RequestContext, UploadDescriptor};
use crate::router::ParamVec;
use crate::server::OutboundResponse;
use http::Method;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::warn;

/// Status codes an application may set
const VALID_STATUS: std::ops::RangeInclusive<u16> = 100..=999;

/// A front-controller application driven by the gateway.
///
/// `forward` runs synchronously on the request's coroutine. Anything the
/// application writes to `out` becomes the response body; status and header
/// changes go through the [`HttpContext`].
pub trait Application: Send + Sync {
    /// Called once before the server starts accepting connections.
    fn initialize(&mut self, _config: &GatewayConfig) -> anyhow::Result<()> {
        Ok(())
    }

    /// Execute `action` (the request path without its leading `/`).
    fn forward(&self, action: &str, ctx: &mut HttpContext<'_, '_>, out: &mut dyn Write)
        -> anyhow::Result<()>;
}

/// The HTTP instance an application talks to while handling one request.
///
/// Reads come from the [`RequestContext`]; writes land on the response being
/// assembled by the dispatcher. The only change an application can make to the
/// request side is taking ownership of an upload.
pub struct HttpContext<'c, 'r> {
    request: &'c mut RequestContext<'r>,
    response: &'c mut OutboundResponse,
    request_id: RequestId,
    route_params: ParamVec,
}

impl<'c, 'r> HttpContext<'c, 'r> {
    pub fn new(
        request: &'c mut RequestContext<'r>,
        response: &'c mut OutboundResponse,
        request_id: RequestId,
    ) -> Self {
        Self {
            request,
            response,
            request_id,
            route_params: ParamVec::new(),
        }
    }

    /// Attach the segments captured by the matching route pattern
    #[must_use]
    pub fn with_route_params(mut self, params: ParamVec) -> Self {
        self.route_params = params;
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.request.request.method
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.request.environment
    }

    #[must_use]
    pub fn env(&self, name: &str) -> Option<&str> {
        self.request.env(name)
    }

    #[must_use]
    pub fn params(&self) -> &ParsedParameters {
        &self.request.params
    }

    #[must_use]
    pub fn uploads(&self) -> &[UploadDescriptor] {
        &self.request.uploads
    }

    #[must_use]
    pub fn upload(&self, field: &str) -> Option<&UploadDescriptor> {
        self.request.upload(field)
    }

    /// Take the upload for `field` out of the request.
    ///
    /// The temp file then lives as long as the returned descriptor, and
    /// [`UploadDescriptor::persist`] can move it somewhere permanent.
    pub fn take_upload(&mut self, field: &str) -> Option<UploadDescriptor> {
        let index = self.request.uploads.iter().position(|u| u.field == field)?;
        Some(self.request.uploads.remove(index))
    }

    /// Segments captured by the action's route pattern, in pattern order
    #[must_use]
    pub fn route_params(&self) -> &ParamVec {
        &self.route_params
    }

    #[must_use]
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of a request header
    #[must_use]
    pub fn request_header(&self, name: &str) -> Option<String> {
        self.request.request.header(name)
    }

    /// Request headers overlaid with the headers set so far, lower-cased names.
    #[must_use]
    pub fn all_headers(&self) -> BTreeMap<String, String> {
        let mut all: BTreeMap<String, String> = self
            .request
            .request
            .headers
            .keys()
            .filter_map(|name| {
                self.request
                    .request
                    .header(name.as_str())
                    .map(|v| (name.as_str().to_string(), v))
            })
            .collect();
        for (name, value) in &self.response.headers {
            all.insert(name.to_ascii_lowercase(), value.clone());
        }
        all
    }

    /// Raw request body
    #[must_use]
    pub fn input(&self) -> &[u8] {
        self.request.input()
    }

    /// Set a response header.
    ///
    /// With `replace` off the value is added next to existing ones. A non-zero
    /// `code` in `100..=999` also becomes the response status; other codes are
    /// ignored.
    pub fn header(&mut self, name: &str, value: &str, replace: bool, code: u16) {
        if replace {
            self.response.set_header(name, value.to_string());
        } else {
            self.response.append_header(name, value.to_string());
        }
        if code != 0 {
            self.set_response_code(Some(code));
        }
    }

    /// Set the response status.
    ///
    /// `None` or a code outside `100..=999` leaves the status untouched and
    /// returns `None`.
    pub fn set_response_code(&mut self, code: Option<u16>) -> Option<u16> {
        let code = code?;
        if !VALID_STATUS.contains(&code) {
            warn!(request_id = %self.request_id, status = code, "Ignoring invalid response code");
            return None;
        }
        self.response.status = code;
        Some(code)
    }

    #[must_use]
    pub fn response_code(&self) -> u16 {
        self.response.status
    }

    /// Headers are only written once the whole response is assembled.
    #[must_use]
    pub fn headers_sent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{EnvironmentBuilder, InboundRequest};
    use std::time::SystemTime;

    #[test]
    fn test_header_replace_and_code() {
        let req = InboundRequest::builder(Method::GET, "/users")
            .header("Accept", "text/html")
            .build()
            .unwrap();
        let mut rc = EnvironmentBuilder::new().build(&req, SystemTime::now());
        let mut res = OutboundResponse::new();
        {
            let mut ctx = HttpContext::new(&mut rc, &mut res, RequestId::new());
            ctx.header("Set-Cookie", "a=1", true, 0);
            ctx.header("Set-Cookie", "b=2", false, 0);
            assert_eq!(ctx.response_code(), 200);
            ctx.header("Location", "/login", true, 302);
            assert_eq!(ctx.response_code(), 302);
            assert!(!ctx.headers_sent());

            let all = ctx.all_headers();
            assert_eq!(all.get("accept").map(String::as_str), Some("text/html"));
            assert_eq!(all.get("location").map(String::as_str), Some("/login"));
        }
        assert_eq!(res.status, 302);
        assert_eq!(res.header_values("set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_set_response_code() {
        let req = InboundRequest::builder(Method::POST, "/")
            .body("raw payload")
            .build()
            .unwrap();
        let mut rc = EnvironmentBuilder::new().build(&req, SystemTime::now());
        let mut res = OutboundResponse::new();
        let mut ctx = HttpContext::new(&mut rc, &mut res, RequestId::new());
        assert_eq!(ctx.set_response_code(None), None);
        assert_eq!(ctx.response_code(), 200);
        assert_eq!(ctx.set_response_code(Some(201)), Some(201));
        assert_eq!(ctx.response_code(), 201);
        assert_eq!(ctx.input(), b"raw payload");
    }

    #[test]
    fn test_out_of_range_codes_are_ignored() {
        let req = InboundRequest::builder(Method::GET, "/").build().unwrap();
        let mut rc = EnvironmentBuilder::new().build(&req, SystemTime::now());
        let mut res = OutboundResponse::new();
        let mut ctx = HttpContext::new(&mut rc, &mut res, RequestId::new());
        for bad in [1, 99, 1000, u16::MAX] {
            assert_eq!(ctx.set_response_code(Some(bad)), None, "code {bad}");
        }
        ctx.header("X-Marker", "1", true, 1000);
        assert_eq!(ctx.response_code(), 200);
        assert_eq!(ctx.set_response_code(Some(100)), Some(100));
        assert_eq!(ctx.set_response_code(Some(999)), Some(999));
        ctx.header("Location", "/", true, 303);
        assert_eq!(ctx.response_code(), 303);
    }

    #[test]
    fn test_route_params_lookup() {
        let req = InboundRequest::builder(Method::GET, "/blog/hello").build().unwrap();
        let mut rc = EnvironmentBuilder::new().build(&req, SystemTime::now());
        let mut res = OutboundResponse::new();
        let mut params = ParamVec::new();
        params.push((std::sync::Arc::from("slug"), "hello".to_string()));
        let ctx = HttpContext::new(&mut rc, &mut res, RequestId::new()).with_route_params(params);
        assert_eq!(ctx.route_param("slug"), Some("hello"));
        assert_eq!(ctx.route_param("id"), None);
        assert_eq!(ctx.route_params().len(), 1);
    }
}
