use may_minihttp::Response;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Ordered response headers; names compare case-insensitively
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Response assembled by the dispatcher and handed back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl Default for OutboundResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundResponse {
    /// Empty `200` response
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// Plain-text response with the given status
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut res = Self::new();
        res.status = status;
        res.set_header("Content-Type", "text/plain; charset=utf-8".to_string());
        res.body = body.into().into_bytes();
        res
    }

    /// First value of a header
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a header in insertion order
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Replace every value of `name` with `value`
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Add a value without touching existing ones
    pub fn append_header(&mut self, name: &str, value: String) {
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Reason phrase for a status code, `OK` when unknown
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("OK")
}

/// Header block capacity kept between requests on one connection
const RETAINED_BLOCK_CAPACITY: usize = 16 * 1024;

/// Owned header lines of one response, joined by CRLF.
///
/// `may_minihttp` takes header lines as `&'static str` in a fixed set of 16
/// slots and writes each slot after a CRLF. All lines of a response therefore
/// go into a single slot pointing at this block. The block belongs to the
/// connection's service and is only rewritten by the next call on that
/// connection, after the previous response has been encoded.
#[derive(Debug, Clone, Default)]
pub struct HeaderBlock {
    text: String,
}

impl HeaderBlock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `headers`, skipping `Date` and `Content-Length`, with CR and LF
    /// replaced by spaces. `None` when no line remains.
    pub fn fill(&mut self, headers: &HeaderVec) -> Option<&str> {
        if self.text.capacity() > RETAINED_BLOCK_CAPACITY {
            self.text = String::new();
        }
        self.text.clear();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("date") || name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            if !self.text.is_empty() {
                self.text.push_str("\r\n");
            }
            push_sanitized(&mut self.text, name);
            self.text.push_str(": ");
            push_sanitized(&mut self.text, value);
        }
        (!self.text.is_empty()).then_some(self.text.as_str())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }
}

fn push_sanitized(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| if c == '\r' || c == '\n' { ' ' } else { c }));
}

/// Copy an [`OutboundResponse`] into the transport response.
///
/// `Date` and `Content-Length` are skipped: may_minihttp writes both itself.
/// The header lines are rendered into `block`, which must stay untouched until
/// `may_minihttp` has encoded `res`.
pub fn write_outbound(res: &mut Response, out: OutboundResponse, block: &mut HeaderBlock) {
    res.status_code(out.status as usize, status_reason(out.status));
    if let Some(text) = block.fill(&out.headers) {
        // SAFETY: may_minihttp encodes the response as soon as
        // `HttpService::call` returns and before it calls the service again.
        // `block` lives in that per-connection service, so the text is neither
        // rewritten nor freed while `res` still refers to it.
        let line: &'static str = unsafe { &*(text as *const str) };
        res.header(line);
    }
    res.body_vec(out.body);
}
