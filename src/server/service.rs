use super::error::ServerFault;
use super::request::convert_request;
use super::response::{write_outbound, HeaderBlock, OutboundResponse};
use crate::dispatcher::RequestDispatcher;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::{error, info_span, warn};

/// `may_minihttp` service that feeds every request to a [`RequestDispatcher`].
///
/// Cloned once per connection; clones share the dispatcher and each keeps its
/// own header block for the responses of its connection.
#[derive(Clone)]
pub struct GatewayService {
    dispatcher: Arc<RequestDispatcher>,
    head: HeaderBlock,
}

impl GatewayService {
    #[must_use]
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self {
            dispatcher,
            head: HeaderBlock::new(),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }
}

/// 400 answer for a request that could not be converted
#[must_use]
pub fn protocol_error_response(fault: &ServerFault) -> OutboundResponse {
    let mut res = OutboundResponse::text(400, format!("Bad Request: {fault}"));
    res.set_header("Connection", "close".to_string());
    res
}

impl HttpService for GatewayService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request_id = RequestId::from_header_or_new(
            req.headers()
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .and_then(|h| std::str::from_utf8(h.value).ok()),
        );
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
        );

        span.in_scope(|| {
            let inbound = match convert_request(req) {
                Ok(inbound) => inbound,
                Err(fault) => {
                    warn!(request_id = %request_id, error = %fault, "Rejecting malformed request");
                    write_outbound(res, protocol_error_response(&fault), &mut self.head);
                    return Ok(());
                }
            };

            match self.dispatcher.handle(&inbound, request_id) {
                Ok(outbound) => {
                    write_outbound(res, outbound, &mut self.head);
                    Ok(())
                }
                Err(fault) => {
                    let fault = ServerFault::Application(anyhow::Error::new(fault));
                    error!(request_id = %request_id, error = %fault, "Closing connection");
                    Err(fault.into())
                }
            }
        })
    }
}
