//! # Server Module
//!
//! The connection layer: adapts `may_minihttp` requests and responses to the
//! transport-independent [`InboundRequest`](crate::request::InboundRequest)
//! and [`OutboundResponse`], and maps transport faults onto [`ServerFault`].

pub mod error;
pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use error::ServerFault;
pub use http_server::{HttpServer, ServerHandle, EXHAUSTION_BACKOFF};
pub use request::convert_request;
pub use response::{status_reason, write_outbound, HeaderBlock, HeaderVec, OutboundResponse};
pub use service::{protocol_error_response, GatewayService};
