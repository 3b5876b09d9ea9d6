//! # Request Module
//!
//! Translates an inbound HTTP request into the per-request context a
//! front-controller application consumes:
//!
//! - **[`environment`]** - server variables (`REQUEST_METHOD`, `HTTP_*`, ...)
//!   and decoded parameters
//! - **[`params`]** - form/query decoding (repeated and bracketed keys) and
//!   JSON bodies
//! - **[`multipart`]** - `multipart/form-data` fields and uploads
//!
//! Decoding never fails a request: malformed input degrades to partial or
//! empty parameters.

pub mod environment;
pub mod inbound;
pub mod multipart;
pub mod params;

pub use environment::{
    header_env_key, Environment, EnvironmentBuilder, RequestContext, DEFAULT_SERVER_NAME,
    DEFAULT_SERVER_PORT,
};
pub use inbound::{InboundRequest, InboundRequestBuilder};
pub use multipart::{MultipartForm, MultipartParser, UploadDescriptor, UploadError};
pub use params::{merge_params, parse_form, parse_json_body, ParsedParameters, Params};
