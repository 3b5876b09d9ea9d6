//! # Dispatcher Module
//!
//! Orchestrates one request from start to finish:
//!
//! 1. stamp the `Date` header from the reception time;
//! 2. build the [`RequestContext`](crate::request::RequestContext);
//! 3. classify the path with the [`RouteClassifier`](crate::router::RouteClassifier);
//! 4. serve the static file, answer `404`, or forward the action to the
//!    [`Application`].
//!
//! ## Applications
//!
//! An application receives the action id (the decoded path without its leading
//! `/`), an [`HttpContext`] and an output sink:
//!
//! ```rust,ignore
//! use frontgate::dispatcher::{Application, HttpContext};
//! use std::io::Write;
//!
//! struct Hello;
//!
//! impl Application for Hello {
//!     fn forward(&self, action: &str, ctx: &mut HttpContext<'_, '_>, out: &mut dyn Write)
//!         -> anyhow::Result<()> {
//!         ctx.header("Content-Type", "text/plain", true, 0);
//!         write!(out, "hello from {action}")?;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! Everything written to the sink becomes the response body. Status and
//! headers set through the context stay on the response. An error from
//! `forward` is an [`ApplicationFault`]; the connection is closed.

mod context;
mod core;

pub use context::{Application, HttpContext};
pub use core::{ApplicationFault, RequestDispatcher};
