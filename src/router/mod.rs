//! # Router Module
//!
//! Classifies request paths for the gateway. A path either names a file under
//! the configured base directory, an application action, or nothing:
//!
//! 1. the path is percent-decoded and its leading `/` removed;
//! 2. an existing regular file under the base directory wins
//!    ([`RouteDecision::StaticFile`]);
//! 3. otherwise the [`ActionTable`] decides whether the application can take it
//!    ([`RouteDecision::Action`]);
//! 4. everything else is [`RouteDecision::NotFound`].
//!
//! Explicit action patterns live in a radix tree (`users/{id}/posts`), so
//! lookups cost O(path length) rather than O(number of routes).

mod core;
mod radix;

pub use core::{ActionTable, RouteClassifier, RouteDecision};
pub use radix::{ActionRoute, ParamVec, RadixRouter};
