//! # frontgate
//!
//! **frontgate** puts a PHP-style MVC front controller behind a coroutine HTTP
//! server. Each request is turned into the per-request environment such an
//! application expects (server variables, query and body parameters, uploaded
//! files), then either answered from the document root or forwarded to the
//! application as an action.
//!
//! ## Architecture
//!
//! - **[`request`]** - builds the [`RequestContext`](request::RequestContext):
//!   server variables, form/JSON/multipart decoding, upload temp files
//! - **[`router`]** - classifies a path as static file, action or not found
//! - **[`dispatcher`]** - runs one request end to end and drives the
//!   [`Application`](dispatcher::Application)
//! - **[`server`]** - `may_minihttp` adapter, response writing, fault model
//! - **[`static_files`]** - document root lookup and MIME types
//! - **[`config`]**, **[`runtime_config`]**, **[`logging`]** - ambient setup
//! - **[`cli`]** - the `frontgate` binary
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(may_minihttp)
//!     participant Service as GatewayService
//!     participant Dispatcher as RequestDispatcher
//!     participant Env as EnvironmentBuilder
//!     participant Router as RouteClassifier
//!     participant App as Application
//!
//!     Client->>Server: HTTP request
//!     Server->>Service: call(req, res)
//!     Service->>Service: convert to InboundRequest<br/>(400 on protocol error)
//!     Service->>Dispatcher: handle(request, request_id)
//!     Dispatcher->>Env: build(request, received_at)
//!     Env-->>Dispatcher: RequestContext
//!     Dispatcher->>Router: classify(path, base_dir)
//!     alt StaticFile
//!         Dispatcher->>Dispatcher: read file, set Content-Type
//!     else NotFound
//!         Dispatcher->>Dispatcher: 404 "<path> not found!"
//!     else Action
//!         Dispatcher->>App: forward(action, ctx, sink)
//!         App-->>Dispatcher: output + header/status changes
//!     end
//!     Dispatcher-->>Service: OutboundResponse
//!     Service->>Server: write_outbound
//!     Server-->>Client: HTTP response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frontgate::config::GatewayConfig;
//! use frontgate::echo::EchoApplication;
//! use frontgate::gateway::Gateway;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = GatewayConfig {
//!         base_dir: "public".into(),
//!         ..GatewayConfig::default()
//!     };
//!     let gateway = Gateway::new(config, EchoApplication)?;
//!     let handle = gateway.start()?;
//!     handle.join().ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime
//!
//! Built on the `may` coroutine runtime: one coroutine per connection,
//! requests on a connection handled in order. Set `FRONTGATE_STACK_SIZE` to
//! tune the coroutine stack, see [`runtime_config`].

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod gateway;
pub mod ids;
pub mod logging;
pub mod request;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;

pub use config::{load_config, ConfigError, GatewayConfig, ServerOptions};
pub use dispatcher::{Application, ApplicationFault, HttpContext, RequestDispatcher};
pub use gateway::Gateway;
pub use ids::RequestId;
pub use request::{InboundRequest, RequestContext};
pub use router::{ActionTable, RouteClassifier, RouteDecision};
pub use server::{OutboundResponse, ServerFault};
