use super::context::{Application, HttpContext};
use crate::ids::RequestId;
use crate::request::{EnvironmentBuilder, InboundRequest};
use crate::router::{RouteClassifier, RouteDecision};
use crate::server::OutboundResponse;
use crate::static_files::{ExtensionMimeResolver, MimeResolver};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// Error raised by the application while forwarding an action.
#[derive(Debug)]
pub struct ApplicationFault {
    pub action: String,
    pub source: anyhow::Error,
}

impl fmt::Display for ApplicationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action '{}' failed: {:#}", self.action, self.source)
    }
}

impl std::error::Error for ApplicationFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Turns one [`InboundRequest`] into one [`OutboundResponse`].
///
/// Shared by every connection coroutine; holds no per-request state.
pub struct RequestDispatcher {
    environment: EnvironmentBuilder,
    classifier: RouteClassifier,
    base_dir: PathBuf,
    mime: Arc<dyn MimeResolver>,
    application: Arc<dyn Application>,
}

impl RequestDispatcher {
    pub fn new(
        environment: EnvironmentBuilder,
        classifier: RouteClassifier,
        base_dir: impl Into<PathBuf>,
        application: Arc<dyn Application>,
    ) -> Self {
        Self {
            environment,
            classifier,
            base_dir: base_dir.into(),
            mime: Arc::new(ExtensionMimeResolver),
            application,
        }
    }

    #[must_use]
    pub fn with_mime_resolver(mut self, mime: Arc<dyn MimeResolver>) -> Self {
        self.mime = mime;
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn classifier(&self) -> &RouteClassifier {
        &self.classifier
    }

    /// Handle a request received now.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationFault`] when the application fails an action.
    pub fn handle(
        &self,
        request: &InboundRequest,
        request_id: RequestId,
    ) -> Result<OutboundResponse, ApplicationFault> {
        self.handle_at(request, request_id, SystemTime::now())
    }

    /// Handle a request received at `received_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationFault`] when the application fails an action.
    pub fn handle_at(
        &self,
        request: &InboundRequest,
        request_id: RequestId,
        received_at: SystemTime,
    ) -> Result<OutboundResponse, ApplicationFault> {
        let started = Instant::now();
        let mut response = OutboundResponse::new();
        response.set_header("Date", httpdate::fmt_http_date(received_at));

        let mut context = self.environment.build(request, received_at);
        let path = request.path();

        match self.classifier.classify(path, &self.base_dir) {
            RouteDecision::StaticFile(file) => match fs::read(&file) {
                Ok(bytes) => {
                    let mime = self.mime.resolve(&file);
                    response.set_header("Content-Type", format!("{mime}; charset=utf-8"));
                    response.body = bytes;
                    debug!(file = %file.display(), size = response.body.len(), "Static file served");
                }
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "Static file vanished before read");
                    not_found(&mut response, path);
                }
            },
            RouteDecision::NotFound(original) => {
                debug!(path = %original, "No file or action for path");
                not_found(&mut response, &original);
            }
            RouteDecision::Action(action) => {
                let mut sink: Vec<u8> = Vec::new();
                let route_params = self.classifier.actions().route_params(&action);
                let forwarded = {
                    let mut http = HttpContext::new(&mut context, &mut response, request_id)
                        .with_route_params(route_params);
                    self.application.forward(&action, &mut http, &mut sink)
                };
                if let Err(source) = forwarded {
                    error!(
                        request_id = %request_id,
                        action = %action,
                        error = %source,
                        "Application failed while handling action"
                    );
                    return Err(ApplicationFault { action, source });
                }
                response.body.append(&mut sink);
                info!(
                    request_id = %request_id,
                    action = %action,
                    status = response.status,
                    body_size = response.body.len(),
                    "Action forwarded"
                );
            }
        }

        debug!(
            request_id = %request_id,
            method = %request.method,
            path = %path,
            status = response.status,
            latency_us = started.elapsed().as_micros() as u64,
            "Request dispatched"
        );
        Ok(response)
    }
}

fn not_found(response: &mut OutboundResponse, path: &str) {
    response.status = 404;
    response.set_header("Content-Type", "text/plain; charset=utf-8".to_string());
    response.body = format!("{path} not found!").into_bytes();
}
