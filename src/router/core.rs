use super::radix::{ParamVec, RadixRouter};
use crate::static_files::StaticFiles;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a request path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Application action; carries the normalized path (no leading `/`)
    Action(String),
    /// Existing file under the base directory
    StaticFile(PathBuf),
    /// Neither; carries the path as requested
    NotFound(String),
}

/// Actions the application can serve, following the front-controller
/// convention `controller/action/params...`.
///
/// A path is an action when it is empty and a default controller exists, when
/// it matches an explicit route pattern, or when its first segment names a
/// registered controller (case-insensitive).
#[derive(Debug, Clone)]
pub struct ActionTable {
    routes: RadixRouter,
    controllers: BTreeSet<String>,
    default_controller: bool,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionTable {
    /// Table where only the empty path (default controller) is an action
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: RadixRouter::new(),
            controllers: BTreeSet::new(),
            default_controller: true,
        }
    }

    #[must_use]
    pub fn with_route(mut self, pattern: &str) -> Self {
        self.add_route(pattern);
        self
    }

    #[must_use]
    pub fn with_controller(mut self, name: &str) -> Self {
        self.add_controller(name);
        self
    }

    #[must_use]
    pub fn with_default_controller(mut self, enabled: bool) -> Self {
        self.default_controller = enabled;
        self
    }

    pub fn add_route(&mut self, pattern: &str) {
        self.routes.insert(pattern);
    }

    pub fn add_controller(&mut self, name: &str) {
        let name = name.trim_matches('/').to_ascii_lowercase();
        if !name.is_empty() {
            self.controllers.insert(name);
        }
    }

    /// Whether `uri` (normalized, no leading `/`) reaches an action
    #[must_use]
    pub fn recognizes(&self, uri: &str) -> bool {
        let uri = uri.trim_matches('/');
        if uri.is_empty() {
            return self.default_controller;
        }
        if let Some((route, params)) = self.routes.route(uri) {
            debug!(uri = %uri, route_pattern = %route.pattern, path_params = ?params, "Action route matched");
            return true;
        }
        let controller = uri.split('/').next().unwrap_or("").to_ascii_lowercase();
        self.controllers.contains(&controller)
    }

    /// Segments captured by the explicit pattern matching `uri`; empty when
    /// the path reaches an action by controller name or not at all.
    #[must_use]
    pub fn route_params(&self, uri: &str) -> ParamVec {
        self.routes
            .route(uri.trim_matches('/'))
            .map(|(_, params)| params)
            .unwrap_or_default()
    }

    /// Registered controllers and route patterns, for display
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.default_controller {
            lines.push("/ (default controller)".to_string());
        }
        for c in &self.controllers {
            lines.push(format!("/{c}/... (controller)"));
        }
        for route in self.routes.routes() {
            lines.push(format!("/{} (route)", route.pattern));
        }
        lines
    }
}

/// Decides whether a path is a static file, an action or nothing.
#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    actions: ActionTable,
}

impl RouteClassifier {
    #[must_use]
    pub fn new(actions: ActionTable) -> Self {
        info!(routes = ?actions.describe(), "Action table loaded");
        Self { actions }
    }

    #[must_use]
    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Classify `path` against the files under `base_dir` and the action table.
    ///
    /// The path is percent-decoded and stripped of its leading `/`. Paths
    /// trying to leave `base_dir` never resolve to a file.
    #[must_use]
    pub fn classify(&self, path: &str, base_dir: &Path) -> RouteDecision {
        let decoded = decode_path(path);
        let uri = decoded.trim_start_matches('/');

        let decision = if let Some(file) = StaticFiles::new(base_dir).resolve(uri) {
            RouteDecision::StaticFile(file)
        } else if self.actions.recognizes(uri) {
            RouteDecision::Action(uri.to_string())
        } else {
            RouteDecision::NotFound(path.to_string())
        };

        debug!(path = %path, decision = ?decision, "Route classified");
        decision
    }
}

fn decode_path(path: &str) -> Cow<'_, str> {
    match urlencoding::decode(path) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Owned(String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()),
    }
}
