//! Radix tree of action route patterns.
//!
//! Each node is one path segment. Static segments (`users`) match exactly,
//! parameter segments (`{id}`) match any single segment. Static children are
//! tried before parameter children, with backtracking, so `users/new` wins
//! over `users/{id}` for the path `users/new`.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

/// Maximum number of path parameters kept inline
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameters captured while matching (stack-allocated for ≤8 params)
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered action route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRoute {
    /// Pattern as registered, without leading `/` (e.g. `users/{id}`)
    pub pattern: String,
}

#[derive(Debug, Clone)]
struct RadixNode {
    segment: Cow<'static, str>,
    route: Option<Arc<ActionRoute>>,
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode>,
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            route: None,
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            segment: Cow::Borrowed(""),
            route: None,
            param_name: Some(Arc::from(param_name)),
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn insert(&mut self, segments: &[&str], route: Arc<ActionRoute>) {
        let Some((segment, remaining)) = segments.split_first() else {
            self.route = Some(route);
            return;
        };

        if segment.starts_with('{') && segment.ends_with('}') {
            let param_name = segment.trim_start_matches('{').trim_end_matches('}');
            for param_child in &mut self.param_children {
                if param_child.param_name.as_deref() == Some(param_name) {
                    param_child.insert(remaining, route);
                    return;
                }
            }
            let mut child = RadixNode::new_param(param_name);
            child.insert(remaining, route);
            self.param_children.push(child);
            return;
        }

        for child in &mut self.children {
            if child.segment == *segment {
                child.insert(remaining, route);
                return;
            }
        }
        let mut child = RadixNode::new(Cow::Owned((*segment).to_string()));
        child.insert(remaining, route);
        self.children.push(child);
    }

    fn search(&self, segments: &[&str], params: &mut ParamVec) -> Option<Arc<ActionRoute>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.route.clone();
        };

        for child in &self.children {
            if child.segment == *segment {
                if let Some(route) = child.search(remaining, params) {
                    return Some(route);
                }
            }
        }

        for param_child in &self.param_children {
            if let Some(name) = &param_child.param_name {
                params.push((Arc::clone(name), (*segment).to_string()));
                if let Some(route) = param_child.search(remaining, params) {
                    return Some(route);
                }
                params.pop();
            }
        }
        None
    }
}

/// Pattern tree used by the action table
#[derive(Debug, Clone)]
pub struct RadixRouter {
    root: RadixNode,
    routes: Vec<Arc<ActionRoute>>,
}

impl Default for RadixRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(Cow::Borrowed("")),
            routes: Vec::new(),
        }
    }

    pub fn insert(&mut self, pattern: &str) {
        let pattern = pattern.trim_matches('/');
        let segments: Vec<&str> = split_segments(pattern);
        let route = Arc::new(ActionRoute {
            pattern: pattern.to_string(),
        });
        self.root.insert(&segments, Arc::clone(&route));
        self.routes.push(route);
    }

    /// Match a normalized path (no leading `/`)
    #[must_use]
    pub fn route(&self, path: &str) -> Option<(Arc<ActionRoute>, ParamVec)> {
        let segments = split_segments(path.trim_matches('/'));
        let mut params = ParamVec::new();
        self.root
            .search(&segments, &mut params)
            .map(|route| (route, params))
    }

    /// Registered routes in insertion order
    pub fn routes(&self) -> impl Iterator<Item = &ActionRoute> {
        self.routes.iter().map(|r| r.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
