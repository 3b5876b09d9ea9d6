use std::path::{Component, Path, PathBuf};

/// Maps a file path to the content type sent with it.
pub trait MimeResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> String;
}

/// Extension-table resolver; unknown extensions are `application/octet-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMimeResolver;

impl ExtensionMimeResolver {
    #[must_use]
    pub fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" | "mjs" => "application/javascript",
            "json" | "map" => "application/json",
            "txt" => "text/plain",
            "csv" => "text/csv",
            "xml" => "application/xml",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            "ttf" => "font/ttf",
            "pdf" => "application/pdf",
            "wasm" => "application/wasm",
            _ => "application/octet-stream",
        }
    }
}

impl MimeResolver for ExtensionMimeResolver {
    fn resolve(&self, path: &Path) -> String {
        Self::content_type(path).to_string()
    }
}

/// Files under a base directory, addressed by URL path.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Join a decoded URL path onto the base directory.
    ///
    /// Returns `None` for anything that could escape it (`..`, absolute or
    /// prefixed components).
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// Path of an existing regular file for `url_path`, if there is one
    #[must_use]
    pub fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        if url_path.trim_start_matches('/').is_empty() {
            return None;
        }
        self.map_path(url_path).filter(|p| p.is_file())
    }
}
