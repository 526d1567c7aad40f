//! Backend URL and cache path resolution.

use std::path::PathBuf;

/// Where a locally-run storage backend listens.
const DEFAULT_BACKEND: &str = "http://localhost:5000";

/// Resolve the backend base URL: flag, then environment, then default.
pub fn resolve_backend_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }

    if let Ok(url) = std::env::var("TEACHABLE_BACKEND") {
        return url;
    }

    DEFAULT_BACKEND.to_string()
}

/// Resolve the feature-cache path: flag, then environment, then a
/// project-local cache if one exists, then the per-user default.
pub fn resolve_cache_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var("TEACHABLE_CACHE") {
        return env_path;
    }

    let local = PathBuf::from(".teachable/features.tvc");
    if local.exists() {
        return local.display().to_string();
    }

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.teachable-vision/features.tvc")
}
