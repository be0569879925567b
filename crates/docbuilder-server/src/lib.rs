//! Document Builder Development Server
//!
//! An in-memory stand-in for the template REST API. Everything is owned by a
//! single demo user; there is no authentication, CSRF check or file parsing.
//!
//! ## Routes
//!
//! All routes live under the configurable base path (`/api/documents` by
//! default) and end with a slash:
//!
//! ```text
//! GET    /templates/             GET    /source-files/
//! POST   /templates/             GET    /source-files/{id}/
//! GET    /templates/{id}/        DELETE /source-files/{id}/
//! PATCH  /templates/{id}/        POST   /upload-source-file/
//! DELETE /templates/{id}/
//! ```

mod api;
mod error;
mod state;

pub use error::{ApiError, ServerError};
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use docbuilder_core::template::MAX_SOURCE_FILE_SIZE;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3030";
/// Default API mount point.
pub const DEFAULT_BASE_PATH: &str = "/api/documents";

/// Request bodies may exceed the largest accepted file by this much.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3030)),
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `DOCBUILDER_ADDR` and `DOCBUILDER_BASE_PATH` from the environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let addr = lookup("DOCBUILDER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse()
            .map_err(|e| ServerError::Config(format!("DOCBUILDER_ADDR {:?}: {}", addr, e)))?;
        let base_path = lookup("DOCBUILDER_BASE_PATH")
            .map(|path| normalize_base_path(&path))
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());
        Ok(Self { addr, base_path })
    }
}

/// Leading slash, no trailing slash; the root becomes an empty string.
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Build the application router.
pub fn app(state: Arc<AppState>, base_path: &str) -> Router {
    let api = api::routes()
        .layer(DefaultBodyLimit::max(MAX_SOURCE_FILE_SIZE as usize + MULTIPART_OVERHEAD));
    let base_path = normalize_base_path(base_path);
    let router = if base_path.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&base_path, api)
    };

    router
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check
async fn health() -> &'static str {
    "ok"
}
