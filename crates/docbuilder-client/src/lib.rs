//! Document Builder HTTP Client
//!
//! A [`TemplateStore`](docbuilder_core::TemplateStore) that talks to the
//! template REST API: JSON bodies, cookie session, `X-CSRFToken` on unsafe
//! methods and multipart source file uploads.

mod config;
mod error;
mod store;

pub use config::{
    CSRF_COOKIE, ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT, csrf_token_from_cookie,
};
pub use error::ClientError;
pub use store::{CSRF_HEADER, HttpTemplateStore};
