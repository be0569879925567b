//! Template service abstraction.

mod memory;
mod records;

pub use memory::MemoryStore;
pub use records::{DEMO_OWNER_ID, DEMO_OWNER_USERNAME, Timestamps};

use crate::template::{
    SourceFile, SourceFileId, SourceFileSummary, SourceUpload, Template, TemplateCreate,
    TemplateId, TemplateSummary, TemplateUpdate,
};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Template service errors.
///
/// Each variant carries the message shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("auth required")]
    AuthRequired,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    /// Field errors reported by the service, flattened into one line.
    #[error("{0}")]
    Validation(String),
    #[error("server error {0}")]
    Server(u16),
    #[error("server unreachable")]
    Unreachable,
    #[error("request failed: {0}")]
    Request(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400 => {
                let message = serde_json::from_str::<Value>(body)
                    .map(|value| flatten_field_errors(&value))
                    .unwrap_or_default();
                if message.is_empty() {
                    StoreError::Validation("invalid request data".to_string())
                } else {
                    StoreError::Validation(message)
                }
            }
            401 => StoreError::AuthRequired,
            403 => StoreError::Forbidden,
            404 => StoreError::NotFound,
            500..=599 => StoreError::Server(status),
            _ => StoreError::Request(format!("unexpected status {}", status)),
        }
    }

    /// Validation error for a single field message.
    pub fn field(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Join every message of a `{"field": ["msg", ...]}` body with `", "`.
///
/// Arrays are flattened one level; plain strings are taken as-is. Fields are
/// visited in key order. Anything that is not an object yields an empty
/// string.
pub fn flatten_field_errors(body: &Value) -> String {
    let Value::Object(fields) = body else {
        return String::new();
    };
    let mut messages = Vec::new();
    for value in fields.values() {
        match value {
            Value::Array(items) => messages.extend(items.iter().map(message_text)),
            other => messages.push(message_text(other)),
        }
    }
    messages.join(", ")
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The remote template service as seen by the editor host.
///
/// Implementations talk HTTP, or keep everything in memory for tests and
/// offline use.
pub trait TemplateStore: Send + Sync {
    /// List templates, most recently updated first.
    fn list_templates(&self) -> BoxFuture<'_, StoreResult<Vec<TemplateSummary>>>;

    /// Get a full template.
    fn get_template(&self, id: TemplateId) -> BoxFuture<'_, StoreResult<Template>>;

    /// Create a template; the service assigns the id.
    fn create_template(&self, payload: TemplateCreate) -> BoxFuture<'_, StoreResult<Template>>;

    /// Partially update a template.
    fn update_template(
        &self,
        id: TemplateId,
        payload: TemplateUpdate,
    ) -> BoxFuture<'_, StoreResult<Template>>;

    /// Delete a template.
    fn delete_template(&self, id: TemplateId) -> BoxFuture<'_, StoreResult<()>>;

    /// List source files, most recently uploaded first.
    fn list_source_files(&self) -> BoxFuture<'_, StoreResult<Vec<SourceFileSummary>>>;

    /// Get a source file with its parsed content.
    fn get_source_file(&self, id: SourceFileId) -> BoxFuture<'_, StoreResult<SourceFile>>;

    /// Upload a source file, optionally bound to a template.
    fn upload_source_file(
        &self,
        upload: SourceUpload,
        template_id: Option<TemplateId>,
    ) -> BoxFuture<'_, StoreResult<SourceFile>>;

    /// Delete a source file.
    fn delete_source_file(&self, id: SourceFileId) -> BoxFuture<'_, StoreResult<()>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
