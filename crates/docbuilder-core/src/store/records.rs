//! Record-keeping rules shared by in-process template backends.
//!
//! [`MemoryStore`](super::MemoryStore) and the development server keep
//! templates and source files in different containers but must agree on how
//! records are created, ordered and kept consistent with each other.

use crate::template::{
    SourceFile, SourceFileId, SourceUpload, Template, TemplateCreate, TemplateId, TemplateUpdate,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicI64, Ordering};

/// Owner recorded on everything a local backend creates.
pub const DEMO_OWNER_ID: i64 = 1;
pub const DEMO_OWNER_USERNAME: &str = "demo_user";

/// RFC 3339 timestamps that strictly increase across calls, even within
/// one clock tick.
#[derive(Debug, Default)]
pub struct Timestamps {
    /// Microseconds of the latest stamp handed out.
    last: AtomicI64,
}

impl Timestamps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, strictly later than any earlier stamp.
    pub fn next(&self) -> String {
        let now = Utc::now().timestamp_micros();
        let micros = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(previous) | Err(previous) => now.max(previous + 1),
        };
        DateTime::<Utc>::from_timestamp_micros(micros)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Template {
    /// Build a new record owned by the demo user.
    pub fn from_create(id: TemplateId, payload: TemplateCreate, stamp: String) -> Self {
        Self {
            id,
            owner: Some(DEMO_OWNER_ID),
            owner_username: Some(DEMO_OWNER_USERNAME.to_string()),
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            data: payload.data,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    /// Apply a partial update; absent fields keep their value.
    pub fn apply_update(&mut self, payload: TemplateUpdate, stamp: String) {
        if let Some(title) = payload.title {
            self.title = title;
        }
        if let Some(description) = payload.description {
            self.description = description;
        }
        if let Some(data) = payload.data {
            self.data = data;
        }
        self.updated_at = stamp;
    }

    /// Listing order: most recently updated first, newer ids first on ties.
    pub fn newest_first(a: &Template, b: &Template) -> CmpOrdering {
        b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id))
    }
}

impl SourceFile {
    /// Build a new record for an accepted upload, stored at `path`.
    pub fn from_upload(
        id: SourceFileId,
        upload: SourceUpload,
        template: Option<&Template>,
        path: String,
        stamp: String,
    ) -> Self {
        Self {
            id,
            owner: Some(DEMO_OWNER_ID),
            owner_username: Some(DEMO_OWNER_USERNAME.to_string()),
            template: template.map(|t| t.id),
            template_title: template.map(|t| t.title.clone()),
            file_url: Some(format!("/media/{}", path)),
            file: Some(path),
            mime_type: upload.mime_type().to_string(),
            file_size: upload.bytes.len() as u64,
            original_name: upload.file_name,
            parsed_content: Vec::new(),
            uploaded_at: stamp,
        }
    }

    /// Follow a change to `template` if this file is bound to it.
    pub fn sync_template(&mut self, template: &Template) {
        if self.template == Some(template.id) {
            self.template_title = Some(template.title.clone());
        }
    }

    /// Drop the binding to a deleted template; the file itself survives.
    pub fn unbind_template(&mut self, id: TemplateId) {
        if self.template == Some(id) {
            self.template = None;
            self.template_title = None;
        }
    }

    /// Listing order: most recently uploaded first, newer ids first on ties.
    pub fn newest_first(a: &SourceFile, b: &SourceFile) -> CmpOrdering {
        b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id))
    }
}
