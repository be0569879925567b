//! Shared in-memory records.

use crate::error::ApiError;
use dashmap::DashMap;
use docbuilder_core::store::Timestamps;
use docbuilder_core::template::{
    SourceFile, SourceFileId, SourceFileSummary, SourceUpload, Template, TemplateCreate,
    TemplateId, TemplateSummary, TemplateUpdate, UNKNOWN_TEMPLATE_MESSAGE, validate_title,
    validate_upload,
};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Shared application state
#[derive(Default)]
pub struct AppState {
    templates: DashMap<TemplateId, Template>,
    source_files: DashMap<SourceFileId, SourceFile>,
    last_template_id: AtomicI64,
    last_source_file_id: AtomicI64,
    stamps: Timestamps,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_templates(&self) -> Vec<TemplateSummary> {
        let mut templates: Vec<Template> = self.templates.iter().map(|t| t.clone()).collect();
        templates.sort_by(Template::newest_first);
        templates.iter().map(TemplateSummary::from).collect()
    }

    pub fn get_template(&self, id: TemplateId) -> Result<Template, ApiError> {
        self.templates
            .get(&id)
            .map(|t| t.clone())
            .ok_or(ApiError::NotFound)
    }

    pub fn create_template(&self, payload: TemplateCreate) -> Result<Template, ApiError> {
        validate_title(&payload.title).map_err(|e| ApiError::field("title", e))?;
        let id = self.last_template_id.fetch_add(1, Ordering::SeqCst) + 1;
        let template = Template::from_create(id, payload, self.stamps.next());
        self.templates.insert(id, template.clone());
        Ok(template)
    }

    pub fn update_template(
        &self,
        id: TemplateId,
        payload: TemplateUpdate,
    ) -> Result<Template, ApiError> {
        if let Some(title) = &payload.title {
            validate_title(title).map_err(|e| ApiError::field("title", e))?;
        }
        let template = {
            let mut template = self.templates.get_mut(&id).ok_or(ApiError::NotFound)?;
            template.apply_update(payload, self.stamps.next());
            template.clone()
        };
        for mut file in self.source_files.iter_mut() {
            file.sync_template(&template);
        }
        Ok(template)
    }

    pub fn delete_template(&self, id: TemplateId) -> Result<(), ApiError> {
        self.templates.remove(&id).ok_or(ApiError::NotFound)?;
        for mut file in self.source_files.iter_mut() {
            file.unbind_template(id);
        }
        Ok(())
    }

    pub fn list_source_files(&self) -> Vec<SourceFileSummary> {
        let mut files: Vec<SourceFile> = self.source_files.iter().map(|f| f.clone()).collect();
        files.sort_by(SourceFile::newest_first);
        files.iter().map(SourceFileSummary::from).collect()
    }

    pub fn get_source_file(&self, id: SourceFileId) -> Result<SourceFile, ApiError> {
        self.source_files
            .get(&id)
            .map(|f| f.clone())
            .ok_or(ApiError::NotFound)
    }

    pub fn upload_source_file(
        &self,
        upload: SourceUpload,
        template_id: Option<TemplateId>,
    ) -> Result<SourceFile, ApiError> {
        validate_upload(&upload.file_name, upload.bytes.len() as u64)
            .map_err(|e| ApiError::field("file", e))?;
        let template = match template_id {
            Some(id) => Some(
                self.templates
                    .get(&id)
                    .map(|t| t.clone())
                    .ok_or_else(|| ApiError::field("template_id", UNKNOWN_TEMPLATE_MESSAGE))?,
            ),
            None => None,
        };

        let id = self.last_source_file_id.fetch_add(1, Ordering::SeqCst) + 1;
        // Stored names never collide.
        let path = format!("source_files/{}_{}", Uuid::new_v4().simple(), upload.file_name);
        let file =
            SourceFile::from_upload(id, upload, template.as_ref(), path, self.stamps.next());
        self.source_files.insert(id, file.clone());
        Ok(file)
    }

    pub fn delete_source_file(&self, id: SourceFileId) -> Result<(), ApiError> {
        self.source_files
            .remove(&id)
            .map(|_| ())
            .ok_or(ApiError::NotFound)
    }
}
