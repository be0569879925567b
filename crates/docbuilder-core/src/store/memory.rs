//! In-memory template store.

use super::records::Timestamps;
use super::{BoxFuture, StoreError, StoreResult, TemplateStore};
use crate::template::{
    SourceFile, SourceFileId, SourceFileSummary, SourceUpload, Template, TemplateCreate,
    TemplateId, TemplateSummary, TemplateUpdate, UNKNOWN_TEMPLATE_MESSAGE, validate_title,
    validate_upload,
};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct Records {
    templates: BTreeMap<TemplateId, Template>,
    source_files: BTreeMap<SourceFileId, SourceFile>,
    last_template_id: TemplateId,
    last_source_file_id: SourceFileId,
}

/// In-memory template store for testing and offline use.
///
/// Behaves like the remote service for a single demo user: ids count up
/// from 1, titles and uploads are validated, and files are not parsed.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
    stamps: Timestamps,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Records>> {
        self.records
            .read()
            .map_err(|e| StoreError::Request(format!("Lock error: {}", e)))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Records>> {
        self.records
            .write()
            .map_err(|e| StoreError::Request(format!("Lock error: {}", e)))
    }
}

impl TemplateStore for MemoryStore {
    fn list_templates(&self) -> BoxFuture<'_, StoreResult<Vec<TemplateSummary>>> {
        Box::pin(async move {
            let records = self.read()?;
            let mut templates: Vec<&Template> = records.templates.values().collect();
            templates.sort_by(|a, b| Template::newest_first(a, b));
            Ok(templates.into_iter().map(TemplateSummary::from).collect())
        })
    }

    fn get_template(&self, id: TemplateId) -> BoxFuture<'_, StoreResult<Template>> {
        Box::pin(async move {
            let records = self.read()?;
            records.templates.get(&id).cloned().ok_or(StoreError::NotFound)
        })
    }

    fn create_template(&self, payload: TemplateCreate) -> BoxFuture<'_, StoreResult<Template>> {
        Box::pin(async move {
            validate_title(&payload.title).map_err(StoreError::field)?;
            let mut records = self.write()?;
            records.last_template_id += 1;
            let template =
                Template::from_create(records.last_template_id, payload, self.stamps.next());
            records.templates.insert(template.id, template.clone());
            Ok(template)
        })
    }

    fn update_template(
        &self,
        id: TemplateId,
        payload: TemplateUpdate,
    ) -> BoxFuture<'_, StoreResult<Template>> {
        Box::pin(async move {
            if let Some(title) = &payload.title {
                validate_title(title).map_err(StoreError::field)?;
            }
            let mut records = self.write()?;
            let template = records.templates.get_mut(&id).ok_or(StoreError::NotFound)?;
            template.apply_update(payload, self.stamps.next());
            let template = template.clone();
            for file in records.source_files.values_mut() {
                file.sync_template(&template);
            }
            Ok(template)
        })
    }

    fn delete_template(&self, id: TemplateId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut records = self.write()?;
            records.templates.remove(&id).ok_or(StoreError::NotFound)?;
            for file in records.source_files.values_mut() {
                file.unbind_template(id);
            }
            Ok(())
        })
    }

    fn list_source_files(&self) -> BoxFuture<'_, StoreResult<Vec<SourceFileSummary>>> {
        Box::pin(async move {
            let records = self.read()?;
            let mut files: Vec<&SourceFile> = records.source_files.values().collect();
            files.sort_by(|a, b| SourceFile::newest_first(a, b));
            Ok(files.into_iter().map(SourceFileSummary::from).collect())
        })
    }

    fn get_source_file(&self, id: SourceFileId) -> BoxFuture<'_, StoreResult<SourceFile>> {
        Box::pin(async move {
            let records = self.read()?;
            records.source_files.get(&id).cloned().ok_or(StoreError::NotFound)
        })
    }

    fn upload_source_file(
        &self,
        upload: SourceUpload,
        template_id: Option<TemplateId>,
    ) -> BoxFuture<'_, StoreResult<SourceFile>> {
        Box::pin(async move {
            validate_upload(&upload.file_name, upload.bytes.len() as u64)
                .map_err(StoreError::field)?;
            let mut records = self.write()?;
            let template = match template_id {
                Some(id) => match records.templates.get(&id) {
                    Some(template) => Some(template.clone()),
                    None => return Err(StoreError::field(UNKNOWN_TEMPLATE_MESSAGE)),
                },
                None => None,
            };
            records.last_source_file_id += 1;
            let path = format!("source_files/{}", upload.file_name);
            let file = SourceFile::from_upload(
                records.last_source_file_id,
                upload,
                template.as_ref(),
                path,
                self.stamps.next(),
            );
            records.source_files.insert(file.id, file.clone());
            Ok(file)
        })
    }

    fn delete_source_file(&self, id: SourceFileId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut records = self.write()?;
            records.source_files.remove(&id).ok_or(StoreError::NotFound)?;
            Ok(())
        })
    }
}
