//! Template and source-file records exchanged with the template service.

use crate::block::{Block, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, Page};
use crate::history::DEFAULT_ZOOM;
use serde::{Deserialize, Serialize};

/// Server-assigned template identifier.
pub type TemplateId = i64;
/// Server-assigned source file identifier.
pub type SourceFileId = i64;

/// Title used when a template is saved without one.
pub const UNTITLED_TEMPLATE: &str = "Без названия";

/// The persisted payload of a template.
///
/// Missing fields fall back to an empty A4 page at 100% zoom; the backend
/// stores `{}` for templates created without data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentData {
    pub blocks: Vec<Block>,
    pub zoom: f64,
    pub page_width: f64,
    pub page_height: f64,
}

impl Default for DocumentData {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            zoom: DEFAULT_ZOOM,
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
        }
    }
}

impl DocumentData {
    pub fn page(&self) -> Page {
        Page::new(self.page_width, self.page_height)
    }
}

/// Full template record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data: DocumentData,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Template list entry (no document data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: TemplateId,
    #[serde(default)]
    pub owner_username: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id,
            owner_username: template.owner_username.clone().unwrap_or_default(),
            title: template.title.clone(),
            description: template.description.clone(),
            created_at: template.created_at.clone(),
            updated_at: template.updated_at.clone(),
        }
    }
}

/// Body of a template create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCreate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: DocumentData,
}

/// Body of a template partial update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DocumentData>,
}

/// Text of one parsed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPage {
    pub page: u32,
    pub text: String,
}

/// Full source file record including parsed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: SourceFileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub template_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: u64,
    #[serde(default)]
    pub parsed_content: Vec<ParsedPage>,
    #[serde(default)]
    pub uploaded_at: String,
}

/// Source file list entry (no parsed text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFileSummary {
    pub id: SourceFileId,
    #[serde(default)]
    pub owner_username: String,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub template_title: Option<String>,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: u64,
    #[serde(default)]
    pub uploaded_at: String,
}

impl From<&SourceFile> for SourceFileSummary {
    fn from(file: &SourceFile) -> Self {
        Self {
            id: file.id,
            owner_username: file.owner_username.clone().unwrap_or_default(),
            template: file.template,
            template_title: file.template_title.clone(),
            original_name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            file_size: file.file_size,
            uploaded_at: file.uploaded_at.clone(),
        }
    }
}

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SourceUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        mime_type_for(&self.file_name)
    }
}

/// Longest accepted template title, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Check a template title the way the backend does.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Это поле не может быть пустым.".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Убедитесь, что это значение содержит не более {MAX_TITLE_LENGTH} символов."
        ));
    }
    Ok(())
}

/// Rejection for an upload bound to a template that does not exist.
pub const UNKNOWN_TEMPLATE_MESSAGE: &str = "Шаблон с указанным ID не найден или недоступен";

/// Extensions the parser accepts.
pub const ALLOWED_SOURCE_EXTENSIONS: &[&str] = &["pdf", "docx"];
/// Largest accepted upload (50 MiB).
pub const MAX_SOURCE_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Lower-cased extension after the last dot, empty when there is none.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// MIME type derived from the file extension.
pub fn mime_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        _ => "application/octet-stream",
    }
}

/// Check size and extension of an upload.
///
/// Returns the human-readable reason on rejection.
pub fn validate_upload(file_name: &str, size: u64) -> Result<(), String> {
    if size > MAX_SOURCE_FILE_SIZE {
        return Err(format!(
            "Размер файла превышает максимально допустимый ({} МБ)",
            MAX_SOURCE_FILE_SIZE / (1024 * 1024)
        ));
    }
    let extension = file_extension(file_name);
    if !ALLOWED_SOURCE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(format!(
            "Недопустимое расширение файла. Разрешены: {}",
            ALLOWED_SOURCE_EXTENSIONS.join(", ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_data_object_uses_defaults() {
        let json = r#"{"id": 7, "title": "T", "description": "", "data": {},
                      "created_at": "a", "updated_at": "b"}"#;
        let template: Template = serde_json::from_str(json).unwrap();
        assert_eq!(template.data, DocumentData::default());
        assert_eq!(template.data.page(), Page::default());
    }

    #[test]
    fn test_document_data_camel_case() {
        let json = serde_json::to_value(DocumentData::default()).unwrap();
        assert_eq!(json["pageWidth"], 794.0);
        assert_eq!(json["pageHeight"], 1123.0);
        assert_eq!(json["zoom"], 100.0);
    }

    #[test]
    fn test_update_omits_missing_fields() {
        let update = TemplateUpdate {
            title: Some("x".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"title": "x"}));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("a.PDF"), "application/pdf");
        assert_eq!(
            mime_type_for("report.final.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_type_for("old.doc"), "application/msword");
        assert_eq!(mime_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload("a.pdf", 10).is_ok());
        assert!(validate_upload("a.DOCX", 10).is_ok());
        assert!(validate_upload("a.txt", 10).unwrap_err().contains("pdf, docx"));
        assert!(validate_upload("a.pdf", MAX_SOURCE_FILE_SIZE + 1).unwrap_err().contains("50"));
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Договор").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"я".repeat(MAX_TITLE_LENGTH)).is_ok());
        assert!(validate_title(&"я".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_summary_from_template() {
        let template = Template {
            id: 3,
            owner: Some(1),
            owner_username: Some("demo_user".to_string()),
            title: "T".to_string(),
            description: "D".to_string(),
            data: DocumentData::default(),
            created_at: "c".to_string(),
            updated_at: "u".to_string(),
        };
        let summary = TemplateSummary::from(&template);
        assert_eq!(summary.id, 3);
        assert_eq!(summary.owner_username, "demo_user");
    }
}
