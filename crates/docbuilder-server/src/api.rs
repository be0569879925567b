//! REST handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use docbuilder_core::template::{
    SourceFile, SourceFileId, SourceFileSummary, SourceUpload, Template, TemplateCreate,
    TemplateId, TemplateSummary, TemplateUpdate,
};
use std::sync::Arc;
use tracing::{info, warn};

type AppResult<T> = Result<T, ApiError>;

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/templates/", get(list_templates).post(create_template))
        .route(
            "/templates/{id}/",
            get(get_template).patch(update_template).delete(delete_template),
        )
        .route("/source-files/", get(list_source_files))
        .route(
            "/source-files/{id}/",
            get(get_source_file).delete(delete_source_file),
        )
        .route("/upload-source-file/", post(upload_source_file))
}

async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<TemplateSummary>> {
    Json(state.list_templates())
}

async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TemplateId>,
) -> AppResult<Json<Template>> {
    Ok(Json(state.get_template(id)?))
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TemplateCreate>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Template>)> {
    let Json(payload) = payload?;
    let template = state
        .create_template(payload)
        .inspect_err(|e| warn!("Rejected template: {}", e))?;
    info!("Created template {} ({})", template.id, template.title);
    Ok((StatusCode::CREATED, Json(template)))
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TemplateId>,
    payload: Result<Json<TemplateUpdate>, JsonRejection>,
) -> AppResult<Json<Template>> {
    let Json(payload) = payload?;
    let template = state.update_template(id, payload)?;
    info!("Updated template {}", id);
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TemplateId>,
) -> AppResult<StatusCode> {
    state.delete_template(id)?;
    info!("Deleted template {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_source_files(State(state): State<Arc<AppState>>) -> Json<Vec<SourceFileSummary>> {
    Json(state.list_source_files())
}

async fn get_source_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SourceFileId>,
) -> AppResult<Json<SourceFile>> {
    Ok(Json(state.get_source_file(id)?))
}

async fn delete_source_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SourceFileId>,
) -> AppResult<StatusCode> {
    state.delete_source_file(id)?;
    info!("Deleted source file {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload with a `file` part and an optional `template_id` part.
async fn upload_source_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<SourceFile>)> {
    let mut upload = None;
    let mut template_id = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                upload = Some(SourceUpload::new(file_name, bytes.to_vec()));
            }
            Some("template_id") => {
                let text = field.text().await?;
                let text = text.trim();
                if !text.is_empty() && text != "null" {
                    let id = text
                        .parse::<TemplateId>()
                        .map_err(|_| ApiError::field("template_id", "Введите правильное число."))?;
                    template_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| ApiError::field("file", "Ни одного файла не было отправлено."))?;
    let name = upload.file_name.clone();
    let file = state
        .upload_source_file(upload, template_id)
        .inspect_err(|e| warn!("Rejected upload {}: {}", name, e))?;
    info!("Stored source file {} ({}, {} bytes)", file.id, name, file.file_size);
    Ok((StatusCode::CREATED, Json(file)))
}

#[cfg(test)]
mod tests {
    use crate::{AppState, DEFAULT_BASE_PATH, app};
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use axum::Router;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "docbuilder-test-boundary";

    fn router() -> Router {
        app(Arc::new(AppState::new()), DEFAULT_BASE_PATH)
    }

    fn url(path: &str) -> String {
        format!("{}{}", DEFAULT_BASE_PATH, path)
    }

    async fn send(
        router: &Router,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(url(path));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        read(response).await
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn upload(
        router: &Router,
        name: &str,
        bytes: &[u8],
        template_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
        if let Some(id) = template_id {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"template_id\"\r\n\r\n{id}\r\n")
                    .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(url("/upload-source-file/"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        read(response).await
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_template_crud() {
        let router = router();
        let (status, created) = send(
            &router,
            Method::POST,
            "/templates/",
            Some(json!({"title": "Акт", "data": {"blocks": [], "zoom": 120}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["description"], "");
        assert_eq!(created["owner_username"], "demo_user");
        assert_eq!(created["data"]["pageWidth"], 794.0);

        let (status, fetched) = send(&router, Method::GET, "/templates/1/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["zoom"], 120.0);

        let (status, updated) = send(
            &router,
            Method::PATCH,
            "/templates/1/",
            Some(json!({"description": "обновлено"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Акт");
        assert_eq!(updated["description"], "обновлено");

        let (status, list) = send(&router, Method::GET, "/templates/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert!(list[0].get("data").is_none());

        let (status, _) = send(&router, Method::DELETE, "/templates/1/", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&router, Method::GET, "/templates/1/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_blank_title_is_field_error() {
        let router = router();
        let (status, body) = send(
            &router,
            Method::POST,
            "/templates/",
            Some(json!({"title": "", "data": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["title"][0].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let router = router();
        let request = Request::builder()
            .method(Method::POST)
            .uri(url("/templates/"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = read(router.oneshot(request).await.unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("JSON parse error"));
    }

    #[tokio::test]
    async fn test_upload_and_list_source_files() {
        let router = router();
        send(&router, Method::POST, "/templates/", Some(json!({"title": "T", "data": {}}))).await;

        let (status, file) = upload(&router, "scan.pdf", b"%PDF-1.4", Some("1")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(file["template"], 1);
        assert_eq!(file["template_title"], "T");
        assert_eq!(file["mime_type"], "application/pdf");
        assert_eq!(file["file_size"], 8);
        assert_eq!(file["parsed_content"], json!([]));

        let (status, _) = upload(&router, "notes.docx", b"PK", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, list) = send(&router, Method::GET, "/source-files/", None).await;
        let names: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["original_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["notes.docx", "scan.pdf"]);

        let (status, full) = send(&router, Method::GET, "/source-files/1/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(full["original_name"], "scan.pdf");

        let (status, _) = send(&router, Method::DELETE, "/source-files/1/", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&router, Method::DELETE, "/source-files/1/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let router = router();
        let (status, body) = upload(&router, "notes.txt", b"hello", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["file"][0].as_str().unwrap().contains("pdf, docx"));

        let (status, body) = upload(&router, "a.pdf", b"x", Some("99")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["template_id"][0].is_string());

        let (status, body) = upload(&router, "a.pdf", b"x", Some("abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["template_id"][0].is_string());
    }
}
