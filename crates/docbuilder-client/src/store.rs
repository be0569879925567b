//! Template store backed by the REST API.

use crate::config::{ClientConfig, csrf_token_from_cookie};
use crate::error::ClientError;
use docbuilder_core::store::{BoxFuture, StoreError, StoreResult, TemplateStore};
use docbuilder_core::template::{
    SourceFile, SourceFileId, SourceFileSummary, SourceUpload, Template, TemplateCreate,
    TemplateId, TemplateSummary, TemplateUpdate,
};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Header carrying the CSRF token on unsafe requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// HTTP client for the template API.
///
/// Session cookies set by the server are kept for later requests, and the
/// `csrftoken` cookie among them is echoed back as the CSRF header.
pub struct HttpTemplateStore {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    csrf_token: Option<String>,
}

impl HttpTemplateStore {
    /// Create a store from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = config.base()?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            jar,
            base,
            csrf_token: config.csrf_token,
        })
    }

    /// Create a store configured from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// CSRF token for a request to `url`: the session cookie if the server
    /// set one, otherwise the configured token.
    fn csrf_token_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|cookies| cookies.to_str().ok().and_then(csrf_token_from_cookie))
            .or_else(|| self.csrf_token.clone())
    }

    fn request(&self, method: Method, path: &str) -> StoreResult<RequestBuilder> {
        let url = self
            .base
            .join(path)
            .map_err(|e| StoreError::Request(format!("bad endpoint {}: {}", path, e)))?;
        log::debug!("{} {}", method, url);
        let unsafe_method = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
        let token = if unsafe_method { self.csrf_token_for(&url) } else { None };
        let mut builder = self.http.request(method, url);
        if let Some(token) = token {
            builder = builder.header(CSRF_HEADER, token);
        }
        Ok(builder)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> StoreResult<T> {
        let body = self.execute(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, builder: RequestBuilder) -> StoreResult<String> {
        let response: Response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            let err = StoreError::from_status(status.as_u16(), &body);
            log::warn!("Template API returned {}: {}", status, err);
            return Err(err);
        }
        Ok(body)
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    // No complete response arrived.
    if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        log::warn!("Template API unreachable: {}", err);
        StoreError::Unreachable
    } else if err.is_decode() {
        StoreError::Serialization(err.to_string())
    } else {
        StoreError::Request(err.to_string())
    }
}

impl TemplateStore for HttpTemplateStore {
    fn list_templates(&self) -> BoxFuture<'_, StoreResult<Vec<TemplateSummary>>> {
        Box::pin(async move {
            let builder = self.request(Method::GET, "templates/")?;
            self.fetch(builder).await
        })
    }

    fn get_template(&self, id: TemplateId) -> BoxFuture<'_, StoreResult<Template>> {
        Box::pin(async move {
            let builder = self.request(Method::GET, &format!("templates/{}/", id))?;
            self.fetch(builder).await
        })
    }

    fn create_template(&self, payload: TemplateCreate) -> BoxFuture<'_, StoreResult<Template>> {
        Box::pin(async move {
            let builder = self.request(Method::POST, "templates/")?.json(&payload);
            self.fetch(builder).await
        })
    }

    fn update_template(
        &self,
        id: TemplateId,
        payload: TemplateUpdate,
    ) -> BoxFuture<'_, StoreResult<Template>> {
        Box::pin(async move {
            let builder = self
                .request(Method::PATCH, &format!("templates/{}/", id))?
                .json(&payload);
            self.fetch(builder).await
        })
    }

    fn delete_template(&self, id: TemplateId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let builder = self.request(Method::DELETE, &format!("templates/{}/", id))?;
            self.execute(builder).await.map(|_| ())
        })
    }

    fn list_source_files(&self) -> BoxFuture<'_, StoreResult<Vec<SourceFileSummary>>> {
        Box::pin(async move {
            let builder = self.request(Method::GET, "source-files/")?;
            self.fetch(builder).await
        })
    }

    fn get_source_file(&self, id: SourceFileId) -> BoxFuture<'_, StoreResult<SourceFile>> {
        Box::pin(async move {
            let builder = self.request(Method::GET, &format!("source-files/{}/", id))?;
            self.fetch(builder).await
        })
    }

    fn upload_source_file(
        &self,
        upload: SourceUpload,
        template_id: Option<TemplateId>,
    ) -> BoxFuture<'_, StoreResult<SourceFile>> {
        Box::pin(async move {
            let mime = upload.mime_type();
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(mime)
                .map_err(|e| StoreError::Request(e.to_string()))?;
            let mut form = Form::new().part("file", part);
            if let Some(id) = template_id {
                form = form.text("template_id", id.to_string());
            }
            let builder = self.request(Method::POST, "upload-source-file/")?.multipart(form);
            self.fetch(builder).await
        })
    }

    fn delete_source_file(&self, id: SourceFileId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let builder = self.request(Method::DELETE, &format!("source-files/{}/", id))?;
            self.execute(builder).await.map(|_| ())
        })
    }
}
