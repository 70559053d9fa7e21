use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::{Origin, Url};

use crate::cgc::model::{Page, PlatformFile, PlatformTask};

const AUTH_HEADER: &str = "X-SBG-Auth-Token";
const PAGE_LIMIT: &str = "100";
const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} returned status {status}: {preview}")]
    Status { url: String, status: u16, preview: String },
    #[error("can't decode response from {url}: {source}")]
    Decode { url: String, source: serde_json::Error },
    #[error("refusing to follow page link {href} away from the API endpoint")]
    ForeignLink { href: String },
}

/// Queries against the compute platform
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// All files in `project` whose origin is `task_id`
    async fn files_from_task(&self, project: &str, task_id: &str) -> Result<Vec<PlatformFile>, ApiError>;

    async fn task(&self, task_id: &str) -> Result<PlatformTask, ApiError>;
}

pub struct HttpApi {
    http: reqwest::Client,
    token: String,
    origin: Origin,
    url_files: String,
    url_tasks: String,
}

impl HttpApi {
    pub fn new(endpoint: &Url, token: &str, timeout: Duration) -> anyhow::Result<HttpApi> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base = endpoint.as_str().trim_end_matches('/');
        Ok(HttpApi {
            http,
            token: token.to_string(),
            origin: endpoint.origin(),
            url_files: format!("{base}/files"),
            url_tasks: format!("{base}/tasks"),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &str) -> Result<T, ApiError> {
        let request_error = |source| ApiError::Request { url: url.to_string(), source };
        let resp = request
            .header(AUTH_HEADER, &self.token)
            .send()
            .await
            .map_err(request_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(request_error)?;
        debug!("GET {url} -> {status}");

        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                preview: preview_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url: url.to_string(), source })
    }

    /// Page links carry the token, so they must point back at the configured endpoint
    fn checked_link(&self, href: String) -> Result<String, ApiError> {
        match Url::parse(&href) {
            Ok(link) if link.origin() == self.origin => Ok(href),
            _ => Err(ApiError::ForeignLink { href }),
        }
    }
}

#[async_trait]
impl PlatformApi for HttpApi {
    async fn files_from_task(&self, project: &str, task_id: &str) -> Result<Vec<PlatformFile>, ApiError> {
        info!("Querying files produced by task {task_id} in {project}");
        let mut url = self.url_files.clone();
        let mut request = self
            .http
            .get(&url)
            .query(&[("project", project), ("origin.task", task_id), ("limit", PAGE_LIMIT)]);
        let mut files: Vec<PlatformFile> = Vec::new();

        loop {
            let page: Page<PlatformFile> = self.get_json(request, &url).await?;
            let next = page.next_href().map(str::to_string);
            files.extend(page.items);
            match next {
                Some(href) => {
                    let href = self.checked_link(href)?;
                    request = self.http.get(&href);
                    url = href;
                }
                None => break,
            }
        }

        info!("Task {task_id} produced {} files", files.len());
        Ok(files)
    }

    async fn task(&self, task_id: &str) -> Result<PlatformTask, ApiError> {
        info!("Fetching details of task {task_id}");
        let url = format!("{}/{}", self.url_tasks, task_id);
        self.get_json(self.http.get(&url), &url).await
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
