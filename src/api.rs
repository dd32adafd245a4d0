use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{LabError, Result};
use crate::listing::PageRequest;
use crate::source::PageSource;

/// HTTP client for the lab admin API
#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, url: &str, request: PageRequest) -> Result<Value> {
        let mut builder = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(&[("page", request.page), ("limit", request.limit)]);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LabError::Api(format!("{} {}: {}", url, status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| LabError::Decode(e.to_string()))
    }
}

/// `GET /tests?page=&limit=`
#[derive(Debug, Clone)]
pub struct TestsEndpoint {
    api: Arc<ApiClient>,
}

impl TestsEndpoint {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for TestsEndpoint {
    fn name(&self) -> &str {
        "tests"
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Value> {
        let url = self.api.api_url("/tests");
        self.api.get_json(&url, request).await
    }
}

/// `GET /branches?page=&limit=`
#[derive(Debug, Clone)]
pub struct BranchesEndpoint {
    api: Arc<ApiClient>,
}

impl BranchesEndpoint {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for BranchesEndpoint {
    fn name(&self) -> &str {
        "branches"
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Value> {
        let url = self.api.api_url("/branches");
        self.api.get_json(&url, request).await
    }
}
