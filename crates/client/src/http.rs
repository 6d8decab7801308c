//! HTTP implementation of [`LayoutService`] using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use x121_layout_core::types::DbId;

use crate::config::ClientConfig;
use crate::error::LayoutApiError;
use crate::models::{
    AdminLayoutPreset, CreateAdminPreset, CreateUserLayout, DataResponse, LayoutRecord,
    UpdateAdminPreset, UpdateUserLayout,
};
use crate::service::LayoutService;

const USER_LAYOUTS: &str = "/user/layouts";
const ADMIN_PRESETS: &str = "/admin/layout-presets";

/// Layout persistence over the backend's REST API.
pub struct HttpLayoutService {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpLayoutService {
    /// Build a client with the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, LayoutApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(
            client,
            config.api_url.clone(),
            config.token.clone(),
        ))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, api_url: String, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.api_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, LayoutApiError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::parse_data(response).await
    }

    async fn send_data<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, LayoutApiError> {
        let response = self.request(method, path).json(body).send().await?;
        Self::parse_data(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), LayoutApiError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Return the response unchanged on success, or an
    /// [`LayoutApiError::Api`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, LayoutApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LayoutApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Unwrap a `{ "data": T }` envelope from a successful response.
    async fn parse_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, LayoutApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        let envelope: DataResponse<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl LayoutService for HttpLayoutService {
    async fn list_layouts(&self) -> Result<Vec<LayoutRecord>, LayoutApiError> {
        self.get_data(USER_LAYOUTS).await
    }

    async fn get_layout(&self, id: DbId) -> Result<LayoutRecord, LayoutApiError> {
        self.get_data(&format!("{USER_LAYOUTS}/{id}")).await
    }

    async fn create_layout(
        &self,
        input: &CreateUserLayout,
    ) -> Result<LayoutRecord, LayoutApiError> {
        let record: LayoutRecord = self.send_data(Method::POST, USER_LAYOUTS, input).await?;
        tracing::debug!(layout_id = record.id, layout_name = %record.layout_name, "Layout created");
        Ok(record)
    }

    async fn update_layout(
        &self,
        id: DbId,
        input: &UpdateUserLayout,
    ) -> Result<LayoutRecord, LayoutApiError> {
        self.send_data(Method::PUT, &format!("{USER_LAYOUTS}/{id}"), input)
            .await
    }

    async fn delete_layout(&self, id: DbId) -> Result<(), LayoutApiError> {
        self.delete(&format!("{USER_LAYOUTS}/{id}")).await
    }

    async fn list_admin_presets(&self) -> Result<Vec<AdminLayoutPreset>, LayoutApiError> {
        self.get_data(ADMIN_PRESETS).await
    }

    async fn create_admin_preset(
        &self,
        input: &CreateAdminPreset,
    ) -> Result<AdminLayoutPreset, LayoutApiError> {
        self.send_data(Method::POST, ADMIN_PRESETS, input).await
    }

    async fn update_admin_preset(
        &self,
        id: DbId,
        input: &UpdateAdminPreset,
    ) -> Result<AdminLayoutPreset, LayoutApiError> {
        self.send_data(Method::PUT, &format!("{ADMIN_PRESETS}/{id}"), input)
            .await
    }

    async fn delete_admin_preset(&self, id: DbId) -> Result<(), LayoutApiError> {
        self.delete(&format!("{ADMIN_PRESETS}/{id}")).await
    }
}
