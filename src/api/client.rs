use crate::api::error::{ApiError, server_message};
use crate::api::types::{
    ApiCallEvent, ApiCallObserver, HealthStatus, IdentifyRequest, IdentifyResponse,
};
use crate::config::ClientConfig;
use crate::contact::{ContactRecord, snapshot};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};
use url::Url;

pub const IDENTIFY_PATH: &str = "api/identify";
pub const HEALTH_PATH: &str = "api/health";
pub const CONTACTS_PATH: &str = "api/contacts";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    observer: Option<Arc<dyn ApiCallObserver>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base: config.api_url.clone(),
            observer: None,
        })
    }

    /// Report identify timings to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ApiCallObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Submit a probe. The call's timing is reported to the observer either way.
    pub async fn identify(&self, request: &IdentifyRequest) -> Result<IdentifyResponse, ApiError> {
        let started = Instant::now();
        let result = self.post_json(IDENTIFY_PATH, request).await;

        if let Some(observer) = &self.observer {
            observer.on_api_call(&ApiCallEvent {
                endpoint: format!("/{}", IDENTIFY_PATH),
                duration_ms: started.elapsed().as_millis() as u64,
                success: result.is_ok(),
                error: result.as_ref().err().map(|e| e.to_string()),
            });
        }

        result
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json(HEALTH_PATH).await
    }

    /// Fetch the full contact snapshot.
    pub async fn contacts(&self) -> Result<Vec<ContactRecord>, ApiError> {
        let value: serde_json::Value = self.get_json(CONTACTS_PATH).await?;
        // Envelope shape problems are reported as decode failures of the endpoint.
        snapshot::decode_contacts(value).map_err(|e| ApiError::Decode {
            endpoint: CONTACTS_PATH.to_string(),
            source: serde::de::Error::custom(format!("{:#}", e)),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.base.join(path)?;
        let req = self.http.get(url.clone());
        self.execute(Method::GET, path, url, req).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.base.join(path)?;
        let req = self.http.post(url.clone()).json(body);
        self.execute(Method::POST, path, url, req).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        url: Url,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        debug!(%method, %url, "api request");

        let resp = req.send().await.map_err(|e| {
            error!(%method, %url, error = %e, "api request error");
            ApiError::from(e)
        })?;

        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(status = status.as_u16(), %url, bytes = body.len(), "api response");

        if !status.is_success() {
            let message = server_message(&body);
            error!(status = status.as_u16(), %url, %message, "api response error");
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}
