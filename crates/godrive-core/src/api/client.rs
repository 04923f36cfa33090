use crate::api::endpoint::Endpoint;
use crate::core::session::ClientStore;
use crate::error::ApiError;
use crate::utils::error_helpers::{convert_json_error, convert_request_error};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("godrive/", env!("CARGO_PKG_VERSION"));

/// Where and how patiently to talk to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GoDriveClient {
    client: Client,
    pub base_url: String,
    timeout: Duration,
    store: ClientStore,
}

impl GoDriveClient {
    pub fn new(config: ClientConfig, store: ClientStore) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network {
                endpoint: "client_init".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(GoDriveClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            store,
        })
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(token) = self.store.token() {
            request = request.bearer_auth(token);
        }

        request
    }

    /// Run a typed endpoint: boundary validation, request, error mapping.
    pub async fn execute<E: Endpoint>(&self, endpoint: &E) -> Result<E::Response, ApiError> {
        let path = endpoint.path();

        if let Err(message) = endpoint.validate() {
            return Err(ApiError::Validation {
                status: 0,
                endpoint: path,
                message,
            });
        }

        let body = endpoint.body().map_err(|e| ApiError::Validation {
            status: 0,
            endpoint: path.clone(),
            message: format!("Failed to encode request body: {}", e),
        })?;

        log::debug!("{} {} [{}]", E::METHOD, path, E::NAME);
        self.send(E::METHOD, &path, body.as_ref(), &endpoint.query())
            .await
            .map_err(E::map_error)
    }

    /// Send a request and decode the JSON response body.
    pub async fn send<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let mut request = self.build_request(method, path);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| convert_request_error(e, path, self.timeout.as_secs()))?;

        self.handle_response(response, path).await
    }

    pub async fn handle_response<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| convert_request_error(e, endpoint, self.timeout.as_secs()))?;
            // 204 and friends: decode as `null` so unit responses work
            let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
            serde_json::from_slice(payload).map_err(|e| convert_json_error(e, endpoint))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            log::debug!("{} answered {}", endpoint, status.as_u16());
            Err(ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body,
            })
        }
    }
}
