pub mod branch_restrictions;
pub mod error;
pub mod gateway;
pub mod pagination;
pub mod projects;
pub mod repositories;
pub mod token;
pub mod users;
pub mod workspaces;

use async_trait::async_trait;
use error::{ApiError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

pub use branch_restrictions::{BranchRestriction, BranchRestrictionApi, RestrictionPayload};
pub use gateway::{ClientConfig, FailureReporter, Gateway};
pub use projects::{NewProject, Project, ProjectApi, ProjectUpdate};
pub use repositories::{NewRepository, Repository, RepositoryApi};
pub use reqwest::Method;
pub use users::{Permission, User, UserApi, UserRef};
pub use workspaces::{Workspace, WorkspaceApi};

#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// A `user:password` pair that is already base64 encoded.
    Basic { credential: String },
    Bearer { token: String },
}

/// Sends one request and hands back the parsed body.
///
/// Implemented by [`ApiClient`]; the gateway holds one instance per
/// credential scheme.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth: Option<AuthMethod>,
    timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(ApiError::InvalidUrl)?;

        let client = Client::builder()
            .user_agent(format!("bitbucket-admin/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::RequestFailed)?;

        Ok(Self {
            client,
            base_url: url,
            auth: None,
            timeout: None,
        })
    }

    pub fn with_basic_credential(mut self, credential: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Basic {
            credential: credential.into(),
        });
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Bearer {
            token: token.into(),
        });
        self
    }

    /// Per-request timeout. Without one a stalled call waits indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    pub async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let joined = self
            .base_url
            .join(path.strip_prefix('/').unwrap_or(path))
            .map_err(ApiError::InvalidUrl)?;

        debug!(method = %method, url = %joined, "Sending request");

        let mut req = self
            .client
            .request(method, joined.clone())
            .header(ACCEPT, "application/json");
        req = self.apply_auth(req);

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(ApiError::RequestFailed)?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Invalid or expired credentials".to_string());
                Err(ApiError::AuthenticationFailed {
                    status: status.as_u16(),
                    message,
                })
            }
            StatusCode::NOT_FOUND => {
                let resource = joined.path().to_string();
                Err(ApiError::NotFound { resource })
            }
            status if status.is_client_error() => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                Err(ApiError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
            status if status.is_server_error() => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Server error".to_string());
                Err(ApiError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(ApiError::RequestFailed)?;
                // 204 and friends come back without a body.
                let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
                    serde_json::from_value(Value::Null)
                } else {
                    serde_json::from_slice(&bytes)
                };
                parsed.map_err(|e| {
                    error!("Failed to parse JSON response: {}", e);
                    ApiError::InvalidResponse(e.to_string())
                })
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("Unexpected status: {}", status));
                Err(ApiError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(AuthMethod::Basic { credential }) => {
                request.header(AUTHORIZATION, format!("Basic {credential}"))
            }
            Some(AuthMethod::Bearer { token }) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl HttpClient for ApiClient {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.request(method, path, body).await
    }
}
