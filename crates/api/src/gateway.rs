//! Credential routing and error policy shared by every resource client.
//!
//! Reads and deletes never fail: a 404 becomes `None`, and any other error is
//! logged and handed to the [`FailureReporter`] before degrading to `None` (or
//! an empty list). Creates and updates hand the error back so the caller can abort the
//! step instead of reporting a mutation that did not happen.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, Result};
use crate::pagination::PagedResponse;
use crate::{ApiClient, HttpClient, Method};

/// Everything needed to reach the API, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub access_token: String,
    /// Base64 `user:app-password`, sent as a basic credential.
    pub app_password: String,
    pub timeout: Option<Duration>,
}

/// Receives the operator-facing message for a read or delete that failed.
pub type FailureReporter = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub struct Gateway {
    bearer: Arc<dyn HttpClient>,
    app_password: Arc<dyn HttpClient>,
    report: FailureReporter,
}

impl Gateway {
    /// Failures go to stderr until [`Gateway::with_failure_reporter`] says otherwise.
    pub fn new(bearer: Arc<dyn HttpClient>, app_password: Arc<dyn HttpClient>) -> Self {
        Self {
            bearer,
            app_password,
            report: Arc::new(|message| eprintln!("{message}")),
        }
    }

    pub fn with_failure_reporter(mut self, report: FailureReporter) -> Self {
        self.report = report;
        self
    }

    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let mut bearer =
            ApiClient::new(&config.base_url)?.with_bearer_token(config.access_token.clone());
        let mut basic = ApiClient::new(&config.base_url)?
            .with_basic_credential(config.app_password.clone());

        if let Some(timeout) = config.timeout {
            bearer = bearer.with_timeout(timeout);
            basic = basic.with_timeout(timeout);
        }

        Ok(Self::new(Arc::new(bearer), Arc::new(basic)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let result = self
            .bearer
            .send(Method::GET, path, None)
            .await
            .and_then(|value| serde_json::from_value(value).map_err(ApiError::from));

        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_not_found() => {
                debug!(path, "Resource not found");
                None
            }
            Err(err) => {
                self.surface("Error fetching data", &err);
                None
            }
        }
    }

    /// First page of a list endpoint; empty when the listing failed.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Vec<T> {
        let Some(page) = self.get::<PagedResponse<T>>(path).await else {
            return Vec::new();
        };

        if page.has_next() {
            warn!(
                path,
                read = page.values.len(),
                unread = page.unread(),
                "Listing has more pages; only the first page is used"
            );
        }

        page.values
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.bearer
            .send(Method::POST, path, Some(&body))
            .await
            .inspect_err(|err| info!(path, error = %err, "POST rejected"))
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.bearer
            .send(Method::PUT, path, Some(&body))
            .await
            .inspect_err(|err| info!(path, error = %err, "PUT rejected"))
    }

    pub async fn delete(&self, path: &str) -> Option<Value> {
        let result = self.bearer.send(Method::DELETE, path, None).await;
        self.settle_delete(path, result)
    }

    pub async fn put_with_app_password<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.app_password
            .send(Method::PUT, path, Some(&body))
            .await
            .inspect_err(|err| info!(path, error = %err, "PUT rejected"))
    }

    pub async fn delete_with_app_password(&self, path: &str) -> Option<Value> {
        let result = self.app_password.send(Method::DELETE, path, None).await;
        self.settle_delete(path, result)
    }

    fn settle_delete(&self, path: &str, result: Result<Value>) -> Option<Value> {
        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_not_found() => {
                debug!(path, "Nothing to delete");
                None
            }
            Err(err) => {
                self.surface("Error deleting data", &err);
                None
            }
        }
    }

    fn surface(&self, context: &str, err: &ApiError) {
        error!(error = %err, "{context}");
        (self.report)(&format!("{context}: {err}"));
    }
}
