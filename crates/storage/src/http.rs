use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, header};
use tracing::debug;
use url::Url;

use crate::gateway::{
    ProgressSender, Storage, StorageError, UploadGateway, UploadProgress, UploadReceipt,
    UploadRequest,
};

/// Where answers are PUT, and the bearer token to send.
#[derive(Clone, Debug)]
pub struct HttpUploadConfig {
    base_url: Url,
    token: Option<String>,
}

impl HttpUploadConfig {
    /// Validate the endpoint. Keys are resolved relative to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidEndpoint` if the URL does not parse or is
    /// not http(s).
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, StorageError> {
        let trimmed = base_url.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base_url =
            Url::parse(&with_slash).map_err(|_| StorageError::InvalidEndpoint(trimmed.into()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(StorageError::InvalidEndpoint(trimmed.into()));
        }
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(Self { base_url, token })
    }

    /// Read `IVIDEO_UPLOAD_URL` and `IVIDEO_UPLOAD_TOKEN`.
    ///
    /// Returns `Ok(None)` when no upload URL is configured.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidEndpoint` if the configured URL is invalid.
    pub fn from_env() -> Result<Option<Self>, StorageError> {
        let Ok(base_url) = env::var("IVIDEO_UPLOAD_URL") else {
            return Ok(None);
        };
        if base_url.trim().is_empty() {
            return Ok(None);
        }
        let token = env::var("IVIDEO_UPLOAD_TOKEN").ok();
        Self::new(&base_url, token).map(Some)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a storage key.
    ///
    /// Each `/`-separated part of the key is appended as one percent-encoded
    /// path segment, so `#` or `?` in a viewer identifier stay in the path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidEndpoint` if the base URL cannot carry a path.
    pub fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(key.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

/// Uploads answer documents to an S3-style HTTP endpoint with `PUT`.
pub struct HttpUploadGateway {
    client: Client,
    config: HttpUploadConfig,
    authenticated: AtomicBool,
}

impl HttpUploadGateway {
    #[must_use]
    pub fn new(config: HttpUploadConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            authenticated: AtomicBool::new(false),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl Storage {
    #[must_use]
    pub fn http(config: HttpUploadConfig) -> Self {
        Self::from_gateway(Arc::new(HttpUploadGateway::new(config)))
    }
}

fn connection(err: &reqwest::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

#[async_trait]
impl UploadGateway for HttpUploadGateway {
    async fn authenticate(&self) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.head(self.config.base_url.clone()))
            .send()
            .await
            .map_err(|e| connection(&e))?;

        // Buckets often answer HEAD on the prefix with 404/405; only refused
        // credentials count as an authentication failure.
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StorageError::Unauthorized),
            status => {
                debug!(%status, "object store reachable");
                self.authenticated.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressSender,
    ) -> Result<UploadReceipt, StorageError> {
        if !self.authenticated.load(Ordering::SeqCst) {
            return Err(StorageError::Unauthorized);
        }

        let url = self.config.object_url(&request.key)?;
        let total = request.body.len() as u64;
        let _ = progress.send(UploadProgress {
            key: request.key.clone(),
            loaded: 0,
            total,
        });

        let response = self
            .authorize(self.client.put(url))
            .header(header::CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await
            .map_err(|e| connection(&e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StorageError::Unauthorized);
        }
        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: status.as_u16(),
            });
        }

        let _ = progress.send(UploadProgress {
            key: request.key.clone(),
            loaded: total,
            total,
        });
        Ok(UploadReceipt {
            key: request.key,
            bytes: total,
            stored_at: Utc::now(),
        })
    }
}
