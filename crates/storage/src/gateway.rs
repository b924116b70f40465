use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ivideo_core::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by upload gateways.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not authenticated with the object store")]
    Unauthorized,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("upload rejected with status {status}")]
    Rejected { status: u16 },

    #[error("invalid storage endpoint: {0}")]
    InvalidEndpoint(String),
}

/// One object to write: the full answer document for a viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

impl UploadRequest {
    #[must_use]
    pub fn new(key: impl Into<String>, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            body,
            content_type: content_type.into(),
        }
    }
}

/// Bytes sent so far for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub key: String,
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole percent sent, `loaded * 100 / total`, clamped to 0..=100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = self.loaded.saturating_mul(100) / self.total;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

/// Channel on which a gateway reports upload progress.
///
/// Gateways ignore a closed receiver; progress is advisory.
pub type ProgressSender = mpsc::UnboundedSender<UploadProgress>;

/// Confirmation of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub key: String,
    pub bytes: u64,
    pub stored_at: DateTime<Utc>,
}

/// Boundary to the remote object store holding viewers' answers.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    /// Obtain credentials for subsequent uploads.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unauthorized` if credentials are refused, or
    /// `StorageError::Connection` if the store cannot be reached.
    async fn authenticate(&self) -> Result<(), StorageError>;

    /// Write `request.body` under `request.key`, replacing any previous object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the object could not be stored.
    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressSender,
    ) -> Result<UploadReceipt, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

const IN_MEMORY_CHUNK: usize = 16 * 1024;

/// An object held by `InMemoryUploadStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub stored_at: DateTime<Utc>,
    /// Number of times the key has been written.
    pub version: u32,
}

#[derive(Default)]
struct StoreState {
    objects: HashMap<String, StoredObject>,
    authenticated: bool,
    offline: bool,
    uploads: usize,
}

/// Simple in-memory object store for testing and local runs.
#[derive(Clone, Default)]
pub struct InMemoryUploadStore {
    state: Arc<Mutex<StoreState>>,
    clock: Clock,
}

impl InMemoryUploadStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Make every following call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut guard) = self.state.lock() {
            guard.offline = offline;
        }
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.state
            .lock()
            .ok()
            .and_then(|guard| guard.objects.get(key).cloned())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state
            .lock()
            .map(|guard| guard.objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of successful uploads, counting overwrites.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.state.lock().map(|guard| guard.uploads).unwrap_or(0)
    }
}

#[async_trait]
impl UploadGateway for InMemoryUploadStore {
    async fn authenticate(&self) -> Result<(), StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.offline {
            return Err(StorageError::Connection("object store unreachable".into()));
        }
        guard.authenticated = true;
        Ok(())
    }

    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressSender,
    ) -> Result<UploadReceipt, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.offline {
            return Err(StorageError::Connection("object store unreachable".into()));
        }
        if !guard.authenticated {
            return Err(StorageError::Unauthorized);
        }

        let total = request.body.len() as u64;
        let mut loaded = 0_u64;
        for chunk in request.body.chunks(IN_MEMORY_CHUNK) {
            loaded += chunk.len() as u64;
            let _ = progress.send(UploadProgress {
                key: request.key.clone(),
                loaded,
                total,
            });
        }
        if total == 0 {
            let _ = progress.send(UploadProgress {
                key: request.key.clone(),
                loaded: 0,
                total: 0,
            });
        }

        let stored_at = self.clock.now();
        let version = guard
            .objects
            .get(&request.key)
            .map_or(1, |existing| existing.version + 1);
        guard.objects.insert(
            request.key.clone(),
            StoredObject {
                body: request.body,
                content_type: request.content_type,
                stored_at,
                version,
            },
        );
        guard.uploads += 1;

        Ok(UploadReceipt {
            key: request.key,
            bytes: total,
            stored_at,
        })
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Holds the upload gateway behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub uploads: Arc<dyn UploadGateway>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_gateway(Arc::new(InMemoryUploadStore::new()))
    }

    #[must_use]
    pub fn from_gateway(uploads: Arc<dyn UploadGateway>) -> Self {
        Self { uploads }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivideo_core::time::{fixed_clock, fixed_now};

    fn request(key: &str, body: &[u8]) -> UploadRequest {
        UploadRequest::new(key, body.to_vec(), "application/json")
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let store = InMemoryUploadStore::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = store.upload(request("answers/a.json", b"{}"), tx).await;
        assert_eq!(err, Err(StorageError::Unauthorized));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn overwrites_same_key() {
        let store = InMemoryUploadStore::new().with_clock(fixed_clock());
        store.authenticate().await.unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        store
            .upload(request("answers/a.json", b"first"), tx.clone())
            .await
            .unwrap();
        let receipt = store
            .upload(request("answers/a.json", b"second"), tx)
            .await
            .unwrap();

        assert_eq!(receipt.bytes, 6);
        assert_eq!(receipt.stored_at, fixed_now());
        let object = store.object("answers/a.json").unwrap();
        assert_eq!(object.body, b"second");
        assert_eq!(object.version, 2);
        assert_eq!(store.upload_count(), 2);
        assert_eq!(store.keys(), vec!["answers/a.json".to_string()]);
    }

    #[tokio::test]
    async fn reports_progress_up_to_full() {
        let store = InMemoryUploadStore::new();
        store.authenticate().await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let body = vec![b'x'; IN_MEMORY_CHUNK * 2 + 10];
        store.upload(request("k", &body), tx).await.unwrap();

        let mut percents = Vec::new();
        while let Ok(progress) = rx.try_recv() {
            percents.push(progress.percent());
        }
        assert_eq!(percents.len(), 3);
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn offline_store_fails_with_connection_error() {
        let store = InMemoryUploadStore::new();
        store.authenticate().await.unwrap();
        store.set_offline(true);
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = store.upload(request("k", b"{}"), tx).await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert_eq!(store.upload_count(), 0);
    }

    #[test]
    fn percent_handles_empty_body() {
        let progress = UploadProgress {
            key: "k".into(),
            loaded: 0,
            total: 0,
        };
        assert_eq!(progress.percent(), 100);
    }
}
