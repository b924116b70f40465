#![forbid(unsafe_code)]

pub mod gateway;
pub mod http;

pub use gateway::{
    InMemoryUploadStore, ProgressSender, Storage, StorageError, StoredObject, UploadGateway,
    UploadProgress, UploadReceipt, UploadRequest,
};
pub use http::{HttpUploadConfig, HttpUploadGateway};
