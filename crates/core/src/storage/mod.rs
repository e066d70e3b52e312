//! Object storage for receipt files using Apache OpenDAL.
//!
//! Receipt bytes never pass through Tala itself: clients upload directly to
//! the store via presigned URLs, and the attachment service records metadata
//! only after the object is confirmed to exist (upload-then-record).
//!
//! Supported providers:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3
//! - Azure Blob Storage
//! - Local filesystem (development only)

mod config;
mod error;
mod service;

pub use config::{ReceiptStoreConfig, StorageProvider};
pub use error::StorageError;
pub use service::{ObjectStat, PresignedUrl, ReceiptLocation, ReceiptStore};
