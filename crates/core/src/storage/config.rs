//! Receipt store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage.
    AzureBlob {
        /// Storage account name.
        account: String,
        /// Storage access key.
        access_key: String,
        /// Container name.
        container: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create an S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create an Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create a local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Provider name as stored on attachment rows.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Bucket or container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Receipt store configuration.
#[derive(Debug, Clone)]
pub struct ReceiptStoreConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum receipt file size in bytes.
    pub max_file_size: u64,
    /// Presigned upload URL TTL in seconds.
    pub upload_ttl_secs: u64,
    /// Presigned download URL TTL in seconds.
    pub download_ttl_secs: u64,
    /// MIME types accepted as receipts.
    pub accepted_mime_types: Vec<String>,
}

impl ReceiptStoreConfig {
    /// Default max receipt size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default upload TTL: 15 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 900;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a receipt store config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            accepted_mime_types: Self::receipt_mime_types(),
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.upload_ttl_secs = secs;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.download_ttl_secs = secs;
        self
    }

    /// MIME types accepted for receipt uploads.
    ///
    /// Receipts are photographed or scanned paper: images and PDF only.
    #[must_use]
    pub fn receipt_mime_types() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "image/heic".to_string(),
            "application/pdf".to_string(),
        ]
    }

    /// Check if a MIME type is accepted.
    #[must_use]
    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        self.accepted_mime_types.iter().any(|t| t == mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        let s3 = StorageProvider::s3("https://r2.example.com", "receipts", "ak", "sk", "auto");
        assert_eq!(s3.name(), "s3");
        assert_eq!(s3.bucket(), "receipts");

        let az = StorageProvider::azure_blob("taladev", "key", "receipts");
        assert_eq!(az.name(), "azure_blob");
        assert_eq!(az.bucket(), "receipts");

        assert_eq!(StorageProvider::local_fs("./data").name(), "local");
    }

    #[test]
    fn test_config_defaults() {
        let config = ReceiptStoreConfig::new(StorageProvider::local_fs("./data"));
        assert_eq!(config.max_file_size, ReceiptStoreConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.upload_ttl_secs, ReceiptStoreConfig::DEFAULT_UPLOAD_TTL);
        assert_eq!(config.download_ttl_secs, ReceiptStoreConfig::DEFAULT_DOWNLOAD_TTL);
    }

    #[test]
    fn test_receipt_mime_types() {
        let config = ReceiptStoreConfig::new(StorageProvider::local_fs("./data"));
        assert!(config.accepts_mime_type("image/jpeg"));
        assert!(config.accepts_mime_type("application/pdf"));
        // office documents are not receipts
        assert!(!config.accepts_mime_type("application/msword"));
        assert!(!config.accepts_mime_type("text/html"));
    }
}
