//! Receipt store implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use tala_shared::types::{AttachmentId, LiquidationId};

use super::config::{ReceiptStoreConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL for upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// Where a receipt object lives within the bucket.
#[derive(Debug, Clone)]
pub struct ReceiptLocation {
    /// The liquidation the receipt belongs to.
    pub liquidation_id: LiquidationId,
    /// The attachment row the object backs.
    pub attachment_id: AttachmentId,
    /// Original filename as uploaded.
    pub file_name: String,
}

/// Metadata of an object as reported by the store.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    /// Storage key.
    pub storage_key: String,
    /// Object size in bytes.
    pub file_size: u64,
    /// Content type, if the provider reports one.
    pub content_type: Option<String>,
}

/// Object store for receipt files.
pub struct ReceiptStore {
    operator: Operator,
    config: ReceiptStoreConfig,
}

impl ReceiptStore {
    /// Create a receipt store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: ReceiptStoreConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create an OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };

        Ok(operator)
    }

    /// Validate a proposed upload against size and MIME constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large or not a receipt format.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(size, self.config.max_file_size));
        }

        if !self.config.accepts_mime_type(content_type) {
            return Err(StorageError::unsupported_mime_type(content_type));
        }

        Ok(())
    }

    /// Storage key for a receipt.
    ///
    /// Format: `{liquidation_id}/{attachment_id}/{sanitized_filename}`.
    /// Keys are scoped by liquidation so that all of a report's receipts
    /// share a prefix.
    #[must_use]
    pub fn receipt_key(location: &ReceiptLocation) -> String {
        format!(
            "{}/{}/{}",
            location.liquidation_id,
            location.attachment_id,
            sanitize_filename(&location.file_name)
        )
    }

    /// Generate a presigned upload URL for a receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or presigning is unsupported.
    pub async fn presign_upload(
        &self,
        location: &ReceiptLocation,
        content_type: &str,
        file_size: u64,
    ) -> Result<PresignedUrl, StorageError> {
        self.validate_upload(content_type, file_size)?;

        let key = Self::receipt_key(location);
        let ttl = Duration::from_secs(self.config.upload_ttl_secs);

        let presigned = self
            .operator
            .presign_write(&key, ttl)
            .await
            .map_err(StorageError::from)?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now() + self.ttl_duration(self.config.upload_ttl_secs),
            headers,
        })
    }

    /// Generate a presigned download URL for a stored receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is not supported or fails.
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now() + self.ttl_duration(self.config.download_ttl_secs),
            headers: HashMap::new(),
        })
    }

    /// Confirm an object exists and report its metadata.
    ///
    /// This is the durability gate: attachment metadata must not be recorded
    /// until this succeeds (upload-then-record, never record-then-upload).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object is missing.
    pub async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;

        Ok(ObjectStat {
            storage_key: key.to_string(),
            file_size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Provider name as stored on attachment rows.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Bucket or container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    fn ttl_duration(&self, secs: u64) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

/// Sanitize a filename for use in a storage key.
///
/// Only ASCII alphanumerics, dots, hyphens, and underscores survive.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("resibo.jpg"), "resibo.jpg");
        assert_eq!(sanitize_filename("toll receipt (2).pdf"), "toll_receipt__2_.pdf");
        assert_eq!(sanitize_filename("kuwit,at/slash.png"), "kuwit_at_slash.png");
    }

    #[test]
    fn test_receipt_key_layout() {
        let location = ReceiptLocation {
            liquidation_id: LiquidationId::new(),
            attachment_id: AttachmentId::new(),
            file_name: "gas receipt.jpg".to_string(),
        };

        let key = ReceiptStore::receipt_key(&location);
        assert!(key.starts_with(&location.liquidation_id.to_string()));
        assert!(key.contains(&location.attachment_id.to_string()));
        assert!(key.ends_with("gas_receipt.jpg"));
        assert_eq!(key.split('/').count(), 3);
    }

    #[test]
    fn test_validate_upload_limits() {
        let store = ReceiptStore::from_config(ReceiptStoreConfig::new(
            StorageProvider::local_fs("./test-data"),
        ))
        .unwrap();

        assert!(store.validate_upload("image/jpeg", 1024).is_ok());
        assert!(matches!(
            store.validate_upload("image/jpeg", 100 * 1024 * 1024),
            Err(StorageError::FileTooLarge { .. })
        ));
        assert!(matches!(
            store.validate_upload("application/zip", 1024),
            Err(StorageError::UnsupportedMimeType { .. })
        ));
    }
}
