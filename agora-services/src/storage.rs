//! Object storage on S3
//!
//! Objects live under `{folder}/{name}` in one bucket. Downloads are
//! buffered in memory; uploads are sent as a single `PutObject`.

use std::time::Duration;

use agora_core::AwsSettings;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::error::{Result, ServiceError};

pub const DEFAULT_FOLDER: &str = "fastapi";
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// Object body with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` under `name` and return a signed URL for it.
    async fn upload(&self, name: &str, body: Vec<u8>) -> Result<String>;

    /// Time-limited GET URL for `name`.
    async fn signed_url(&self, name: &str, expires_in: Duration) -> Result<String>;

    async fn download(&self, name: &str) -> Result<StoredObject>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// Content type guessed from the file extension.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}

fn storage_error(action: &str, err: impl std::error::Error) -> ServiceError {
    ServiceError::Storage(format!("{}: {}", action, DisplayErrorContext(err)))
}

pub struct S3Storage {
    client: Client,
    bucket: String,
    folder: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            folder: DEFAULT_FOLDER.to_owned(),
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Build a client from settings, falling back to the default AWS
    /// credential chain for anything not set explicitly.
    pub async fn from_settings(settings: &AwsSettings) -> Result<Self> {
        let bucket = settings
            .bucket_name
            .clone()
            .ok_or(ServiceError::NotConfigured("AWS_BUCKET_NAME"))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let (Some(id), Some(secret)) = (&settings.access_key_id, &settings.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "agora-settings",
            ));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;

        // Custom endpoints (LocalStack, MinIO) need path-style addressing
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(settings.endpoint_url.is_some())
            .build();

        tracing::info!(bucket = %bucket, "object storage configured");
        Ok(Self::new(Client::from_conf(config), bucket))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}/{}", self.folder, name)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, name: &str, body: Vec<u8>) -> Result<String> {
        let key = self.key(name);
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type_for(name))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| storage_error("upload failed", e))?;

        tracing::debug!(key = %key, size, "object uploaded");
        self.signed_url(name, DEFAULT_URL_EXPIRY).await
    }

    async fn signed_url(&self, name: &str, expires_in: Duration) -> Result<String> {
        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|e| storage_error("invalid expiry", e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(name))
            .presigned(presigning)
            .await
            .map_err(|e| storage_error("signing failed", e))?;

        Ok(request.uri().to_string())
    }

    async fn download(&self, name: &str) -> Result<StoredObject> {
        let key = self.key(name);
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(ServiceError::ObjectNotFound(name.to_owned()));
            }
            Err(e) => return Err(storage_error("download failed", e)),
        };

        let content_type = output
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| content_type_for(name));
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error("reading object body failed", e))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let key = self.key(name);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| storage_error("delete failed", e))?;

        tracing::debug!(key = %key, "object deleted");
        Ok(())
    }
}
