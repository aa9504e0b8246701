//! Servizio di object storage per il re-hosting delle immagini generate

use bytes::Bytes;

/// Errori del servizio di storage
#[derive(Debug)]
pub enum StorageError {
    UploadFailed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::UploadFailed(msg) => write!(f, "Upload failed: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Client per uno storage REST in stile S3/Supabase
pub struct ObjectStorageService {
    client: reqwest::Client,
    api_url: String,
    bucket: String,
    service_key: String,
    public_url: String,
}

impl ObjectStorageService {
    pub fn new(api_url: String, bucket: String, service_key: String, public_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_url,
            bucket,
            service_key,
            public_url,
        }
    }

    /// Carica un oggetto nel bucket e ritorna il suo URL pubblico
    pub async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/object/{}/{}", self.api_url, self.bucket, key);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(error));
        }

        Ok(self.public_object_url(key))
    }

    /// URL pubblico di un oggetto nel bucket
    pub fn public_object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, key)
    }
}
