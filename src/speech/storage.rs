use serde_json::json;

use crate::{Error, Result};

const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1";
const STORAGE_UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Minimal Cloud Storage client for staging audio ahead of batch
/// recognition
pub struct StorageClient {
    http: reqwest::Client,
    token: String,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    /// Make sure the staging bucket exists, creating it when it does not
    pub async fn ensure_bucket(&self, project_id: &str, bucket: &str) -> Result<()> {
        let response = self
            .http
            .get(format!("{STORAGE_API}/b/{bucket}"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => {
                tracing::info!(bucket, "staging bucket missing, creating it");
                let create = self
                    .http
                    .post(format!("{STORAGE_API}/b?project={project_id}"))
                    .bearer_auth(&self.token)
                    .json(&json!({ "name": bucket }))
                    .send()
                    .await?;

                if !create.status().is_success() {
                    let status = create.status();
                    let body = create.text().await.unwrap_or_default();
                    return Err(Error::UpstreamService {
                        service: "storage",
                        message: format!("bucket create returned HTTP {status}: {body}"),
                    });
                }
                Ok(())
            }
            status => Err(Error::UpstreamService {
                service: "storage",
                message: format!("bucket check returned HTTP {status}"),
            }),
        }
    }

    /// Upload a blob with a media upload; returns its `gs://` URI
    pub async fn upload_object(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        tracing::info!(bucket, object = object_name, bytes = bytes.len(), "uploading audio");

        let url = format!(
            "{STORAGE_UPLOAD_API}/b/{bucket}/o?uploadType=media&name={}",
            urlencoding::encode(object_name)
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamService {
                service: "storage",
                message: format!("upload returned HTTP {status}: {body}"),
            });
        }

        Ok(format!("gs://{bucket}/{object_name}"))
    }

    /// Best-effort removal of the staged object once recognition is done
    pub async fn delete_object(&self, bucket: &str, object_name: &str) -> Result<()> {
        tracing::debug!(bucket, object = object_name, "cleaning up staged audio");

        let url = format!(
            "{STORAGE_API}/b/{bucket}/o/{}",
            urlencoding::encode(object_name)
        );

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::UpstreamService {
                service: "storage",
                message: format!("object delete returned HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}
