//! HTTP client for the image storage backend.
//!
//! The backend persists labeled images and serves them back for
//! warm-starting the classifier. Three endpoints are consumed:
//! `POST /save-image`, `GET /get-images`, and `GET /saved_images/{file}`.
//! Failures surface as errors at the call site; nothing is retried
//! automatically.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SaveImageRequest<'a> {
    image: &'a str,
    #[serde(rename = "className")]
    class_name: &'a str,
}

#[derive(Deserialize)]
struct SaveImageResponse {
    file_name: String,
}

#[derive(Deserialize)]
struct ListImagesResponse {
    images: Vec<String>,
}

/// Client for the storage backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> CliResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Upload a labeled image as a data URL. Returns the filename the
    /// backend stored it under.
    pub async fn save_image(&self, data_url: &str, label: &str) -> CliResult<String> {
        let url = format!("{}/save-image", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SaveImageRequest {
                image: data_url,
                class_name: label,
            })
            .send()
            .await?;
        let resp = check_status(resp, "save-image")?;
        let body: SaveImageResponse = resp.json().await?;
        tracing::debug!("Uploaded {label:?} example as {}", body.file_name);
        Ok(body.file_name)
    }

    /// List stored image filenames.
    pub async fn list_images(&self) -> CliResult<Vec<String>> {
        let url = format!("{}/get-images", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let resp = check_status(resp, "get-images")?;
        let body: ListImagesResponse = resp.json().await?;
        Ok(body.images)
    }

    /// Fetch the raw bytes of one stored image.
    pub async fn fetch_image(&self, filename: &str) -> CliResult<Vec<u8>> {
        let url = format!("{}/saved_images/{filename}", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let resp = check_status(resp, filename)?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn check_status(resp: reqwest::Response, what: &str) -> CliResult<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(CliError::Backend(format!(
            "{what}: backend returned {status}"
        )));
    }
    Ok(resp)
}
