use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client for the external media host. Images arrive from chat clients as
/// data URIs; we forward them and persist only the URL the host returns —
/// raw image bytes never touch our store.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    upload_url: String,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    file: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl MediaClient {
    pub fn new(upload_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
        }
    }

    /// Upload a data URI, returning the hosted URL.
    pub async fn upload(&self, data_uri: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.upload_url)
            .json(&UploadRequest { file: data_uri })
            .send()
            .await
            .context("media host unreachable")?
            .error_for_status()
            .context("media host rejected upload")?;

        let body: UploadResponse = resp.json().await.context("malformed media host response")?;
        Ok(body.secure_url)
    }
}
