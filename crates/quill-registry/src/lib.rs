use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use quill_constants::{MAX_PARALLEL_DOWNLOADS, USER_AGENT};
use quill_error::{PackageManagerError, Result};

pub struct RegistryClient {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl RegistryClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .pool_max_idle_per_host(20)
                .pool_idle_timeout(Duration::from_secs(90))
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(20))
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .tcp_nodelay(true)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            semaphore: Arc::new(Semaphore::new(MAX_PARALLEL_DOWNLOADS)),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetches `url` and returns the response body. Redirects are followed by
    /// the client; anything but a final 200 is an error.
    pub async fn get(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| PackageManagerError::NetworkError(format!("request to {url}: {e}")))?;

        if resp.status() != reqwest::StatusCode::OK {
            return Err(PackageManagerError::NetworkError(format!(
                "HTTP {} for {url}",
                resp.status()
            )));
        }

        resp.text()
            .await
            .map_err(|e| PackageManagerError::NetworkError(format!("reading body of {url}: {e}")))
    }

    /// Streams the body of `url` into `output_path`. The partial file is
    /// removed whenever the download fails after creation.
    pub async fn download_file(&self, url: &str, output_path: &Path) -> Result<()> {
        let _permit = self.semaphore.acquire().await.unwrap();

        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PackageManagerError::NetworkError(format!("request to {url}: {e}")))?;

        if resp.status() != reqwest::StatusCode::OK {
            return Err(PackageManagerError::NetworkError(format!(
                "HTTP {} for {url}",
                resp.status()
            )));
        }

        let mut file = tokio::fs::File::create(output_path)
            .await
            .map_err(|e| {
                PackageManagerError::IoError(format!(
                    "creating {}: {e}",
                    output_path.display()
                ))
            })?;

        loop {
            match resp.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = file.write_all(&chunk).await {
                        drop(file);
                        Self::remove_partial(output_path).await;
                        return Err(PackageManagerError::IoError(format!(
                            "writing {}: {e}",
                            output_path.display()
                        )));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    Self::remove_partial(output_path).await;
                    return Err(PackageManagerError::NetworkError(format!(
                        "streaming body of {url}: {e}"
                    )));
                }
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            Self::remove_partial(output_path).await;
            return Err(PackageManagerError::IoError(format!(
                "flushing {}: {e}",
                output_path.display()
            )));
        }

        Ok(())
    }

    async fn remove_partial(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            quill_logger::warn(&format!(
                "Failed to remove partial download {}: {e}",
                path.display()
            ));
        }
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}
