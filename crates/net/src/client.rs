//! HTTP client with separate metadata and download identities

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use xsdeps_errors::{Error, NetworkError};

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Sent with index, manifest and release API requests
    pub user_agent: String,
    /// Sent with archive downloads
    pub download_user_agent: String,
    /// Bearer token attached to release API requests
    pub bearer_token: Option<String>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // 5 minutes for large downloads
            connect_timeout: Duration::from_secs(30),
            user_agent: format!(
                "xsdeps/{} (+https://github.com/xmlsec/python-xmlsec)",
                env!("CARGO_PKG_VERSION")
            ),
            download_user_agent: "xsdeps build".to_string(),
            bearer_token: None,
        }
    }
}

/// HTTP client wrapper
///
/// Requests are made exactly once; failures are reported, never retried.
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| NetworkError::ClientSetup(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Whether API requests carry a bearer token
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.config.bearer_token.is_some()
    }

    /// GET with the metadata user agent
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        let headers = self.headers(&self.config.user_agent, None)?;
        self.send(url, headers).await
    }

    /// GET with the metadata user agent and, when configured, the bearer token
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn get_api(&self, url: &str) -> Result<Response, Error> {
        let headers = self.headers(
            &self.config.user_agent,
            self.config.bearer_token.as_deref(),
        )?;
        self.send(url, headers).await
    }

    /// Stream `url` into `dest` using the download user agent
    ///
    /// The body is written to `<dest>.part` and renamed into place once
    /// complete; on any failure the partial file is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server returns an error
    /// status, or the file cannot be written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let partial = partial_path(dest);
        match self.stream_into(url, &partial).await {
            Ok(bytes) => {
                tokio::fs::rename(&partial, dest)
                    .await
                    .map_err(|e| Error::io_with_path(&e, dest))?;
                Ok(bytes)
            }
            Err(err) => {
                // Best-effort cleanup - the original error matters more
                let _ = tokio::fs::remove_file(&partial).await;
                Err(err)
            }
        }
    }

    async fn stream_into(&self, url: &str, partial: &Path) -> Result<u64, Error> {
        let headers = self.headers(&self.config.download_user_agent, None)?;
        let response = self.send(url, headers).await?;

        let mut file = tokio::fs::File::create(partial)
            .await
            .map_err(|e| Error::io_with_path(&e, partial))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    async fn send(&self, url: &str, headers: HeaderMap) -> Result<Response, Error> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| Self::convert_error(url, &e))?;

        if !response.status().is_success() {
            return Err(NetworkError::HttpError {
                status: response.status().as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        Ok(response)
    }

    fn headers(&self, user_agent: &str, token: Option<&str>) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| NetworkError::ClientSetup(e.to_string()))?,
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| NetworkError::ClientSetup(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn convert_error(url: &str, error: &reqwest::Error) -> Error {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string()).into()
        } else if error.is_builder() {
            NetworkError::InvalidUrl(url.to_string()).into()
        } else {
            NetworkError::DownloadFailed(error.to_string()).into()
        }
    }
}

/// `<dest>.part` next to the destination
#[must_use]
pub fn partial_path(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
