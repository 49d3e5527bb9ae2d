#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for xsdeps
//!
//! This crate handles every HTTP operation: release index and manifest
//! fetches, release API queries and streamed archive downloads.

mod client;

pub use client::{partial_path, NetClient, NetConfig};

use serde::de::DeserializeOwned;
use std::path::Path;
use xsdeps_errors::{Error, NetworkError};
use xsdeps_events::EventEmitter;

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error status,
/// or the response body cannot be decoded as text.
pub async fn fetch_text(
    client: &NetClient,
    url: &str,
    tx: &impl EventEmitter,
) -> Result<String, Error> {
    tx.emit_debug(format!("Fetching text from {url}"));

    let response = client.get(url).await?;
    response.text().await.map_err(|e| {
        NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Fetch and decode a JSON document
///
/// With `authenticated` set the request carries the configured bearer token.
///
/// # Errors
///
/// Returns an error if the request fails or the body is not valid JSON of
/// the expected shape.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &NetClient,
    url: &str,
    authenticated: bool,
    tx: &impl EventEmitter,
) -> Result<T, Error> {
    tx.emit_debug(format!("Fetching JSON from {url}"));

    let response = if authenticated {
        client.get_api(url).await?
    } else {
        client.get(url).await?
    };
    let body = response
        .bytes()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| {
        NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Download a file to `dest`, returning the number of bytes written
///
/// # Errors
///
/// Returns an error if the download fails or there are I/O errors while
/// writing the file. No partial file is left behind.
pub async fn download_file(
    client: &NetClient,
    url: &str,
    dest: &Path,
    tx: &impl EventEmitter,
) -> Result<u64, Error> {
    tx.emit_debug(format!("Downloading {url} to {}", dest.display()));
    client.download_to(url, dest).await
}
