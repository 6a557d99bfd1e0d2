// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./http_test.rs"]
mod http_test;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use http::header::ACCEPT;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
  #[error("request error: {0}")]
  Request(#[from] reqwest::Error),
  #[error("response error: {0}: {1}")]
  Response(StatusCode, String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Fetches the raw exposition body from an address. The whole body is buffered so that it can be
/// re-read by the parser.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
  async fn fetch(&self, address: &str) -> Result<Bytes>;
}

//
// HttpSnapshotFetcher
//

pub struct HttpSnapshotFetcher {
  client: reqwest::Client,
}

impl HttpSnapshotFetcher {
  pub fn new(timeout: Duration) -> Result<Self> {
    Ok(Self {
      client: reqwest::Client::builder().timeout(timeout).build()?,
    })
  }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
  async fn fetch(&self, address: &str) -> Result<Bytes> {
    log::debug!("fetching metrics from {address}");
    let response = self
      .client
      .get(address)
      .header(ACCEPT, "text/plain")
      .send()
      .await?;

    let status = response.status();
    if status.is_success() {
      return Ok(response.bytes().await?);
    }

    let body = response
      .text()
      .await
      .unwrap_or_else(|_| "unreadable body".to_string());
    Err(FetchError::Response(status, body))
  }
}
