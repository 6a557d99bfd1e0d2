// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/snapprom/config.yaml";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/metrics";
pub const METRICS_PATH: &str = "/metrics";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("requested metric list is empty")]
  EmptyRequest,
  #[error("no endpoint configured")]
  MissingEndpoint,
  #[error("invalid endpoint {0}: {1}")]
  InvalidEndpoint(String, String),
}

//
// DiscoveryPolicy
//

/// How the list of available identifiers is produced.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum DiscoveryPolicy {
  /// A fixed list of family names known ahead of time.
  Static { metrics: Vec<String> },
  /// Scrape the default endpoint once and list the families it exposes.
  Dynamic {},
}

impl Default for DiscoveryPolicy {
  fn default() -> Self {
    Self::Dynamic {}
  }
}

//
// CollectorConfig
//

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
  pub endpoint: String,
  #[serde(with = "humantime_serde")]
  pub fetch_timeout: Duration,
  #[serde(with = "humantime_serde")]
  pub collect_interval: Duration,
  // Families whose samples are also summed into total records.
  pub multi_group_metrics: BTreeSet<String>,
  #[serde(with = "serde_yaml::with::singleton_map")]
  pub discovery: DiscoveryPolicy,
  pub discovery_cache_path: Option<PathBuf>,
}

impl Default for CollectorConfig {
  fn default() -> Self {
    Self {
      endpoint: DEFAULT_ENDPOINT.to_string(),
      fetch_timeout: Duration::from_secs(10),
      collect_interval: Duration::from_secs(10),
      multi_group_metrics: BTreeSet::new(),
      discovery: DiscoveryPolicy::default(),
      discovery_cache_path: None,
    }
  }
}

// YAML is a superset of JSON so either form is accepted.
pub fn load_from_file(path: &str) -> anyhow::Result<CollectorConfig> {
  let file_contents = std::fs::read_to_string(path)?;
  Ok(serde_yaml::from_str(&file_contents)?)
}

/// Loads the config, falling back to defaults if the file is missing or invalid. Only a missing
/// file is expected, an invalid one is logged as a warning.
#[must_use]
pub fn load_or_default(path: &str) -> CollectorConfig {
  load_from_file(path).unwrap_or_else(|e| {
    if is_missing_file(&e) {
      log::info!("no config file at {path}, using default endpoint {DEFAULT_ENDPOINT}");
    } else {
      log::warn!("invalid config file {path}: {e:#}, ignoring it and using defaults");
    }
    CollectorConfig::default()
  })
}

fn is_missing_file(e: &anyhow::Error) -> bool {
  e.downcast_ref::<std::io::Error>()
    .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

/// Validates an endpoint address and makes sure it points at the metrics path.
pub fn normalize_endpoint(address: &str) -> Result<String, ConfigError> {
  let address = address.trim().trim_end_matches('/');
  if address.is_empty() {
    return Err(ConfigError::MissingEndpoint);
  }

  let address = if address.ends_with(METRICS_PATH) {
    address.to_string()
  } else {
    format!("{address}{METRICS_PATH}")
  };

  reqwest::Url::parse(&address)
    .map_err(|e| ConfigError::InvalidEndpoint(address.clone(), e.to_string()))?;
  Ok(address)
}
