// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./collector_test.rs"]
mod collector_test;

use crate::clients::http::SnapshotFetcher;
use crate::config::{CollectorConfig, ConfigError, normalize_endpoint};
use crate::discovery::cache::DiscoveryCache;
use crate::pipeline::resolver::NamespaceResolver;
use crate::pipeline::time::TimeProvider;
use crate::protos::metric::{Namespace, OutputRecord};
use crate::snapshot::parser::parse_snapshot;
use crate::snapshot::{Snapshot, SnapshotError};
use bd_log::warn_every;
use bd_server_stats::stats::Scope;
use prometheus::IntCounter;
use std::collections::BTreeSet;
use std::sync::Arc;
use time::ext::NumericalDuration;

//
// Stats
//

#[derive(Clone)]
pub struct Stats {
  pass_attempt: IntCounter,
  pass_complete: IntCounter,
  fetch_failure: IntCounter,
  parse_failure: IntCounter,
  records_emitted: IntCounter,
  pub(crate) nan_quantile_skipped: IntCounter,
  pub(crate) absent_family: IntCounter,
}

impl Stats {
  #[must_use]
  pub fn new(scope: &Scope) -> Self {
    Self {
      pass_attempt: scope.counter("pass_attempt"),
      pass_complete: scope.counter("pass_complete"),
      fetch_failure: scope.counter("fetch_failure"),
      parse_failure: scope.counter("parse_failure"),
      records_emitted: scope.counter("records_emitted"),
      nan_quantile_skipped: scope.counter("nan_quantile_skipped"),
      absent_family: scope.counter("absent_family"),
    }
  }
}

//
// RequestedMetric
//

// Per-request configuration handed down by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestConfig {
  pub endpoint: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestedMetric {
  pub namespace: Namespace,
  pub config: RequestConfig,
}

impl RequestedMetric {
  #[must_use]
  pub fn new(namespace: Namespace) -> Self {
    Self {
      namespace,
      config: RequestConfig::default(),
    }
  }
}

#[derive(thiserror::Error, Debug)]
pub enum CollectError {
  // The request is handed back untouched so the host can report what it asked for.
  #[error("configuration error: {source}")]
  Config {
    source: ConfigError,
    requested: Vec<RequestedMetric>,
  },
}

//
// Collector
//

/// Runs collection passes against a Prometheus endpoint. A pass holds no state beyond its own
/// stack, apart from refreshing the shared discovery cache.
pub struct Collector {
  default_endpoint: String,
  multi_group_metrics: BTreeSet<String>,
  fetcher: Arc<dyn SnapshotFetcher>,
  cache: Arc<DiscoveryCache>,
  time_provider: Arc<dyn TimeProvider>,
  stats: Stats,
}

impl Collector {
  #[must_use]
  pub fn new(
    config: &CollectorConfig,
    fetcher: Arc<dyn SnapshotFetcher>,
    cache: Arc<DiscoveryCache>,
    time_provider: Arc<dyn TimeProvider>,
    scope: &Scope,
  ) -> Self {
    Self {
      default_endpoint: config.endpoint.clone(),
      multi_group_metrics: config.multi_group_metrics.clone(),
      fetcher,
      cache,
      time_provider,
      stats: Stats::new(scope),
    }
  }

  pub fn default_endpoint(&self) -> Result<String, ConfigError> {
    normalize_endpoint(&self.default_endpoint)
  }

  #[must_use]
  pub const fn cache(&self) -> &Arc<DiscoveryCache> {
    &self.cache
  }

  /// The first request's endpoint wins, falling back to the configured default.
  pub fn resolve_endpoint(&self, requested: &[RequestedMetric]) -> Result<String, ConfigError> {
    let first = requested.first().ok_or(ConfigError::EmptyRequest)?;
    first
      .config
      .endpoint
      .as_deref()
      .map_or_else(|| self.default_endpoint(), normalize_endpoint)
  }

  /// Fetches and parses one snapshot. Every successful parse refreshes the discovery cache.
  pub async fn snapshot(&self, endpoint: &str) -> Result<Snapshot, SnapshotError> {
    let body = self.fetcher.fetch(endpoint).await?;
    let snapshot = parse_snapshot(&body)?;
    let added = self.cache.refresh(&snapshot);
    if added > 0 {
      log::debug!("discovered {added} new famil(ies) at {endpoint}");
    }

    Ok(snapshot)
  }

  /// Runs one pass. Configuration problems fail the pass, while an unreachable endpoint or a bad
  /// body degrade it to zero records so that the next tick simply tries again.
  pub async fn collect_metrics(
    &self,
    requested: Vec<RequestedMetric>,
  ) -> Result<Vec<OutputRecord>, CollectError> {
    let timestamp = self.time_provider.now_utc();
    self.stats.pass_attempt.inc();

    let endpoint = match self.resolve_endpoint(&requested) {
      Ok(endpoint) => endpoint,
      Err(source) => return Err(CollectError::Config { source, requested }),
    };

    let snapshot = match self.snapshot(&endpoint).await {
      Ok(snapshot) => snapshot,
      Err(e) => {
        match &e {
          SnapshotError::Fetch(_) => self.stats.fetch_failure.inc(),
          SnapshotError::Parse(_) => self.stats.parse_failure.inc(),
        }
        warn_every!(
          1.minutes(),
          "unable to collect metrics, skipping to next cycle. endpoint: {}, error: {}",
          endpoint,
          e
        );
        return Ok(Vec::new());
      },
    };

    let namespaces: Vec<Namespace> = requested
      .iter()
      .map(|requested| requested.namespace.clone())
      .collect();
    let records = NamespaceResolver::new(&self.multi_group_metrics, &self.stats)
      .resolve(&namespaces, &snapshot, timestamp)
      .map_err(|source| CollectError::Config { source, requested })?;

    self.stats.pass_complete.inc();
    self
      .stats
      .records_emitted
      .inc_by(u64::try_from(records.len()).unwrap_or(u64::MAX));
    log::debug!(
      "collected {} record(s) for {} identifier(s) from {endpoint}",
      records.len(),
      namespaces.len()
    );
    Ok(records)
  }
}
