// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod cache;


use crate::collector::Collector;
use crate::config::{ConfigError, DiscoveryPolicy};
use crate::protos::metric::Namespace;
use crate::snapshot::SnapshotError;
use bd_log::warn_every;
use time::ext::NumericalDuration;

#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
  #[error("discovery failed: {0}")]
  Snapshot(#[from] SnapshotError),
  #[error("discovery failed: {0}")]
  Config(#[from] ConfigError),
}

/// Lists the identifiers the host may request.
pub async fn list_identifiers(
  policy: &DiscoveryPolicy,
  collector: &Collector,
) -> Result<Vec<Namespace>, DiscoveryError> {
  match policy {
    DiscoveryPolicy::Static { metrics } => Ok(
      metrics
        .iter()
        .map(|family_name| Namespace::for_family(family_name))
        .collect(),
    ),
    DiscoveryPolicy::Dynamic {} => discover_dynamic(collector).await,
  }
}

async fn discover_dynamic(collector: &Collector) -> Result<Vec<Namespace>, DiscoveryError> {
  let endpoint = collector.default_endpoint()?;
  let cache = collector.cache();

  match collector.snapshot(&endpoint).await {
    Ok(snapshot) => {
      if let Err(e) = cache.persist() {
        log::warn!("unable to persist discovery cache: {e:#}");
      }
      log::info!("discovered {} famil(ies) at {endpoint}", snapshot.len());
      Ok(
        snapshot
          .families()
          .map(|family| Namespace::for_family(&family.name))
          .collect(),
      )
    },
    Err(e) if !cache.is_empty() => {
      warn_every!(
        1.minutes(),
        "unable to discover metrics at {}, using {} cached famil(ies): {}",
        endpoint,
        cache.len(),
        e
      );
      Ok(
        cache
          .names()
          .iter()
          .map(|family_name| Namespace::for_family(family_name))
          .collect(),
      )
    },
    Err(e) => Err(e.into()),
  }
}
