// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./runner_test.rs"]
mod runner_test;

use crate::collector::{Collector, RequestedMetric};
use crate::config::DiscoveryPolicy;
use crate::discovery::list_identifiers;
use crate::protos::metric::OutputRecord;
use async_trait::async_trait;
use bd_log::warn_every;
use bd_shutdown::ComponentShutdown;
use std::sync::Arc;
use std::time::Duration;
use time::ext::NumericalDuration;
use tokio::time::MissedTickBehavior;

/// Where the records of each pass are handed off.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSink: Send + Sync {
  async fn submit(&self, records: Vec<OutputRecord>);
}

//
// Ticker
//

#[async_trait]
pub trait Ticker: Send + Sync {
  async fn next(&mut self);
}

// An interval rather than a sleep so that a slow endpoint does not push out the schedule.
#[async_trait]
impl Ticker for tokio::time::Interval {
  async fn next(&mut self) {
    self.tick().await;
  }
}

#[must_use]
pub fn make_ticker(period: Duration) -> Box<dyn Ticker> {
  let mut interval = tokio::time::interval(period);
  interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
  Box::new(interval)
}

//
// Runner
//

/// Drives a collection pass on every tick until shut down. The identifier list is discovered on
/// the first tick that manages to produce one and reused afterwards.
pub struct Runner {
  collector: Arc<Collector>,
  policy: DiscoveryPolicy,
  sink: Arc<dyn RecordSink>,
  ticker: Box<dyn Ticker>,
}

impl Runner {
  #[must_use]
  pub fn new(
    collector: Arc<Collector>,
    policy: DiscoveryPolicy,
    sink: Arc<dyn RecordSink>,
    ticker: Box<dyn Ticker>,
  ) -> Self {
    Self {
      collector,
      policy,
      sink,
      ticker,
    }
  }

  pub async fn run(mut self, mut shutdown: ComponentShutdown) {
    let mut requested = Vec::new();
    loop {
      tokio::select! {
        () = shutdown.cancelled() => {
          log::debug!("collection runner cancelled");
          break;
        },
        () = self.ticker.next() => {}
      }

      if requested.is_empty() {
        requested = self.discover().await;
        if requested.is_empty() {
          continue;
        }
      }

      match self.collector.collect_metrics(requested.clone()).await {
        Ok(records) if records.is_empty() => log::debug!("pass produced no records"),
        Ok(records) => self.sink.submit(records).await,
        Err(e) => warn_every!(1.minutes(), "collection pass failed: {}", e),
      }
    }

    if let Err(e) = self.collector.cache().persist() {
      log::warn!("unable to persist discovery cache: {e:#}");
    }
  }

  async fn discover(&self) -> Vec<RequestedMetric> {
    match list_identifiers(&self.policy, &self.collector).await {
      Ok(identifiers) => {
        if identifiers.is_empty() {
          warn_every!(
            1.minutes(),
            "no metrics discovered with {:?}, will retry",
            self.policy
          );
        }
        identifiers.into_iter().map(RequestedMetric::new).collect()
      },
      Err(e) => {
        warn_every!(1.minutes(), "unable to list metrics, will retry: {}", e);
        Vec::new()
      },
    }
  }
}
