// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./resolver_test.rs"]
mod resolver_test;

use super::DecodedValue;
use super::aggregator::aggregate;
use super::decoder::decode_family;
use crate::collector::Stats;
use crate::config::ConfigError;
use crate::protos::metric::{MetricFamily, Namespace, OutputRecord, PLUGIN_VERSION};
use crate::snapshot::Snapshot;
use std::collections::BTreeSet;
use time::OffsetDateTime;

//
// NamespaceResolver
//

/// Joins the identifiers the host asked for with the families present in a snapshot. The last
/// segment of an identifier names its family.
pub struct NamespaceResolver<'a> {
  multi_group_metrics: &'a BTreeSet<String>,
  stats: &'a Stats,
}

impl<'a> NamespaceResolver<'a> {
  #[must_use]
  pub const fn new(multi_group_metrics: &'a BTreeSet<String>, stats: &'a Stats) -> Self {
    Self {
      multi_group_metrics,
      stats,
    }
  }

  /// Produces records in request order, then sample order, then decoder order. Totals of a
  /// multi-group family follow that identifier's per-sample records. Identifiers whose family is
  /// absent from the snapshot produce nothing.
  pub fn resolve(
    &self,
    requested: &[Namespace],
    snapshot: &Snapshot,
    timestamp: OffsetDateTime,
  ) -> Result<Vec<OutputRecord>, ConfigError> {
    if requested.is_empty() {
      return Err(ConfigError::EmptyRequest);
    }

    let mut records = Vec::new();
    for namespace in requested {
      let Some(family) = namespace
        .family_name()
        .and_then(|family_name| snapshot.get(family_name))
      else {
        log::debug!("no family for {namespace} in this snapshot, skipping");
        self.stats.absent_family.inc();
        continue;
      };

      let decoded = decode_family(family, &self.stats.nan_quantile_skipped);
      let totals = if self.multi_group_metrics.contains(&family.name) {
        aggregate(family.family_type(), &decoded)
      } else {
        Vec::new()
      };

      records.extend(
        decoded
          .into_iter()
          .chain(totals)
          .map(|decoded| make_record(namespace, family, timestamp, decoded)),
      );
    }

    Ok(records)
  }
}

fn make_record(
  namespace: &Namespace,
  family: &MetricFamily,
  timestamp: OffsetDateTime,
  decoded: DecodedValue,
) -> OutputRecord {
  OutputRecord {
    namespace: namespace.clone(),
    timestamp,
    description: family.help.clone(),
    unit: decoded.unit.map(ToString::to_string),
    value: decoded.value,
    tags: decoded.tags,
    version: PLUGIN_VERSION,
  }
}
