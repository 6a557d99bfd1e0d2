// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./parser_test.rs"]
mod parser_test;

use super::Snapshot;
use crate::protos::metric::{FamilySamples, MetricFamily, Sample, SummaryData, SummaryQuantile};
use prometheus_parser::{GroupKey, MetricGroup};
use snapprom_common::LossyIntoToFloat;
use std::collections::{BTreeMap, HashMap};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
  #[error("body is not valid UTF-8: {0}")]
  Utf8(#[from] std::str::Utf8Error),
  #[error("exposition format error: {0}")]
  Exposition(String),
}

/// Decodes a text exposition body into a snapshot. Histogram families have no representation in
/// the collector and are dropped. Untyped families are treated as gauges.
pub fn parse_snapshot(data: &[u8]) -> Result<Snapshot, ParseError> {
  let data = std::str::from_utf8(data)?;
  let groups =
    prometheus_parser::parse_text(data).map_err(|e| ParseError::Exposition(e.to_string()))?;
  let mut help = parse_help(data);

  Ok(Snapshot::new(groups.into_iter().filter_map(|group| {
    let help = help.remove(group.name.as_str()).unwrap_or_default();
    group_as_family(group, help)
  })))
}

fn group_as_family(group: MetricGroup, help: String) -> Option<MetricFamily> {
  let samples = match group.metrics {
    prometheus_parser::GroupKind::Summary(summaries) => FamilySamples::Summary(
      summaries
        .into_iter()
        .map(|(key, summary)| Sample {
          labels: labels(key),
          value: SummaryData {
            sample_count: summary.count.lossy_to_f64(),
            sample_sum: summary.sum,
            quantiles: summary
              .quantiles
              .iter()
              .map(|quantile| SummaryQuantile {
                quantile: quantile.quantile,
                value: quantile.value,
              })
              .collect(),
          },
        })
        .collect(),
    ),
    prometheus_parser::GroupKind::Gauge(gauges) => FamilySamples::Gauge(
      gauges
        .into_iter()
        .map(|(key, gauge)| Sample {
          labels: labels(key),
          value: gauge.value,
        })
        .collect(),
    ),
    prometheus_parser::GroupKind::Counter(counters) => FamilySamples::Counter(
      counters
        .into_iter()
        .map(|(key, counter)| Sample {
          labels: labels(key),
          value: counter.value,
        })
        .collect(),
    ),
    prometheus_parser::GroupKind::Untyped(untypeds) => FamilySamples::Gauge(
      untypeds
        .into_iter()
        .map(|(key, untyped)| Sample {
          labels: labels(key),
          value: untyped.value,
        })
        .collect(),
    ),
    prometheus_parser::GroupKind::Histogram(_) => {
      log::debug!("dropping histogram family {}", group.name);
      return None;
    },
  };

  Some(MetricFamily {
    name: group.name,
    help,
    samples,
  })
}

// Exposition timestamps are ignored, every record of a pass carries the pass time.
fn labels(key: GroupKey) -> BTreeMap<String, String> {
  key
    .labels
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

// The exposition parser only keeps TYPE headers, so HELP lines are picked up separately.
fn parse_help(data: &str) -> HashMap<&str, String> {
  data
    .lines()
    .filter_map(|line| {
      let rest = line
        .trim()
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix("HELP")?;
      if !rest.starts_with([' ', '\t']) {
        return None;
      }

      let rest = rest.trim_start();
      let (name, text) = rest.split_once([' ', '\t']).unwrap_or((rest, ""));
      Some((name, unescape_help(text.trim_start())))
    })
    .collect()
}

// HELP text escapes backslash and newline only.
fn unescape_help(text: &str) -> String {
  let mut unescaped = String::with_capacity(text.len());
  let mut chars = text.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      unescaped.push(c);
      continue;
    }

    match chars.next() {
      Some('n') => unescaped.push('\n'),
      Some('\\') => unescaped.push('\\'),
      Some(other) => {
        unescaped.push('\\');
        unescaped.push(other);
      },
      None => unescaped.push('\\'),
    }
  }

  unescaped
}
