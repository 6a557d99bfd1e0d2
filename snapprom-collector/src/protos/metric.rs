// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./metric_test.rs"]
mod metric_test;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use time::OffsetDateTime;

// The first two segments of every identifier handed out by discovery.
pub const VENDOR: &str = "hyperpilot";
pub const PLUGIN_NAME: &str = "prometheus";

// Schema version stamped on every emitted record.
pub const PLUGIN_VERSION: i64 = 1;

pub const SUMMARY_TAG: &str = "summary";
pub const TOTAL_TAG: &str = "total";
pub const TOTAL_TAG_VALUE: &str = "TOTAL";
pub const BYTES_UNIT: &str = "B";

//
// FamilyType
//

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyType {
  Gauge,
  Counter,
  Summary,
}

impl Display for FamilyType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Gauge => "gauge",
      Self::Counter => "counter",
      Self::Summary => "summary",
    })
  }
}

//
// Sample
//

// A single labeled observation. Labels are unique by construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<T> {
  pub labels: BTreeMap<String, String>,
  pub value: T,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryQuantile {
  pub quantile: f64,
  pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryData {
  pub sample_count: f64,
  pub sample_sum: f64,
  pub quantiles: Vec<SummaryQuantile>,
}

//
// FamilySamples
//

// The samples of a family, keyed by the family type so that a family can never mix sample
// payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum FamilySamples {
  Gauge(Vec<Sample<f64>>),
  Counter(Vec<Sample<f64>>),
  Summary(Vec<Sample<SummaryData>>),
}

impl FamilySamples {
  #[must_use]
  pub const fn family_type(&self) -> FamilyType {
    match self {
      Self::Gauge(_) => FamilyType::Gauge,
      Self::Counter(_) => FamilyType::Counter,
      Self::Summary(_) => FamilyType::Summary,
    }
  }
}

//
// MetricFamily
//

#[derive(Clone, Debug, PartialEq)]
pub struct MetricFamily {
  pub name: String,
  pub help: String,
  pub samples: FamilySamples,
}

impl MetricFamily {
  #[must_use]
  pub const fn family_type(&self) -> FamilyType {
    self.samples.family_type()
  }
}

//
// Namespace
//

/// Hierarchical identifier the host uses to request and report a metric stream. The last segment
/// names the metric family.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Vec<String>);

impl Namespace {
  #[cfg(test)]
  #[must_use]
  pub const fn new(segments: Vec<String>) -> Self {
    Self(segments)
  }

  /// Builds the identifier discovery hands out for a family: `<vendor>/<plugin>/<family>`.
  #[must_use]
  pub fn for_family(family_name: &str) -> Self {
    Self(vec![
      VENDOR.to_string(),
      PLUGIN_NAME.to_string(),
      family_name.to_string(),
    ])
  }

  /// Splits a `/` delimited path. Empty segments are dropped.
  #[must_use]
  pub fn from_path(path: &str) -> Self {
    Self(
      path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect(),
    )
  }

  #[must_use]
  pub fn family_name(&self) -> Option<&str> {
    self.0.last().map(String::as_str)
  }
}

impl Display for Namespace {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0.iter().join("/"))
  }
}

//
// OutputRecord
//

/// One record handed to the host. Totals for multi-group families are records too and are told
/// apart by their `total` tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputRecord {
  pub namespace: Namespace,
  #[serde(with = "time::serde::rfc3339")]
  pub timestamp: OffsetDateTime,
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit: Option<String>,
  pub value: f64,
  pub tags: BTreeMap<String, String>,
  pub version: i64,
}

#[cfg(test)]
impl OutputRecord {
  #[must_use]
  pub fn tag(&self, name: &str) -> Option<&str> {
    self.tags.get(name).map(String::as_str)
  }

  #[must_use]
  pub fn is_total(&self) -> bool {
    self.tag(TOTAL_TAG) == Some(TOTAL_TAG_VALUE)
  }
}
