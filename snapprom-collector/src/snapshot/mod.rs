// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod parser;

use crate::clients::http::FetchError;
use crate::protos::metric::MetricFamily;
use parser::ParseError;
use std::collections::BTreeMap;

//
// Snapshot
//

/// The decoded contents of one scrape, keyed by family name. Built fresh on every pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
  families: BTreeMap<String, MetricFamily>,
}

impl Snapshot {
  #[must_use]
  pub fn new(families: impl IntoIterator<Item = MetricFamily>) -> Self {
    Self {
      families: families
        .into_iter()
        .map(|family| (family.name.clone(), family))
        .collect(),
    }
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&MetricFamily> {
    self.families.get(name)
  }

  // Families in name order.
  pub fn families(&self) -> impl Iterator<Item = &MetricFamily> {
    self.families.values()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.families.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.families.is_empty()
  }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
  #[error("unable to download metrics: {0}")]
  Fetch(#[from] FetchError),
  #[error("unable to parse metrics: {0}")]
  Parse(#[from] ParseError),
}
