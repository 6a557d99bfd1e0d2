// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod aggregator;
pub mod decoder;
pub mod resolver;
pub mod time;

use std::collections::BTreeMap;

//
// SummaryComponent
//

// Which part of a summary sample a decoded value came from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SummaryComponent {
  Count,
  Sum,
  // Quantile fraction * 100, truncated toward zero.
  Quantile(i64),
}

impl SummaryComponent {
  #[must_use]
  pub fn tag_value(&self) -> String {
    match self {
      Self::Count => "count".to_string(),
      Self::Sum => "sum".to_string(),
      Self::Quantile(percent) => format!("quantile_{percent}"),
    }
  }
}

//
// DecodedValue
//

/// One value produced from a sample, before it is stamped with the identifier and pass time.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedValue {
  pub value: f64,
  pub tags: BTreeMap<String, String>,
  pub unit: Option<&'static str>,
  pub component: Option<SummaryComponent>,
}
