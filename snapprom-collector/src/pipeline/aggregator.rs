// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./aggregator_test.rs"]
mod aggregator_test;

use super::{DecodedValue, SummaryComponent};
use crate::protos::metric::{FamilyType, SUMMARY_TAG, TOTAL_TAG, TOTAL_TAG_VALUE};
use std::collections::BTreeMap;

/// Folds the values decoded for one multi-group family in this pass into totals. Counters yield
/// one total, summaries a total count and a total sum. Quantiles cannot be summed and gauges have
/// no total.
#[must_use]
pub fn aggregate(family_type: FamilyType, decoded: &[DecodedValue]) -> Vec<DecodedValue> {
  if decoded.is_empty() {
    return Vec::new();
  }

  match family_type {
    FamilyType::Counter => vec![make_total(
      None,
      decoded.iter().map(|decoded| decoded.value).sum(),
    )],
    FamilyType::Summary => [SummaryComponent::Count, SummaryComponent::Sum]
      .into_iter()
      .map(|component| {
        make_total(
          Some(component),
          decoded
            .iter()
            .filter(|decoded| decoded.component == Some(component))
            .map(|decoded| decoded.value)
            .sum(),
        )
      })
      .collect(),
    FamilyType::Gauge => {
      log::debug!("gauge families have no total, ignoring multi-group entry");
      Vec::new()
    },
  }
}

fn make_total(component: Option<SummaryComponent>, value: f64) -> DecodedValue {
  let mut tags = BTreeMap::from([(TOTAL_TAG.to_string(), TOTAL_TAG_VALUE.to_string())]);
  if let Some(component) = component {
    tags.insert(SUMMARY_TAG.to_string(), component.tag_value());
  }

  DecodedValue {
    value,
    tags,
    unit: None,
    component,
  }
}
