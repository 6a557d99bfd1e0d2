// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./decoder_test.rs"]
mod decoder_test;

use super::{DecodedValue, SummaryComponent};
use crate::protos::metric::{
  BYTES_UNIT,
  FamilySamples,
  MetricFamily,
  SUMMARY_TAG,
  Sample,
  SummaryData,
};
use bd_log::warn_every;
use prometheus::IntCounter;
use snapprom_common::LossyFloatToInt;
use time::ext::NumericalDuration;

/// Expands every sample of a family, in sample order.
pub fn decode_family(family: &MetricFamily, nan_skipped: &IntCounter) -> Vec<DecodedValue> {
  match &family.samples {
    FamilySamples::Gauge(samples) => samples
      .iter()
      .map(|sample| decode_gauge(&family.name, sample))
      .collect(),
    FamilySamples::Counter(samples) => samples.iter().map(decode_counter).collect(),
    FamilySamples::Summary(samples) => samples
      .iter()
      .flat_map(|sample| decode_summary(&family.name, sample, nan_skipped))
      .collect(),
  }
}

// Gauges whose family name mentions bytes are reported in bytes.
#[must_use]
pub fn decode_gauge(family_name: &str, sample: &Sample<f64>) -> DecodedValue {
  DecodedValue {
    value: sample.value,
    tags: sample.labels.clone(),
    unit: family_name.contains("bytes").then_some(BYTES_UNIT),
    component: None,
  }
}

#[must_use]
pub fn decode_counter(sample: &Sample<f64>) -> DecodedValue {
  DecodedValue {
    value: sample.value,
    tags: sample.labels.clone(),
    unit: None,
    component: None,
  }
}

/// Emits count, then sum, then every quantile with a real value. NaN quantiles are dropped.
pub fn decode_summary(
  family_name: &str,
  sample: &Sample<SummaryData>,
  nan_skipped: &IntCounter,
) -> Vec<DecodedValue> {
  let summary = &sample.value;
  let mut values = Vec::with_capacity(2 + summary.quantiles.len());
  values.push(make_summary_value(
    sample,
    SummaryComponent::Count,
    summary.sample_count,
  ));
  values.push(make_summary_value(
    sample,
    SummaryComponent::Sum,
    summary.sample_sum,
  ));

  for quantile in &summary.quantiles {
    let component = SummaryComponent::Quantile(quantile_percent(quantile.quantile));
    if quantile.value.is_nan() {
      warn_every!(
        1.minutes(),
        "skipping {} of {} as its value is NaN",
        component.tag_value(),
        family_name
      );
      nan_skipped.inc();
      continue;
    }

    values.push(make_summary_value(sample, component, quantile.value));
  }

  values
}

// 0.999 maps to 99, and 0.29 maps to 28 due to float error. Consumers match on these keys so the
// truncation must not change.
#[must_use]
pub fn quantile_percent(quantile: f64) -> i64 {
  (quantile * 100.0).lossy_to_i64()
}

fn make_summary_value(
  sample: &Sample<SummaryData>,
  component: SummaryComponent,
  value: f64,
) -> DecodedValue {
  let mut tags = sample.labels.clone();
  tags.insert(SUMMARY_TAG.to_string(), component.tag_value());
  DecodedValue {
    value,
    tags,
    unit: None,
    component: Some(component),
  }
}
