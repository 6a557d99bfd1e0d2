// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{decode_family, quantile_percent};
use crate::pipeline::{DecodedValue, SummaryComponent};
use crate::protos::metric::FamilySamples;
use crate::test::{make_family, make_sample, make_summary_sample, make_tags};
use pretty_assertions::assert_eq;
use prometheus::IntCounter;

fn nan_counter() -> IntCounter {
  IntCounter::new("nan_quantile_skipped", "test").unwrap()
}

fn summary_value(
  tags: &[(&str, &str)],
  component: SummaryComponent,
  value: f64,
) -> DecodedValue {
  DecodedValue {
    value,
    tags: make_tags(tags),
    unit: None,
    component: Some(component),
  }
}

#[test]
fn gauge_unit() {
  let nan_skipped = nan_counter();
  let bytes = make_family(
    "process_resident_memory_bytes",
    "",
    FamilySamples::Gauge(vec![
      make_sample(&[("instance", "a")], 1024.0),
      make_sample(&[], 2048.0),
    ]),
  );
  assert_eq!(
    decode_family(&bytes, &nan_skipped),
    vec![
      DecodedValue {
        value: 1024.0,
        tags: make_tags(&[("instance", "a")]),
        unit: Some("B"),
        component: None,
      },
      DecodedValue {
        value: 2048.0,
        tags: make_tags(&[]),
        unit: Some("B"),
        component: None,
      },
    ]
  );

  let goroutines = make_family(
    "go_goroutines",
    "",
    FamilySamples::Gauge(vec![make_sample(&[], 12.0)]),
  );
  assert_eq!(
    decode_family(&goroutines, &nan_skipped),
    vec![DecodedValue {
      value: 12.0,
      tags: make_tags(&[]),
      unit: None,
      component: None,
    }]
  );
}

#[test]
fn counter_never_has_unit() {
  let family = make_family(
    "http_response_bytes_total",
    "",
    FamilySamples::Counter(vec![make_sample(&[("code", "200")], 3.0)]),
  );
  assert_eq!(
    decode_family(&family, &nan_counter()),
    vec![DecodedValue {
      value: 3.0,
      tags: make_tags(&[("code", "200")]),
      unit: None,
      component: None,
    }]
  );
}

#[test]
fn summary_expansion() {
  let nan_skipped = nan_counter();
  let family = make_family(
    "rpc_duration_seconds",
    "",
    FamilySamples::Summary(vec![
      make_summary_sample(
        &[("service", "a")],
        10.0,
        100.0,
        &[(0.5, 4.0), (0.9, f64::NAN), (0.999, 9.0)],
      ),
      make_summary_sample(&[("service", "b")], 5.0, 20.0, &[]),
    ]),
  );

  assert_eq!(
    decode_family(&family, &nan_skipped),
    vec![
      summary_value(
        &[("service", "a"), ("summary", "count")],
        SummaryComponent::Count,
        10.0
      ),
      summary_value(
        &[("service", "a"), ("summary", "sum")],
        SummaryComponent::Sum,
        100.0
      ),
      summary_value(
        &[("service", "a"), ("summary", "quantile_50")],
        SummaryComponent::Quantile(50),
        4.0
      ),
      summary_value(
        &[("service", "a"), ("summary", "quantile_99")],
        SummaryComponent::Quantile(99),
        9.0
      ),
      summary_value(
        &[("service", "b"), ("summary", "count")],
        SummaryComponent::Count,
        5.0
      ),
      summary_value(
        &[("service", "b"), ("summary", "sum")],
        SummaryComponent::Sum,
        20.0
      ),
    ]
  );
  assert_eq!(nan_skipped.get(), 1);
}

#[test]
fn summary_label_overridden() {
  let family = make_family(
    "rpc_duration_seconds",
    "",
    FamilySamples::Summary(vec![make_summary_sample(
      &[("summary", "user")],
      1.0,
      2.0,
      &[],
    )]),
  );

  let decoded = decode_family(&family, &nan_counter());
  assert_eq!(decoded.len(), 2);
  assert_eq!(decoded[0].tags, make_tags(&[("summary", "count")]));
  assert_eq!(decoded[1].tags, make_tags(&[("summary", "sum")]));
}

#[test]
fn quantile_keys_truncate() {
  assert_eq!(quantile_percent(0.0), 0);
  assert_eq!(quantile_percent(0.01), 1);
  assert_eq!(quantile_percent(0.25), 25);
  assert_eq!(quantile_percent(0.29), 28);
  assert_eq!(quantile_percent(0.5), 50);
  assert_eq!(quantile_percent(0.999), 99);
  assert_eq!(quantile_percent(1.0), 100);
  assert_eq!(SummaryComponent::Quantile(28).tag_value(), "quantile_28");
}
