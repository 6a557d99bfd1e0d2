// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{ParseError, parse_help, parse_snapshot};
use crate::protos::metric::{FamilySamples, FamilyType, SummaryData, SummaryQuantile};
use crate::test::make_sample;
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn counter() {
  let exp = r"
            # HELP uptime A counter
            # TYPE uptime counter
            uptime 123.0 1612411506789
            ";

  let snapshot = parse_snapshot(exp.as_bytes()).unwrap();
  assert_eq!(snapshot.len(), 1);
  let family = snapshot.get("uptime").unwrap();
  assert_eq!(family.help, "A counter");
  assert_eq!(
    family.samples,
    FamilySamples::Counter(vec![make_sample(&[], 123.0)])
  );
}

#[test]
fn mixed() {
  let exp = r#"
            # TYPE uptime counter
            uptime 123.0 1612411506789
            # HELP process_resident_memory_bytes Resident memory size in bytes.
            # TYPE process_resident_memory_bytes gauge
            process_resident_memory_bytes{instance="a"} 1024
            process_resident_memory_bytes{instance="b"} 2048
            # TYPE launch_count untyped
            launch_count 10.0
            "#;

  let snapshot = parse_snapshot(exp.as_bytes()).unwrap();
  assert_eq!(
    snapshot
      .families()
      .map(|family| (family.name.as_str(), family.family_type()))
      .collect::<Vec<_>>(),
    vec![
      ("launch_count", FamilyType::Gauge),
      ("process_resident_memory_bytes", FamilyType::Gauge),
      ("uptime", FamilyType::Counter),
    ]
  );

  let family = snapshot.get("process_resident_memory_bytes").unwrap();
  assert_eq!(family.help, "Resident memory size in bytes.");
  assert_eq!(
    family.samples,
    FamilySamples::Gauge(vec![
      make_sample(&[("instance", "a")], 1024.0),
      make_sample(&[("instance", "b")], 2048.0),
    ])
  );
  assert_eq!(snapshot.get("uptime").unwrap().help, "");
}

#[test]
fn summary() {
  let exp = r#"
            # HELP rpc_duration_seconds A summary of the RPC duration in seconds.
            # TYPE rpc_duration_seconds summary
            rpc_duration_seconds{service="a",quantile="0.01"} 3102
            rpc_duration_seconds{service="a",quantile="0.5"} 4773
            rpc_duration_seconds{service="a",quantile="0.99"} NaN
            rpc_duration_seconds_sum{service="a"} 1.7560473e+07
            rpc_duration_seconds_count{service="a"} 2693
            "#;

  let snapshot = parse_snapshot(exp.as_bytes()).unwrap();
  let family = snapshot.get("rpc_duration_seconds").unwrap();
  assert_eq!(family.help, "A summary of the RPC duration in seconds.");

  let FamilySamples::Summary(samples) = &family.samples else {
    panic!("expected summary samples");
  };
  assert_eq!(samples.len(), 1);
  assert_eq!(
    samples[0].labels,
    BTreeMap::from([("service".to_string(), "a".to_string())])
  );
  let SummaryData {
    sample_count,
    sample_sum,
    quantiles,
  } = &samples[0].value;
  assert_eq!(*sample_count, 2693.0);
  assert_eq!(*sample_sum, 17_560_473.0);
  assert_eq!(
    quantiles[..2],
    [
      SummaryQuantile {
        quantile: 0.01,
        value: 3102.0
      },
      SummaryQuantile {
        quantile: 0.5,
        value: 4773.0
      },
    ]
  );
  assert_eq!(quantiles[2].quantile, 0.99);
  assert!(quantiles[2].value.is_nan());
}

#[test]
fn histogram_dropped() {
  let exp = r#"
            # TYPE http_request_duration_seconds histogram
            http_request_duration_seconds_bucket{le="0.05"} 24054
            http_request_duration_seconds_bucket{le="+Inf"} 144320
            http_request_duration_seconds_sum 53423
            http_request_duration_seconds_count 144320
            # TYPE up gauge
            up 1
            "#;

  let snapshot = parse_snapshot(exp.as_bytes()).unwrap();
  assert!(snapshot.get("http_request_duration_seconds").is_none());
  assert_eq!(snapshot.len(), 1);
}

#[test]
fn invalid() {
  assert_matches!(
    parse_snapshot(b"not a prom response"),
    Err(ParseError::Exposition(_))
  );
  assert_matches!(parse_snapshot(&[0xff, 0xfe]), Err(ParseError::Utf8(_)));
  assert!(parse_snapshot(b"").unwrap().is_empty());
}

#[test]
fn help_lines() {
  let help = parse_help(
    "# HELP a first\\nsecond \\\\ done\n#HELP b\n# HELPER c nope\n  #  HELP d  padded text \n",
  );
  assert_eq!(help.len(), 3);
  assert_eq!(help["a"], "first\nsecond \\ done");
  assert_eq!(help["b"], "");
  assert_eq!(help["d"], "padded text");
}
