// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::protos::metric::{
  FamilySamples,
  MetricFamily,
  Namespace,
  OutputRecord,
  PLUGIN_VERSION,
  Sample,
  SummaryData,
  SummaryQuantile,
};
use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tokio::net::TcpListener;

#[must_use]
pub fn make_tags(tags: &[(&str, &str)]) -> BTreeMap<String, String> {
  tags
    .iter()
    .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
    .collect()
}

#[must_use]
pub fn make_sample(labels: &[(&str, &str)], value: f64) -> Sample<f64> {
  Sample {
    labels: make_tags(labels),
    value,
  }
}

#[must_use]
pub fn make_summary_sample(
  labels: &[(&str, &str)],
  sample_count: f64,
  sample_sum: f64,
  quantiles: &[(f64, f64)],
) -> Sample<SummaryData> {
  Sample {
    labels: make_tags(labels),
    value: SummaryData {
      sample_count,
      sample_sum,
      quantiles: quantiles
        .iter()
        .map(|(quantile, value)| SummaryQuantile {
          quantile: *quantile,
          value: *value,
        })
        .collect(),
    },
  }
}

#[must_use]
pub fn make_family(name: &str, help: &str, samples: FamilySamples) -> MetricFamily {
  MetricFamily {
    name: name.to_string(),
    help: help.to_string(),
    samples,
  }
}

#[must_use]
pub fn make_record(
  family_name: &str,
  timestamp: OffsetDateTime,
  description: &str,
  unit: Option<&str>,
  value: f64,
  tags: &[(&str, &str)],
) -> OutputRecord {
  OutputRecord {
    namespace: Namespace::for_family(family_name),
    timestamp,
    description: description.to_string(),
    unit: unit.map(ToString::to_string),
    value,
    tags: make_tags(tags),
    version: PLUGIN_VERSION,
  }
}

//
// TestPromServer
//

// Serves a fixed body and status on "/" and "/metrics", counting calls.
pub struct TestPromServer {
  calls: Arc<AtomicU64>,
  response_code: StatusCode,
  body: String,
}

impl TestPromServer {
  pub async fn start(response_code: StatusCode, body: &str) -> (u16, Arc<AtomicU64>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    log::debug!("starting test server on port {port}");

    let calls = Arc::new(AtomicU64::new(0));
    let server = Arc::new(Self {
      calls: calls.clone(),
      response_code,
      body: body.to_string(),
    });

    tokio::spawn(async move {
      axum::serve(listener, server.router().into_make_service())
        .await
        .unwrap();
    });

    (port, calls)
  }

  fn router(self: Arc<Self>) -> axum::Router {
    axum::Router::new()
      .route("/", get(metrics))
      .route("/metrics", get(metrics))
      .with_state(self)
  }
}

async fn metrics(State(server): State<Arc<TestPromServer>>) -> Response {
  server.calls.fetch_add(1, Ordering::SeqCst);

  let mut response = Response::new(Body::from(server.body.clone()));
  *response.status_mut() = server.response_code;
  response
}
