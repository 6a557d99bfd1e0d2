// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use anyhow::Context;
use async_trait::async_trait;
use bd_server_stats::stats::Collector as StatsCollector;
use bd_shutdown::ComponentShutdownTrigger;
use clap::{Parser, Subcommand};
use log::info;
use snapprom_collector::clients::http::HttpSnapshotFetcher;
use snapprom_collector::collector::{Collector, RequestedMetric};
use snapprom_collector::config::{
  CollectorConfig,
  DEFAULT_CONFIG_PATH,
  load_from_file,
  load_or_default,
};
use snapprom_collector::discovery::cache::DiscoveryCache;
use snapprom_collector::discovery::list_identifiers;
use snapprom_collector::pipeline::time::RealTimeProvider;
use snapprom_collector::protos::metric::{Namespace, OutputRecord};
use snapprom_collector::runner::{RecordSink, Runner, make_ticker};
use snapprom_common::global_initialize;
use std::sync::Arc;
use tokio::select;
use tokio::signal::unix::{SignalKind, signal};

#[derive(Parser, Debug)]
struct Options {
  /// YAML or JSON config file. When omitted, the default path is tried and built-in defaults are
  /// used if it cannot be loaded.
  #[arg(short = 'c', long = "config")]
  config: Option<String>,

  /// Prometheus endpoint, overriding the one in the config file.
  #[arg(long, env = "SNAPPROM_ENDPOINT")]
  endpoint: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List the metric identifiers available for collection.
  List,
  /// Run a single collection pass and print the records as JSON lines.
  Collect {
    /// Family name or `/` delimited identifier. Everything discoverable is collected if omitted.
    #[arg(long)]
    metric: Vec<String>,
  },
  /// Collect on every interval until interrupted.
  Run,
}

//
// StdoutSink
//

struct StdoutSink {}

#[async_trait]
impl RecordSink for StdoutSink {
  async fn submit(&self, records: Vec<OutputRecord>) {
    for record in records {
      match serde_json::to_string(&record) {
        Ok(line) => println!("{line}"),
        Err(e) => log::warn!("unable to serialize record for {}: {e}", record.namespace),
      }
    }
  }
}

fn load_config(options: &Options) -> anyhow::Result<CollectorConfig> {
  let mut config = match &options.config {
    Some(path) => {
      let config = load_from_file(path)
        .with_context(|| format!("can't load config file from {path}"))?;
      info!("loaded config file {path}");
      config
    },
    None => load_or_default(DEFAULT_CONFIG_PATH),
  };

  if let Some(endpoint) = &options.endpoint {
    config.endpoint.clone_from(endpoint);
  }
  Ok(config)
}

fn make_collector(config: &CollectorConfig) -> anyhow::Result<Collector> {
  let cache = match &config.discovery_cache_path {
    Some(path) => DiscoveryCache::load(path)?,
    None => DiscoveryCache::in_memory(),
  };

  Ok(Collector::new(
    config,
    Arc::new(HttpSnapshotFetcher::new(config.fetch_timeout)?),
    Arc::new(cache),
    Arc::new(RealTimeProvider {}),
    &StatsCollector::default().scope("collector"),
  ))
}

fn parse_namespace(metric: &str) -> Namespace {
  if metric.contains('/') {
    Namespace::from_path(metric)
  } else {
    Namespace::for_family(metric)
  }
}

async fn wait_for_signal() -> anyhow::Result<()> {
  // Trap ctrl+c and sigterm messages and perform a clean shutdown
  let mut sigint = signal(SignalKind::interrupt())?;
  let mut sigterm = signal(SignalKind::terminate())?;
  select! {
    _ = sigint.recv() => info!("received sigint"),
    _ = sigterm.recv() => info!("received sigterm"),
  }
  Ok(())
}

async fn run_command(command: Command, config: CollectorConfig) -> anyhow::Result<()> {
  let collector = Arc::new(make_collector(&config)?);

  match command {
    Command::List => {
      for namespace in list_identifiers(&config.discovery, &collector).await? {
        println!("{namespace}");
      }
    },
    Command::Collect { metric } => {
      let namespaces = if metric.is_empty() {
        list_identifiers(&config.discovery, &collector).await?
      } else {
        metric.iter().map(|metric| parse_namespace(metric)).collect()
      };
      let records = collector
        .collect_metrics(namespaces.into_iter().map(RequestedMetric::new).collect())
        .await?;
      StdoutSink {}.submit(records).await;
      collector.cache().persist()?;
    },
    Command::Run => {
      info!(
        "collecting from {} every {:?}",
        config.endpoint, config.collect_interval
      );
      let shutdown_trigger = ComponentShutdownTrigger::default();
      let runner = Runner::new(
        collector,
        config.discovery.clone(),
        Arc::new(StdoutSink {}),
        make_ticker(config.collect_interval),
      );
      let runner = tokio::spawn(runner.run(shutdown_trigger.make_shutdown()));

      wait_for_signal().await?;
      shutdown_trigger.shutdown().await;
      runner.await?;
    },
  }

  Ok(())
}

fn main() -> anyhow::Result<()> {
  global_initialize();
  let options = Options::parse();
  let config = load_config(&options)?;

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?;
  runtime.block_on(run_command(options.command, config))
}
