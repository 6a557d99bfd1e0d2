// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod clients;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod pipeline;
pub mod protos;
pub mod runner;
pub mod snapshot;

#[cfg(test)]
pub mod test;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  use snapprom_common::global_initialize;

  global_initialize();
}
