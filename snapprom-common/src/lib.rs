// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


use bd_log::SwapLogger;
use bd_panic::PanicType;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  global_initialize();
}

pub fn global_initialize() {
  // Must run before the logger is installed. A log line with a thread id emitted during ctor
  // otherwise panics.
  bd_panic::default(PanicType::ForceAbort);

  SwapLogger::initialize();

  // The collector is usually run unattended, so always log panics on release builds.
  #[cfg(not(debug_assertions))]
  unsafe {
    std::env::set_var("LOG_PANIC", "true");
  }
}

pub trait LossyIntoToFloat {
  fn lossy_to_f64(self) -> f64;
}

impl LossyIntoToFloat for u64 {
  #[allow(clippy::cast_precision_loss)]
  fn lossy_to_f64(self) -> f64 {
    self as f64
  }
}

pub trait LossyFloatToInt {
  fn lossy_to_i64(self) -> i64;
}

impl LossyFloatToInt for f64 {
  // Truncates toward zero. NaN maps to 0 and out of range values saturate.
  #[allow(clippy::cast_possible_truncation)]
  fn lossy_to_i64(self) -> i64 {
    self as i64
  }
}
