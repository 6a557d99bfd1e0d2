// snapprom - bitdrift's prometheus snapshot collector
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./cache_test.rs"]
mod cache_test;

use crate::protos::metric::FamilyType;
use crate::snapshot::Snapshot;
use anyhow::Context;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;

//
// DiscoveryCache
//

/// Family names seen on the endpoint so far, with their type. Entries are only ever added, so a
/// family that disappears for a few scrapes stays discoverable.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
  path: Option<PathBuf>,
  entries: RwLock<BTreeMap<String, FamilyType>>,
}

impl DiscoveryCache {
  #[must_use]
  pub fn in_memory() -> Self {
    Self::default()
  }

  /// Loads a previously persisted cache. A missing file yields an empty cache bound to `path`.
  pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
    let path = path.into();
    let entries = match std::fs::read(&path) {
      Ok(contents) => serde_json::from_slice(&contents)
        .with_context(|| format!("invalid discovery cache {}", path.display()))?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("no discovery cache at {}, starting empty", path.display());
        BTreeMap::new()
      },
      Err(e) => {
        return Err(e).with_context(|| format!("cannot read discovery cache {}", path.display()));
      },
    };

    Ok(Self {
      path: Some(path),
      entries: RwLock::new(entries),
    })
  }

  #[cfg(test)]
  #[must_use]
  pub fn path(&self) -> Option<&std::path::Path> {
    self.path.as_deref()
  }

  /// Adds every family of the snapshot. Returns the number of names not seen before.
  pub fn refresh(&self, snapshot: &Snapshot) -> usize {
    let mut entries = self.entries.write();
    let before = entries.len();
    for family in snapshot.families() {
      entries.insert(family.name.clone(), family.family_type());
    }
    entries.len() - before
  }

  // Sorted by name.
  #[must_use]
  pub fn names(&self) -> Vec<String> {
    self.entries.read().keys().cloned().collect()
  }

  #[cfg(test)]
  #[must_use]
  pub fn get(&self, name: &str) -> Option<FamilyType> {
    self.entries.read().get(name).copied()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  /// Writes the cache to its path, if it has one. The file is replaced atomically.
  pub fn persist(&self) -> anyhow::Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };

    let contents = serde_json::to_vec_pretty(&*self.entries.read())?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)
      .with_context(|| format!("cannot write discovery cache {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
      .with_context(|| format!("cannot replace discovery cache {}", path.display()))?;
    log::debug!("persisted discovery cache to {}", path.display());
    Ok(())
  }
}
