// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed key/value cache with an optional on-disk spill directory.
//!
//! Every operation fails closed: a storage failure is logged and swallowed,
//! `load` answers `None`, and the app degrades to session-only state rather
//! than crashing (quota exceeded and disabled storage are normal conditions
//! on user machines).

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable key/value cache.
///
/// Reads and writes go through an in-memory layer that always works; the
/// spill directory, when available, makes entries survive restarts.
#[derive(Clone)]
pub struct DurableCache {
    mem: Arc<DashMap<String, serde_json::Value>>,
    dir: Option<PathBuf>,
}

impl DurableCache {
    /// Open a cache backed by `dir`, creating it if needed.
    ///
    /// If the directory cannot be created the cache still works, in-memory
    /// only, and a warning is logged once.
    pub fn new(dir: &Path) -> Self {
        let dir = match std::fs::create_dir_all(dir) {
            Ok(()) => Some(dir.to_path_buf()),
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cache directory unavailable, falling back to in-memory");
                None
            }
        };

        Self {
            mem: Arc::new(DashMap::new()),
            dir,
        }
    }

    /// Create a cache with no persistence (tests, degraded mode).
    pub fn new_in_memory() -> Self {
        Self {
            mem: Arc::new(DashMap::new()),
            dir: None,
        }
    }

    /// True if entries survive a restart.
    pub fn is_persistent(&self) -> bool {
        self.dir.is_some()
    }

    /// Store a value under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize cache value");
                return;
            }
        };

        self.mem.insert(key.to_string(), json.clone());

        if let Some(path) = self.file_path(key) {
            let bytes = match serde_json::to_vec_pretty(&json) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Failed to encode cache value");
                    return;
                }
            };
            if let Err(e) = std::fs::write(&path, bytes) {
                tracing::warn!(key, error = %e, "Failed to persist cache entry");
            }
        }
    }

    /// Load the value stored under `key`, or `None` if absent or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(json) = self.mem.get(key) {
            return match serde_json::from_value(json.clone()) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(key, error = %e, "Cached value has wrong shape");
                    None
                }
            };
        }

        let path = self.file_path(key)?;
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(json) => {
                self.mem.insert(key.to_string(), json.clone());
                match serde_json::from_value(json) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(key, error = %e, "Persisted value has wrong shape");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Persisted value is not valid JSON");
                None
            }
        }
    }

    /// Remove the value stored under `key`.
    pub fn remove(&self, key: &str) {
        self.mem.remove(key);
        if let Some(path) = self.file_path(key) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(key, error = %e, "Failed to remove cache entry");
                }
            }
        }
    }

    fn file_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.json", key)))
    }
}
