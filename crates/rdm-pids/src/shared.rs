// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reload-and-swap holder for a [`RootPidStore`].
//!
//! Readers take an `Arc` snapshot and keep using it for as long as they need;
//! a reload builds a complete new store and swaps it in atomically, so a
//! partially loaded store is never visible.

use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use log::{info, warn};

use crate::error::LoadError;
use crate::loader::{load, PidDataSource};
use crate::root::RootPidStore;

/// Shared, atomically replaceable PID store.
pub struct SharedPidStore<'m, M> {
    current: ArcSwap<RootPidStore<'m, M>>,
}

impl<'m, M> SharedPidStore<'m, M> {
    pub fn new(root: RootPidStore<'m, M>) -> Self {
        SharedPidStore {
            current: ArcSwap::from_pointee(root),
        }
    }

    /// Snapshot of the current store (atomic load, no lock).
    pub fn current(&self) -> Arc<RootPidStore<'m, M>> {
        self.current.load_full()
    }

    /// Version of the current store.
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    /// Swap in `root` if its version is not older than the current one.
    ///
    /// The version check and the swap are one compare-and-swap, so two
    /// concurrent writers can never leave the older store installed.
    /// Returns the store that was replaced.
    pub fn replace(
        &self,
        root: RootPidStore<'m, M>,
    ) -> Result<Arc<RootPidStore<'m, M>>, LoadError> {
        let offered = root.version();
        let next = Arc::new(root);
        let mut current = self.current.load_full();
        loop {
            if offered < current.version() {
                warn!(
                    "ignoring PID data v{}, current store is v{}",
                    offered,
                    current.version()
                );
                return Err(LoadError::StaleVersion {
                    current: current.version(),
                    offered,
                });
            }
            let previous = self.current.compare_and_swap(&current, Arc::clone(&next));
            let previous = Guard::into_inner(previous);
            if Arc::ptr_eq(&previous, &current) {
                info!("PID store v{} -> v{}", current.version(), offered);
                return Ok(current);
            }
            // Another writer got in first; re-check against its store.
            current = previous;
        }
    }

    /// Load `source` and swap the result in.
    ///
    /// On failure the current store is left untouched.
    pub fn reload<S>(
        &self,
        source: &S,
        validate: bool,
    ) -> Result<Arc<RootPidStore<'m, M>>, LoadError>
    where
        S: PidDataSource<'m, M> + ?Sized,
    {
        let root = load(source, validate)?;
        self.replace(root)
    }
}

impl<M> fmt::Debug for SharedPidStore<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPidStore")
            .field("current", &**self.current.load())
            .finish()
    }
}
