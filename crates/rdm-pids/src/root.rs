// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The root of the PID descriptor store.
//!
//! ```text
//! RootPidStore (version N)
//! +-- esta_store: PidStore            (E1.20, E1.37-x parameters)
//! +-- manufacturer_stores: BTreeMap<u16, PidStore>
//!         +-- 0x7a70 -> PidStore      (manufacturer-specific parameters)
//!         +-- ...
//! ```
//!
//! Manufacturer-qualified lookups search the manufacturer's store first and
//! then fall back to the ESTA store, so standard parameters stay reachable
//! from any manufacturer scope.

use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::PidDescriptor;
use crate::store::PidStore;

/// The ESTA store plus every manufacturer store, tagged with a data version.
///
/// Immutable once built. Reloading means building a new `RootPidStore` and
/// swapping it in, see [`SharedPidStore`](crate::SharedPidStore).
pub struct RootPidStore<'m, M> {
    esta_store: PidStore<'m, M>,
    manufacturer_stores: BTreeMap<u16, PidStore<'m, M>>,
    version: u64,
}

impl<'m, M> RootPidStore<'m, M> {
    /// Create a new root store.
    ///
    /// Most code should go through [`load`](crate::load) or
    /// [`load_from_directory`](crate::load_from_directory) instead.
    pub fn new(
        esta_store: PidStore<'m, M>,
        manufacturer_stores: BTreeMap<u16, PidStore<'m, M>>,
        version: u64,
    ) -> Self {
        RootPidStore {
            esta_store,
            manufacturer_stores,
            version,
        }
    }

    /// Version of the parameter data. Higher is more recent.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The store holding ESTA parameters.
    pub fn esta_store(&self) -> &PidStore<'m, M> {
        &self.esta_store
    }

    /// The store for `manufacturer_id`, if any parameters were loaded for it.
    pub fn manufacturer_store(&self, manufacturer_id: u16) -> Option<&PidStore<'m, M>> {
        self.manufacturer_stores.get(&manufacturer_id)
    }

    /// Manufacturer ids with a store, ascending.
    pub fn manufacturer_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.manufacturer_stores.keys().copied()
    }

    /// Number of PIDs across the ESTA store and all manufacturer stores.
    pub fn total_pid_count(&self) -> usize {
        self.esta_store.pid_count()
            + self
                .manufacturer_stores
                .values()
                .map(PidStore::pid_count)
                .sum::<usize>()
    }

    /// Look up an ESTA parameter by name.
    pub fn get_descriptor_by_name(&self, pid_name: &str) -> Option<&PidDescriptor<'m, M>> {
        self.esta_store.lookup_name(pid_name)
    }

    /// Look up a parameter by name in the manufacturer's store, then the
    /// ESTA store.
    pub fn get_descriptor_by_name_for(
        &self,
        pid_name: &str,
        manufacturer_id: u16,
    ) -> Option<&PidDescriptor<'m, M>> {
        self.manufacturer_store(manufacturer_id)
            .and_then(|store| store.lookup_name(pid_name))
            .or_else(|| self.get_descriptor_by_name(pid_name))
    }

    /// Look up an ESTA parameter by PID value.
    pub fn get_descriptor_by_value(&self, pid_value: u16) -> Option<&PidDescriptor<'m, M>> {
        self.esta_store.lookup_value(pid_value)
    }

    /// Look up a parameter by PID value in the manufacturer's store, then the
    /// ESTA store.
    pub fn get_descriptor_by_value_for(
        &self,
        pid_value: u16,
        manufacturer_id: u16,
    ) -> Option<&PidDescriptor<'m, M>> {
        self.manufacturer_store(manufacturer_id)
            .and_then(|store| store.lookup_value(pid_value))
            .or_else(|| self.get_descriptor_by_value(pid_value))
    }
}

impl<M> fmt::Debug for RootPidStore<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootPidStore")
            .field("version", &self.version)
            .field("esta_pids", &self.esta_store.pid_count())
            .field(
                "manufacturers",
                &self.manufacturer_stores.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
