// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::descriptor::PidDescriptor;
use crate::error::PidStoreError;

// ---------------------------------------------------------------------------
// PidStore
// ---------------------------------------------------------------------------

/// The PID descriptors for a single scope: ESTA, or one manufacturer.
///
/// Descriptors are owned by the store in insertion order and indexed by
/// value and by name. Both keys are unique.
pub struct PidStore<'m, M> {
    pids: Vec<PidDescriptor<'m, M>>,
    by_value: BTreeMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl<'m, M> PidStore<'m, M> {
    /// Build a store from a list of descriptors.
    ///
    /// Fails on the first descriptor whose value or name was already seen.
    pub fn new(pids: Vec<PidDescriptor<'m, M>>) -> Result<Self, PidStoreError> {
        let mut by_value = BTreeMap::new();
        let mut by_name = HashMap::with_capacity(pids.len());

        for (index, pid) in pids.iter().enumerate() {
            if by_value.insert(pid.value(), index).is_some() {
                return Err(PidStoreError::DuplicateValue { value: pid.value() });
            }
            if by_name.insert(pid.name().to_string(), index).is_some() {
                return Err(PidStoreError::DuplicateName {
                    name: pid.name().to_string(),
                });
            }
        }

        Ok(PidStore {
            pids,
            by_value,
            by_name,
        })
    }

    /// Number of PIDs in this store.
    pub fn pid_count(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// All descriptors, in the order they were supplied.
    pub fn all_pids(&self) -> impl Iterator<Item = &PidDescriptor<'m, M>> + '_ {
        self.pids.iter()
    }

    /// All descriptors sorted with [`PidDescriptor::order_by_name`].
    pub fn sorted_by_name(&self) -> Vec<&PidDescriptor<'m, M>> {
        let mut pids: Vec<_> = self.pids.iter().collect();
        pids.sort_by(|a, b| PidDescriptor::order_by_name(*a, *b));
        pids
    }

    /// Look up a descriptor by PID value.
    pub fn lookup_value(&self, value: u16) -> Option<&PidDescriptor<'m, M>> {
        self.by_value.get(&value).map(|&i| &self.pids[i])
    }

    /// Look up a descriptor by PID name.
    pub fn lookup_name(&self, name: &str) -> Option<&PidDescriptor<'m, M>> {
        self.by_name.get(name).map(|&i| &self.pids[i])
    }
}

impl<M> fmt::Debug for PidStore<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidStore")
            .field("pids", &self.pids)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
