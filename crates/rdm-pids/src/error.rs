// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for store construction and loading.
//!
//! Lookup misses are `None` and illegal sub-devices are `false`; only
//! construction and loading can fail.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a [`PidStore`](crate::PidStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PidStoreError {
    #[error("duplicate PID value 0x{value:04x}")]
    DuplicateValue { value: u16 },

    #[error("duplicate PID name {name}")]
    DuplicateName { name: String },
}

/// Errors raised while loading a [`RootPidStore`](crate::RootPidStore).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("ESTA store: {0}")]
    Store(#[from] PidStoreError),

    #[error("manufacturer 0x{manufacturer_id:04x} store: {source}")]
    ManufacturerStore {
        manufacturer_id: u16,
        #[source]
        source: PidStoreError,
    },

    #[error("manufacturer 0x{0:04x} listed twice")]
    DuplicateManufacturer(u16),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("refusing to replace version {current} with older version {offered}")]
    StaleVersion { current: u64, offered: u64 },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}
