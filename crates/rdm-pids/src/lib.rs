// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RDM parameter (PID) descriptor store.
//!
//! Holds the ESTA-defined parameters (E1.20, E1.37-1, E1.37-2, ...) together
//! with manufacturer-specific parameters, and answers two questions for the
//! RDM encode/decode layer:
//!
//! - does a PID with this value or name exist, and for which manufacturer?
//! - may a GET or SET for this PID be sent to this sub-device?
//!
//! # Architecture
//!
//! ```text
//!   PID data (caller-parsed)
//!        |
//!        v
//!   loader (merge, overrides, validation)
//!        |
//!        v
//!   RootPidStore ---- esta_store: PidStore
//!        |       \--- manufacturer_stores: u16 -> PidStore
//!        v
//!   SharedPidStore (atomic swap on reload)
//! ```
//!
//! # Example
//!
//! ```
//! use rdm_pids::{load, PidDescriptor, PidStoreDefinition, SubDeviceRange};
//!
//! struct Format;
//! let device_info = Format;
//!
//! let definition = PidStoreDefinition {
//!     version: 1,
//!     esta_pids: vec![PidDescriptor::builder("DEVICE_INFO", 0x0060)
//!         .get(Some(&device_info), Some(&device_info))
//!         .get_sub_device_range(SubDeviceRange::AnySubDevice)
//!         .build()],
//!     manufacturers: vec![],
//! };
//!
//! let root = load(&definition, true).unwrap();
//! let pid = root.get_descriptor_by_name("DEVICE_INFO").unwrap();
//! assert!(pid.is_get_valid(0xFFFF));
//! assert!(!pid.is_set_valid(1));
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod root;
pub mod shared;
pub mod store;

pub use config::{data_location, LoaderConfig, LoaderConfigBuilder, DEFAULT_DATA_LOCATION};
pub use descriptor::{
    PidDescriptor, PidDescriptorBuilder, SubDeviceRange, UnknownSubDeviceRange,
    ALL_RDM_SUBDEVICES, MAX_SUBDEVICE_NUMBER, ROOT_RDM_DEVICE,
};
pub use error::{LoadError, PidStoreError};
pub use loader::{
    load, load_from_directory, load_from_file, load_with_config, validate_definition,
    FileSource, ManufacturerDefinition, PidDataSource, PidFileParser, PidStoreDefinition,
    ESTA_MANUFACTURER_ID, MANUFACTURER_PID_RANGE,
};
pub use root::RootPidStore;
pub use shared::SharedPidStore;
pub use store::PidStore;
