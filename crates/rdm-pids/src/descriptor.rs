// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-PID descriptor and sub-device addressing rules.
//!
//! A [`PidDescriptor`] ties a parameter name and value to the four message
//! formats (GET/SET request and response) and to the sub-device ranges that
//! are legal for each command class.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sub-device number of the root device (E1.20 Sec.6.2.3).
pub const ROOT_RDM_DEVICE: u16 = 0;

/// Highest addressable sub-device number (E1.20 Sec.6.2.3).
pub const MAX_SUBDEVICE_NUMBER: u16 = 512;

/// Broadcast sub-device address, "all sub-devices" (E1.20 Sec.6.2.3).
pub const ALL_RDM_SUBDEVICES: u16 = 0xFFFF;

// ---------------------------------------------------------------------------
// SubDeviceRange
// ---------------------------------------------------------------------------

/// Which sub-device addresses a GET or SET for a PID may be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubDeviceRange {
    /// Root device only (0).
    #[serde(rename = "ROOT_DEVICE")]
    RootDevice,
    /// 0 - 512 or `ALL_RDM_SUBDEVICES`.
    #[serde(rename = "ROOT_OR_ALL_SUBDEVICE")]
    AnySubDevice,
    /// 0 - 512.
    #[serde(rename = "ROOT_OR_SUBDEVICE")]
    NonBroadcastSubDevice,
    /// 1 - 512.
    #[serde(rename = "ONLY_SUBDEVICES")]
    SpecificSubDevice,
}

impl SubDeviceRange {
    /// Returns true if `sub_device` is a legal destination under this rule.
    pub fn contains(self, sub_device: u16) -> bool {
        match self {
            SubDeviceRange::RootDevice => sub_device == ROOT_RDM_DEVICE,
            SubDeviceRange::AnySubDevice => {
                sub_device <= MAX_SUBDEVICE_NUMBER || sub_device == ALL_RDM_SUBDEVICES
            }
            SubDeviceRange::NonBroadcastSubDevice => sub_device <= MAX_SUBDEVICE_NUMBER,
            SubDeviceRange::SpecificSubDevice => {
                (1..=MAX_SUBDEVICE_NUMBER).contains(&sub_device)
            }
        }
    }

    /// Token used in PID data files for this rule.
    pub fn as_str(self) -> &'static str {
        match self {
            SubDeviceRange::RootDevice => "ROOT_DEVICE",
            SubDeviceRange::AnySubDevice => "ROOT_OR_ALL_SUBDEVICE",
            SubDeviceRange::NonBroadcastSubDevice => "ROOT_OR_SUBDEVICE",
            SubDeviceRange::SpecificSubDevice => "ONLY_SUBDEVICES",
        }
    }
}

impl fmt::Display for SubDeviceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a sub-device range token is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sub-device range: {0}")]
pub struct UnknownSubDeviceRange(pub String);

impl FromStr for SubDeviceRange {
    type Err = UnknownSubDeviceRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROOT_DEVICE" => Ok(SubDeviceRange::RootDevice),
            "ROOT_OR_ALL_SUBDEVICE" => Ok(SubDeviceRange::AnySubDevice),
            "ROOT_OR_SUBDEVICE" => Ok(SubDeviceRange::NonBroadcastSubDevice),
            "ONLY_SUBDEVICES" => Ok(SubDeviceRange::SpecificSubDevice),
            other => Err(UnknownSubDeviceRange(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PidDescriptor
// ---------------------------------------------------------------------------

/// The GET/SET request and response formats for a single PID.
///
/// `M` is the message-format type owned by the caller's messaging layer. The
/// descriptor only borrows format handles for `'m` and never looks inside
/// them.
pub struct PidDescriptor<'m, M> {
    name: String,
    value: u16,
    get_request: Option<&'m M>,
    get_response: Option<&'m M>,
    set_request: Option<&'m M>,
    set_response: Option<&'m M>,
    get_sub_device_range: SubDeviceRange,
    set_sub_device_range: SubDeviceRange,
}

impl<'m, M> PidDescriptor<'m, M> {
    /// Start building a descriptor for `name` / `value`.
    pub fn builder(name: impl Into<String>, value: u16) -> PidDescriptorBuilder<'m, M> {
        PidDescriptorBuilder::new(name, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn get_request(&self) -> Option<&'m M> {
        self.get_request
    }

    pub fn get_response(&self) -> Option<&'m M> {
        self.get_response
    }

    pub fn set_request(&self) -> Option<&'m M> {
        self.set_request
    }

    pub fn set_response(&self) -> Option<&'m M> {
        self.set_response
    }

    pub fn get_sub_device_range(&self) -> SubDeviceRange {
        self.get_sub_device_range
    }

    pub fn set_sub_device_range(&self) -> SubDeviceRange {
        self.set_sub_device_range
    }

    /// True if this PID defines a GET request format.
    pub fn supports_get(&self) -> bool {
        self.get_request.is_some()
    }

    /// True if this PID defines a SET request format.
    pub fn supports_set(&self) -> bool {
        self.set_request.is_some()
    }

    /// Check whether a GET may be addressed to `sub_device`.
    pub fn is_get_valid(&self, sub_device: u16) -> bool {
        Self::request_valid(sub_device, self.get_sub_device_range)
    }

    /// Check whether a SET may be addressed to `sub_device`.
    pub fn is_set_valid(&self, sub_device: u16) -> bool {
        Self::request_valid(sub_device, self.set_sub_device_range)
    }

    /// Byte-wise, case-sensitive ordering by PID name.
    pub fn order_by_name(a: &Self, b: &Self) -> Ordering {
        a.name.as_bytes().cmp(b.name.as_bytes())
    }

    fn request_valid(sub_device: u16, range: SubDeviceRange) -> bool {
        range.contains(sub_device)
    }
}

// Manual impls: the handles are shared references, so neither needs `M: Clone`.
impl<M> Clone for PidDescriptor<'_, M> {
    fn clone(&self) -> Self {
        PidDescriptor {
            name: self.name.clone(),
            value: self.value,
            get_request: self.get_request,
            get_response: self.get_response,
            set_request: self.set_request,
            set_response: self.set_response,
            get_sub_device_range: self.get_sub_device_range,
            set_sub_device_range: self.set_sub_device_range,
        }
    }
}

impl<M> fmt::Debug for PidDescriptor<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidDescriptor")
            .field("name", &self.name)
            .field("value", &format_args!("0x{:04x}", self.value))
            .field("get_request", &self.get_request.is_some())
            .field("get_response", &self.get_response.is_some())
            .field("set_request", &self.set_request.is_some())
            .field("set_response", &self.set_response.is_some())
            .field("get_sub_device_range", &self.get_sub_device_range)
            .field("set_sub_device_range", &self.set_sub_device_range)
            .finish()
    }
}

impl<M> fmt::Display for PidDescriptor<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.name, self.value)
    }
}

// ---------------------------------------------------------------------------
// PidDescriptorBuilder
// ---------------------------------------------------------------------------

/// Builder for [`PidDescriptor`].
///
/// Both sub-device ranges default to [`SubDeviceRange::RootDevice`].
pub struct PidDescriptorBuilder<'m, M> {
    name: String,
    value: u16,
    get_request: Option<&'m M>,
    get_response: Option<&'m M>,
    set_request: Option<&'m M>,
    set_response: Option<&'m M>,
    get_sub_device_range: SubDeviceRange,
    set_sub_device_range: SubDeviceRange,
}

impl<'m, M> PidDescriptorBuilder<'m, M> {
    pub fn new(name: impl Into<String>, value: u16) -> Self {
        Self {
            name: name.into(),
            value,
            get_request: None,
            get_response: None,
            set_request: None,
            set_response: None,
            get_sub_device_range: SubDeviceRange::RootDevice,
            set_sub_device_range: SubDeviceRange::RootDevice,
        }
    }

    /// Set the GET request and response formats.
    pub fn get(mut self, request: Option<&'m M>, response: Option<&'m M>) -> Self {
        self.get_request = request;
        self.get_response = response;
        self
    }

    /// Set the SET request and response formats.
    pub fn set(mut self, request: Option<&'m M>, response: Option<&'m M>) -> Self {
        self.set_request = request;
        self.set_response = response;
        self
    }

    pub fn get_sub_device_range(mut self, range: SubDeviceRange) -> Self {
        self.get_sub_device_range = range;
        self
    }

    pub fn set_sub_device_range(mut self, range: SubDeviceRange) -> Self {
        self.set_sub_device_range = range;
        self
    }

    pub fn build(self) -> PidDescriptor<'m, M> {
        PidDescriptor {
            name: self.name,
            value: self.value,
            get_request: self.get_request,
            get_response: self.get_response,
            set_request: self.set_request,
            set_response: self.set_response,
            get_sub_device_range: self.get_sub_device_range,
            set_sub_device_range: self.set_sub_device_range,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
