//! Discoverable device descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A device advertised by the transport during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Advertised device name.
    pub name: String,
    /// Transport-specific address used to connect.
    pub address: String,
}

impl DeviceInfo {
    /// Create a new device descriptor.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        DeviceInfo { name: name.into(), address: address.into() }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}
