// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time network assessment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of link the device is using.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Wifi,
    Cellular,
    Ethernet,
    #[default]
    Unknown,
}

impl TransportType {
    /// Returns the string representation used in config and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Wifi => "wifi",
            TransportType::Cellular => "cellular",
            TransportType::Ethernet => "ethernet",
            TransportType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wifi" => Ok(TransportType::Wifi),
            "cellular" => Ok(TransportType::Cellular),
            "ethernet" => Ok(TransportType::Ethernet),
            "unknown" => Ok(TransportType::Unknown),
            _ => Err(Error::InvalidTransport(s.to_string())),
        }
    }
}

/// Network state as reported by the platform.
///
/// `is_internet_reachable` is tri-state: `None` means the platform has not
/// determined whether traffic reaches the wide network yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityStatus {
    pub is_connected: bool,
    pub is_internet_reachable: Option<bool>,
    pub transport_type: TransportType,
}

impl ConnectivityStatus {
    /// A reachable status on the given transport.
    pub fn online(transport_type: TransportType) -> Self {
        ConnectivityStatus {
            is_connected: true,
            is_internet_reachable: Some(true),
            transport_type,
        }
    }

    /// The conservative status used when the platform cannot be queried.
    pub fn offline() -> Self {
        ConnectivityStatus {
            is_connected: false,
            is_internet_reachable: Some(false),
            transport_type: TransportType::Unknown,
        }
    }

    /// Link is up but wide-network reachability is not known yet.
    pub fn link_only(transport_type: TransportType) -> Self {
        ConnectivityStatus {
            is_connected: true,
            is_internet_reachable: None,
            transport_type,
        }
    }

    /// True only when the link is up and traffic is known to reach the network.
    pub fn is_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable == Some(true)
    }
}

impl Default for ConnectivityStatus {
    fn default() -> Self {
        Self::offline()
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
