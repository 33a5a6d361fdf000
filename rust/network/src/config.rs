// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network configuration, from defaults, environment variables or JSON.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunables of a [`BusNetwork`](crate::BusNetwork).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Distance under which two segment endpoints form one road connection.
    pub connection_tolerance: f64,
    /// Bind unbound halts to the nearest segment when segments are added.
    pub auto_connect_halts: bool,
    /// Try to merge a new cluster into a cluster it touches mid-way.
    pub auto_loop: bool,
    /// Valid stops a network needs to be valid.
    pub min_valid_stops: usize,
    /// Valid halts an itinerary needs to be valid.
    pub min_valid_halts: usize,
    /// Prefix of generated itinerary names.
    pub itinerary_name_prefix: String,
    /// Prefix of generated halt names.
    pub halt_name_prefix: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connection_tolerance: busnet_road::DEFAULT_CONNECTION_TOLERANCE,
            auto_connect_halts: true,
            auto_loop: false,
            min_valid_stops: 2,
            min_valid_halts: 2,
            itinerary_name_prefix: "itinerary".into(),
            halt_name_prefix: "halt".into(),
        }
    }
}

impl NetworkConfig {
    /// Load configuration from `BUSNET_*` environment variables.
    ///
    /// Missing or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            connection_tolerance: env_or("BUSNET_CONNECTION_TOLERANCE", defaults.connection_tolerance),
            auto_connect_halts: env_or("BUSNET_AUTO_CONNECT_HALTS", defaults.auto_connect_halts),
            auto_loop: env_or("BUSNET_AUTO_LOOP", defaults.auto_loop),
            min_valid_stops: env_or("BUSNET_MIN_VALID_STOPS", defaults.min_valid_stops),
            min_valid_halts: env_or("BUSNET_MIN_VALID_HALTS", defaults.min_valid_halts),
            itinerary_name_prefix: std::env::var("BUSNET_ITINERARY_NAME_PREFIX")
                .unwrap_or(defaults.itinerary_name_prefix),
            halt_name_prefix: std::env::var("BUSNET_HALT_NAME_PREFIX")
                .unwrap_or(defaults.halt_name_prefix),
        }
    }

    /// Parse a JSON document; absent fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
