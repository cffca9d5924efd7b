// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! World configuration

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Initial capacities used when a world is created
///
/// Every field is optional when deserializing; missing fields keep their
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Rows reserved in the entity table
    pub entity_capacity: usize,
    /// Archetype slots reserved in the arena and lookup map
    pub archetype_capacity: usize,
    /// Rows reserved by each newly created archetype
    pub rows_per_archetype: usize,
    /// Slots reserved in the free-index queue
    pub free_list_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 128,
            archetype_capacity: 64,
            rows_per_archetype: 128,
            free_list_capacity: 32,
        }
    }
}

impl WorldConfig {
    /// Parse a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    pub fn with_rows_per_archetype(mut self, rows: usize) -> Self {
        self.rows_per_archetype = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcsError;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WorldConfig::from_json(r#"{ "entity_capacity": 4096 }"#).unwrap();
        assert_eq!(config.entity_capacity, 4096);
        assert_eq!(config.rows_per_archetype, 128);
        assert_eq!(config.free_list_capacity, 32);
    }

    #[test]
    fn test_json_round_trip() {
        let config = WorldConfig::default().with_rows_per_archetype(8);
        let json = config.to_json().unwrap();
        assert_eq!(WorldConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        let err = WorldConfig::from_json("{ entity_capacity: }").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }
}
