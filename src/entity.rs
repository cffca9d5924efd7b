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

//! Entity handles and location metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeId;

/// Generational entity handle
///
/// A handle is valid while the world's generation for `index` still
/// matches the handle's generation. The default handle is
/// [`Entity::DANGLING`], which no world ever hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Placeholder handle; its index is never allocated
    pub const DANGLING: Entity = Entity {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot in the world's row table
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single integer (generation in the high half)
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::DANGLING
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Entity location in archetype (archetype, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub archetype: ArchetypeId,
    pub row: usize,
}

/// Row of the world's entity table
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EntityRecord {
    pub archetype: ArchetypeId,
    pub row: usize,
    pub generation: u32,
    /// False while the index sits in the free queue
    pub alive: bool,
}

impl EntityRecord {
    #[inline]
    pub fn location(&self) -> EntityLocation {
        EntityLocation {
            archetype: self.archetype,
            row: self.row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_round_trip() {
        let entity = Entity::new(5, 3);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
        assert_eq!(entity.to_string(), "Entity(5v3)");
    }

    #[test]
    fn test_default_is_dangling() {
        assert_eq!(Entity::default(), Entity::DANGLING);
        assert_ne!(Entity::default(), Entity::new(0, 0));
    }

    #[test]
    fn test_serde() {
        let entity = Entity::new(12, 1);
        let json = serde_json::to_string(&entity).unwrap();
        assert_eq!(json, r#"{"index":12,"generation":1}"#);
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }
}
