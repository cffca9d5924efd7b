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

//! Cached archetype queries
//!
//! An [`Entities`] query holds a fixed include set and exclude set and
//! remembers which archetypes matched them. The list is rebuilt only when
//! the world's structural version moves, so iterating a query every frame
//! costs one comparison unless an archetype was created in the meantime.
//!
//! ```
//! use archetype_store::prelude::*;
//!
//! #[derive(Default)]
//! struct Position(f32);
//! #[derive(Default)]
//! struct Frozen;
//!
//! let mut world = World::new();
//! world.spawn((Position(1.0),));
//! world.spawn((Position(2.0), Frozen));
//!
//! let mut moving = Entities::builder().with::<Position>().without::<Frozen>().build();
//! moving.for_each::<Position>(&mut world, |_, position| position.0 += 1.0);
//! assert_eq!(moving.count(&world, false), 1);
//! ```

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::{Archetype, ArchetypeId};
use crate::component::{component_id, Component, ComponentId, ComponentIds, ComponentSet};
use crate::entity::Entity;
use crate::mask::ComponentMask;
use crate::world::World;

/// Cached query over every archetype that has all of `include` and none
/// of `exclude`
#[derive(Debug, Clone)]
pub struct Entities {
    include: ComponentMask,
    exclude: ComponentMask,

    /// Matching archetypes in ascending id order
    matched: Vec<ArchetypeId>,

    /// World id and version the list was built against
    seen: Option<(u64, u32)>,

    refreshes: usize,
}

impl Entities {
    pub fn new(include: &[ComponentId], exclude: &[ComponentId]) -> Self {
        Self {
            include: include.iter().copied().collect(),
            exclude: exclude.iter().copied().collect(),
            matched: Vec::new(),
            seen: None,
            refreshes: 0,
        }
    }

    /// Query for entities with every type in `I` and none in `E`
    pub fn of<I: ComponentSet, E: ComponentSet>() -> Self {
        Self::new(&I::component_ids(), &E::component_ids())
    }

    pub fn builder() -> EntitiesBuilder {
        EntitiesBuilder::default()
    }

    /// Add more excluded ids after construction
    pub fn exclude_ids(mut self, ids: &[ComponentId]) -> Self {
        self.exclude = self.exclude.ids().chain(ids.iter().copied()).collect();
        self.seen = None;
        self
    }

    pub fn include_mask(&self) -> &ComponentMask {
        &self.include
    }

    pub fn exclude_mask(&self) -> &ComponentMask {
        &self.exclude
    }

    /// Check if an archetype mask satisfies this query
    #[inline]
    pub fn matches(&self, mask: &ComponentMask) -> bool {
        mask.includes(&self.include) && mask.excludes(&self.exclude)
    }

    /// Matching archetype ids, rebuilt first if the world changed shape
    pub fn prepare_collections(&mut self, world: &World) -> &[ArchetypeId] {
        let stamp = (world.id(), world.version());
        if self.seen != Some(stamp) {
            self.refresh(world);
            self.seen = Some(stamp);
        }
        &self.matched
    }

    fn refresh(&mut self, world: &World) {
        #[cfg(feature = "profiling")]
        let span = info_span!(
            "entities.refresh",
            archetypes = world.archetype_count(),
            version = world.version()
        );
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let (include, exclude) = (&self.include, &self.exclude);
        self.matched.clear();
        self.matched.extend(
            world
                .archetypes()
                .iter()
                .filter(|archetype| {
                    archetype.mask().includes(include) && archetype.mask().excludes(exclude)
                })
                .map(Archetype::id),
        );
        self.refreshes += 1;

        #[cfg(feature = "profiling")]
        tracing::debug!(matched = self.matched.len(), "query refreshed");
    }

    /// Number of times the matched list has been rebuilt
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    /// Iterate matching archetypes
    pub fn groups<'a>(&'a mut self, world: &'a World) -> impl Iterator<Item = &'a Archetype> + 'a {
        let archetypes = world.archetypes();
        self.prepare_collections(world)
            .iter()
            .map(move |id| &archetypes[id.index()])
    }

    /// Iterate matching archetypes mutably
    pub fn groups_mut<'a>(
        &'a mut self,
        world: &'a mut World,
    ) -> impl Iterator<Item = &'a mut Archetype> + 'a {
        let mut wanted = self.prepare_collections(world).iter().peekable();
        // Both sequences ascend by id, so a single merge pass pairs them up
        world
            .archetypes_mut()
            .iter_mut()
            .filter(move |archetype| match wanted.peek() {
                Some(&&id) if id == archetype.id() => {
                    wanted.next();
                    true
                }
                _ => false,
            })
    }

    /// Number of matching entities
    pub fn count(&mut self, world: &World, include_disabled: bool) -> usize {
        self.groups(world)
            .map(|archetype| archetype.count(include_disabled))
            .sum()
    }

    /// Visit each enabled matching entity with its `T` value
    ///
    /// # Panics
    /// Panics if a matching archetype has no `T`; include `T` in the query.
    pub fn for_each<T: Component>(
        &mut self,
        world: &mut World,
        mut func: impl FnMut(Entity, &mut T),
    ) {
        for archetype in self.groups_mut(world) {
            archetype.for_each_mut::<T>(false, &mut func);
        }
    }
}

/// Builder for [`Entities`]
#[derive(Debug, Default, Clone)]
pub struct EntitiesBuilder {
    include: ComponentIds,
    exclude: ComponentIds,
}

impl EntitiesBuilder {
    pub fn with<T: Component>(mut self) -> Self {
        self.include.push(component_id::<T>());
        self
    }

    pub fn without<T: Component>(mut self) -> Self {
        self.exclude.push(component_id::<T>());
        self
    }

    pub fn with_id(mut self, component: ComponentId) -> Self {
        self.include.push(component);
        self
    }

    pub fn without_id(mut self, component: ComponentId) -> Self {
        self.exclude.push(component);
        self
    }

    pub fn build(self) -> Entities {
        Entities::new(&self.include, &self.exclude)
    }
}
