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

//! World: central entity and archetype storage

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::{Archetype, ArchetypeId};
use crate::buffer::DenseVec;
use crate::column::ComponentRef;
use crate::component::{component_id, Bundle, Component, ComponentId, ComponentIds, ComponentSet};
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityLocation, EntityRecord};
use crate::error::{EcsError, Result};
use crate::mask::ComponentMask;

fn next_world_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Central entity registry
///
/// Owns the entity table, the free-index queue and every archetype.
/// Archetypes are created on demand and never destroyed; each creation
/// bumps [`World::version`] so cached queries know to refresh.
pub struct World {
    id: u64,

    /// Entity rows indexed by `Entity::index`
    entities: DenseVec<EntityRecord>,

    /// Destroyed indices waiting for reuse
    free_entities: VecDeque<u32>,

    /// All archetypes in the world, `ArchetypeId` indexes this
    archetypes: Vec<Archetype>,

    /// Maps component masks to archetype ids
    archetype_index: AHashMap<ComponentMask, ArchetypeId>,

    /// Structural version, wraps on overflow
    version: u32,

    /// Rows reserved by new archetypes
    rows_per_archetype: usize,

    live_entities: usize,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        let mut world = Self {
            id: next_world_id(),
            entities: DenseVec::with_capacity(config.entity_capacity),
            free_entities: VecDeque::with_capacity(config.free_list_capacity),
            archetypes: Vec::with_capacity(config.archetype_capacity),
            archetype_index: AHashMap::with_capacity(config.archetype_capacity),
            version: 0,
            rows_per_archetype: config.rows_per_archetype,
            live_entities: 0,
        };

        // The empty archetype is always at index 0
        world.archetype_for_mask(ComponentMask::empty());
        world
    }

    /// Process-unique id of this world
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Structural version; changes whenever an archetype is created
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Create an entity in the archetype for exactly `components`
    ///
    /// Every component starts out as its type's default value.
    pub fn create_entity(&mut self, components: &[ComponentId]) -> Entity {
        #[cfg(feature = "profiling")]
        let span = info_span!(
            "world.create_entity",
            components = components.len(),
            archetype_count = self.archetypes.len()
        );
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let mask = ComponentMask::from_ids(components);
        let archetype = self.archetype_for_mask(&mask);
        self.create_in(archetype)
    }

    /// Create an entity with the default values of every type in `S`
    pub fn create<S: ComponentSet>(&mut self) -> Entity {
        self.create_entity(&S::component_ids())
    }

    /// Start building an entity type by type
    pub fn build_entity(&mut self) -> EntityBuilder<'_> {
        EntityBuilder {
            world: self,
            components: ComponentIds::new(),
        }
    }

    /// Create an entity holding the values in `bundle`
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.create::<B>();
        let record = self.entities[entity.index() as usize];
        bundle.write_into(&mut self.archetypes[record.archetype.index()], record.row);
        entity
    }

    /// Spawn multiple entities with the same component types in a batch
    pub fn spawn_batch<B, I>(&mut self, bundles: I) -> Vec<Entity>
    where
        B: Bundle,
        I: IntoIterator<Item = B>,
    {
        let bundles = bundles.into_iter();
        let (count, _) = bundles.size_hint();

        let mask = ComponentMask::from_set::<B>();
        let archetype = self.archetype_for_mask(&mask);
        self.archetypes[archetype.index()].reserve_rows(count);
        self.entities.reserve(count.saturating_sub(self.free_entities.len()));

        let mut spawned = Vec::with_capacity(count);
        for bundle in bundles {
            let entity = self.create_in(archetype);
            let row = self.entities[entity.index() as usize].row;
            bundle.write_into(&mut self.archetypes[archetype.index()], row);
            spawned.push(entity);
        }
        spawned
    }

    fn create_in(&mut self, archetype: ArchetypeId) -> Entity {
        let index = match self.free_entities.pop_front() {
            Some(index) => index,
            None => {
                // u32::MAX is reserved for Entity::DANGLING
                let index = u32::try_from(self.entities.len())
                    .ok()
                    .filter(|&index| index != Entity::DANGLING.index())
                    .unwrap_or_else(|| panic!("Entity index exhaustion"));
                self.entities.push(EntityRecord::default());
                index
            }
        };

        let generation = self.entities[index as usize].generation;
        let entity = Entity::new(index, generation);
        let row = self.archetypes[archetype.index()].add_entity(entity, true);

        let record = &mut self.entities[index as usize];
        record.archetype = archetype;
        record.row = row;
        record.alive = true;

        self.live_entities += 1;
        entity
    }

    /// Destroy an entity and invalidate every copy of its handle
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        let record = self.record(entity)?;

        #[cfg(feature = "profiling")]
        let span = info_span!("world.destroy_entity", entity = %entity);
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let archetype = &mut self.archetypes[record.archetype.index()];
        if let Some(swapped) = archetype.remove_entity(record.row) {
            self.entities[swapped.index() as usize].row = record.row;
        }

        let slot = &mut self.entities[entity.index() as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.alive = false;
        slot.archetype = ArchetypeId::EMPTY;
        slot.row = 0;

        self.free_entities.push_back(entity.index());
        self.live_entities -= 1;
        Ok(())
    }

    /// Check if an entity is alive
    ///
    /// Returns true if the handle's generation matches the live row.
    pub fn exists(&self, entity: Entity) -> bool {
        self.record(entity).is_ok()
    }

    /// Set a component, moving the entity to a new archetype if it lacks `T`
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<()> {
        let record = self.record(entity)?;
        let component = component_id::<T>();

        let source = &mut self.archetypes[record.archetype.index()];
        if source.contains(component) {
            source.components_mut::<T>()[record.row] = value;
            return Ok(());
        }

        let destination = {
            let mask = source.mask().include(component);
            self.archetype_for_mask(&mask)
        };
        let row = self.move_entity(entity, record, destination);
        self.archetypes[destination.index()].components_mut::<T>()[row] = value;
        Ok(())
    }

    /// Remove a component, moving the entity to a new archetype
    ///
    /// Returns `false` and changes nothing if the entity has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<bool> {
        let record = self.record(entity)?;
        let component = component_id::<T>();

        let source = &self.archetypes[record.archetype.index()];
        if !source.contains(component) {
            return Ok(false);
        }

        let destination = {
            let mask = source.mask().exclude(component);
            self.archetype_for_mask(&mask)
        };
        self.move_entity(entity, record, destination);
        Ok(true)
    }

    /// Get immutable reference to a component on an entity
    ///
    /// # Panics
    /// Panics if the entity has no `T`; check [`World::has_component`]
    /// first or use [`World::try_get_component`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        match self.try_get_component::<T>(entity)? {
            Some(value) => Ok(value),
            None => missing_component::<T>(entity),
        }
    }

    /// Get mutable reference to a component on an entity
    ///
    /// # Panics
    /// Panics if the entity has no `T`.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        match self.try_get_component_mut::<T>(entity)? {
            Some(value) => Ok(value),
            None => missing_component::<T>(entity),
        }
    }

    /// Like [`World::get_component`], but `None` when the entity has no `T`
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Result<Option<&T>> {
        let record = self.record(entity)?;
        Ok(self.archetypes[record.archetype.index()].get::<T>(record.row))
    }

    pub fn try_get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<Option<&mut T>> {
        let record = self.record(entity)?;
        Ok(self.archetypes[record.archetype.index()].get_mut::<T>(record.row))
    }

    /// Mutable handle to the `T` value of an entity
    ///
    /// # Panics
    /// Panics if the entity has no `T`.
    pub fn component_ref<T: Component>(&mut self, entity: Entity) -> Result<ComponentRef<'_, T>> {
        let record = self.record(entity)?;
        Ok(self.archetypes[record.archetype.index()].component_ref::<T>(record.row))
    }

    /// Check if entity has a specific component
    pub fn has_component<T: Component>(&self, entity: Entity) -> Result<bool> {
        let record = self.record(entity)?;
        Ok(self.archetypes[record.archetype.index()].contains(component_id::<T>()))
    }

    /// Enable or disable an entity without moving it
    pub fn set_entity_enabled(&mut self, entity: Entity, enabled: bool) -> Result<()> {
        let record = self.record(entity)?;
        self.archetypes[record.archetype.index()].set_enabled(record.row, enabled);
        Ok(())
    }

    pub fn is_entity_enabled(&self, entity: Entity) -> Result<bool> {
        let record = self.record(entity)?;
        Ok(self.archetypes[record.archetype.index()].is_enabled(record.row))
    }

    /// Get entity location
    pub fn location(&self, entity: Entity) -> Result<EntityLocation> {
        Ok(self.record(entity)?.location())
    }

    /// Archetype currently holding `entity`
    pub fn archetype_of(&self, entity: Entity) -> Result<&Archetype> {
        let record = self.record(entity)?;
        Ok(&self.archetypes[record.archetype.index()])
    }

    /// Get archetype by ID
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index())
    }

    /// Get archetype mutably
    pub fn archetype_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id.index())
    }

    /// Get all archetypes
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub(crate) fn archetypes_mut(&mut self) -> &mut [Archetype] {
        &mut self.archetypes
    }

    /// Archetype for exactly the components in `mask`, if one exists
    pub fn find_archetype(&self, mask: &ComponentMask) -> Option<ArchetypeId> {
        self.archetype_index.get(mask).copied()
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.live_entities
    }

    /// Number of indices waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free_entities.len()
    }

    /// Destroy every entity; archetypes are kept
    pub fn clear(&mut self) {
        for (index, record) in self.entities.iter_mut().enumerate() {
            if record.alive {
                record.generation = record.generation.wrapping_add(1);
                record.alive = false;
                record.archetype = ArchetypeId::EMPTY;
                record.row = 0;
                self.free_entities.push_back(index as u32);
            }
        }
        for archetype in &mut self.archetypes {
            archetype.clear();
        }
        self.live_entities = 0;
    }

    fn record(&self, entity: Entity) -> Result<EntityRecord> {
        match self.entities.get(entity.index() as usize) {
            Some(record) if record.alive && record.generation == entity.generation() => Ok(*record),
            _ => Err(EcsError::EntityNotFound),
        }
    }

    /// Get or create the archetype for `mask`
    fn archetype_for_mask(&mut self, mask: &ComponentMask) -> ArchetypeId {
        if let Some(&id) = self.archetype_index.get(mask) {
            return id;
        }

        // The archetype keeps its own copy; working masks go back to the pool
        let id = ArchetypeId::new(self.archetypes.len());
        self.archetypes
            .push(Archetype::new(id, mask.clone(), self.rows_per_archetype));
        self.archetype_index.insert(mask.clone(), id);
        self.version = self.version.wrapping_add(1);

        #[cfg(feature = "profiling")]
        tracing::debug!(
            archetype = id.index(),
            components = ?mask,
            version = self.version,
            "archetype created"
        );

        id
    }

    /// Internal: Move entity from one archetype to another
    ///
    /// The entity is added to `destination` before it leaves its source,
    /// so it always has a row somewhere. Returns the new row.
    fn move_entity(
        &mut self,
        entity: Entity,
        record: EntityRecord,
        destination: ArchetypeId,
    ) -> usize {
        if record.archetype == destination {
            return record.row;
        }

        #[cfg(feature = "profiling")]
        let span = info_span!(
            "world.move_entity",
            from = record.archetype.index(),
            to = destination.index()
        );
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let (source, target) = pair_mut(
            &mut self.archetypes,
            record.archetype.index(),
            destination.index(),
        );

        let enabled = source.is_enabled(record.row);
        let new_row = target.add_entity(entity, enabled);

        let shared: ComponentIds = source
            .component_ids()
            .iter()
            .copied()
            .filter(|&component| target.contains(component))
            .collect();
        for component in shared {
            let pair = (source.store_mut(component), target.store_mut(component));
            if let (Some(from), Some(to)) = pair {
                from.transfer_to(record.row, to, new_row);
            }
        }

        if let Some(swapped) = source.remove_entity(record.row) {
            self.entities[swapped.index() as usize].row = record.row;
        }

        let moved = &mut self.entities[entity.index() as usize];
        moved.archetype = destination;
        moved.row = new_row;
        new_row
    }
}

/// Access two archetypes mutably at once
fn pair_mut(archetypes: &mut [Archetype], a: usize, b: usize) -> (&mut Archetype, &mut Archetype) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = archetypes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = archetypes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn missing_component<T>(entity: Entity) -> ! {
    panic!("{entity} has no {} component", std::any::type_name::<T>())
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("entities", &self.live_entities)
            .field("archetypes", &self.archetypes.len())
            .field("version", &self.version)
            .finish()
    }
}

/// Accumulates component types for a new entity
///
/// `create` clears the accumulated types so the builder can be reused.
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    components: ComponentIds,
}

impl<'w> EntityBuilder<'w> {
    pub fn with<T: Component>(&mut self) -> &mut Self {
        self.components.push(component_id::<T>());
        self
    }

    pub fn with_id(&mut self, component: ComponentId) -> &mut Self {
        self.components.push(component);
        self
    }

    pub fn create(&mut self) -> Entity {
        let entity = self.world.create_entity(&self.components);
        self.components.clear();
        entity
    }
}
