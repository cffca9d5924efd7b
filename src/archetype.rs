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

//! Archetype storage with row allocation and removal

use std::fmt;

use crate::bitset::EnabledBits;
use crate::buffer::DenseVec;
use crate::column::{
    ComponentAccess, ComponentAccessMut, ComponentRef, ComponentStore, ErasedStore,
};
use crate::component::{component_id, component_info, Component, ComponentId, ComponentIds};
use crate::entity::Entity;
use crate::mask::ComponentMask;

/// Index of an archetype in its world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// The archetype of entities with no components
    pub const EMPTY: ArchetypeId = ArchetypeId(0);

    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Archetype: Structure of Arrays storage
///
/// Row `r` of the entity list, of every column, and of the enabled bits
/// all describe the same entity.
pub struct Archetype {
    id: ArchetypeId,
    mask: ComponentMask,
    component_ids: ComponentIds,
    /// Lowest member id; columns are addressed by `id - min_component`
    min_component: usize,
    columns: Vec<Option<Box<dyn ErasedStore>>>,
    entities: DenseVec<Entity>,
    enabled: EnabledBits,
}

impl Archetype {
    /// Create new archetype owning `mask`
    ///
    /// # Panics
    /// Panics if `mask` names an id with no registered component type.
    pub(crate) fn new(id: ArchetypeId, mask: ComponentMask, rows: usize) -> Self {
        let component_ids: ComponentIds = mask.ids().collect();
        let (min_component, columns) = match (mask.lowest(), mask.highest()) {
            (Some(min), Some(max)) => {
                let mut columns: Vec<Option<Box<dyn ErasedStore>>> =
                    (min.index()..=max.index()).map(|_| None).collect();
                for &component in &component_ids {
                    let info = component_info(component).unwrap_or_else(|| {
                        panic!("component {component} has no registered type")
                    });
                    let mut column = info.new_store();
                    column.reserve(rows);
                    columns[component.index() - min.index()] = Some(column);
                }
                (min.index(), columns)
            }
            _ => (0, Vec::new()),
        };

        Self {
            id,
            mask,
            component_ids,
            min_component,
            columns,
            entities: DenseVec::with_capacity(rows),
            enabled: EnabledBits::with_capacity(rows),
        }
    }

    #[inline]
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Component set identifying this archetype
    #[inline]
    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    /// Member component ids in ascending order
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.component_ids
    }

    #[inline]
    pub fn contains(&self, component: ComponentId) -> bool {
        self.mask.contains(component)
    }

    pub fn has<T: Component>(&self) -> bool {
        self.contains(component_id::<T>())
    }

    /// Allocate row for entity
    pub(crate) fn add_entity(&mut self, entity: Entity, enabled: bool) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        self.enabled.set(row, enabled);

        for column in self.columns.iter_mut().flatten() {
            column.push_default();
        }

        row
    }

    /// Remove row and return the entity that was swapped into it
    ///
    /// # Panics
    /// Panics if `row` is out of range.
    pub(crate) fn remove_entity(&mut self, row: usize) -> Option<Entity> {
        let last = self.entities.len() - 1;
        // Keep enabled bits in step with the swap below
        let last_enabled = self.enabled.get(last);
        self.enabled.set(row, last_enabled);
        self.enabled.set(last, true);

        let moved = self.entities.unordered_remove_at(row);
        for column in self.columns.iter_mut().flatten() {
            column.swap_remove(row);
        }

        moved.then(|| self.entities[row])
    }

    /// Number of entities
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if archetype is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities, optionally skipping disabled ones
    pub fn count(&self, include_disabled: bool) -> usize {
        if include_disabled {
            self.len()
        } else {
            self.len() - self.enabled.disabled_count()
        }
    }

    /// Entity stored at `row`
    ///
    /// # Panics
    /// Panics if `row` is out of range.
    #[inline]
    pub fn entity(&self, row: usize) -> Entity {
        self.entities[row]
    }

    /// Get all entities
    pub fn entities(&self) -> &[Entity] {
        self.entities.as_slice()
    }

    #[inline]
    pub fn is_enabled(&self, row: usize) -> bool {
        self.enabled.get(row)
    }

    /// Enable or disable a live row; rows past `len()` are ignored
    pub fn set_enabled(&mut self, row: usize, enabled: bool) {
        if row < self.len() {
            self.enabled.set(row, enabled);
        }
    }

    pub fn disabled_count(&self) -> usize {
        self.enabled.disabled_count()
    }

    /// Get column immutably
    pub fn store(&self, component: ComponentId) -> Option<&dyn ErasedStore> {
        let slot = component.index().checked_sub(self.min_component)?;
        self.columns.get(slot)?.as_deref()
    }

    /// Get column mutably
    pub fn store_mut(
        &mut self,
        component: ComponentId,
    ) -> Option<&mut (dyn ErasedStore + 'static)> {
        let slot = component.index().checked_sub(self.min_component)?;
        self.columns.get_mut(slot)?.as_deref_mut()
    }

    fn typed<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.store(component_id::<T>())?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
    }

    fn typed_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.store_mut(component_id::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
    }

    /// Scoped view of the `T` column, if this archetype has one
    pub fn try_components<T: Component>(&self) -> Option<ComponentAccess<'_, T>> {
        self.typed::<T>().map(ComponentStore::access)
    }

    pub fn try_components_mut<T: Component>(&mut self) -> Option<ComponentAccessMut<'_, T>> {
        self.typed_mut::<T>().map(ComponentStore::access_mut)
    }

    /// Scoped view of the `T` column
    ///
    /// # Panics
    /// Panics if `T` is not part of this archetype.
    pub fn components<T: Component>(&self) -> ComponentAccess<'_, T> {
        match self.typed::<T>() {
            Some(column) => column.access(),
            None => missing_column::<T>(&self.mask),
        }
    }

    /// Scoped mutable view of the `T` column
    ///
    /// # Panics
    /// Panics if `T` is not part of this archetype.
    pub fn components_mut<T: Component>(&mut self) -> ComponentAccessMut<'_, T> {
        if !self.has::<T>() {
            missing_column::<T>(&self.mask);
        }
        match self.typed_mut::<T>() {
            Some(column) => column.access_mut(),
            None => unreachable!("column type does not match its component id"),
        }
    }

    /// Mutable handle to the `T` value at `row`
    ///
    /// # Panics
    /// Panics if `T` is not part of this archetype or `row` is out of range.
    pub fn component_ref<T: Component>(&mut self, row: usize) -> ComponentRef<'_, T> {
        ComponentRef::new(self.components_mut::<T>(), row)
    }

    /// Get component at row
    pub fn get<T: Component>(&self, row: usize) -> Option<&T> {
        self.typed::<T>()?.get(row)
    }

    /// Get mutable component at row
    pub fn get_mut<T: Component>(&mut self, row: usize) -> Option<&mut T> {
        self.typed_mut::<T>()?.get_mut(row)
    }

    /// Visit every row's entity and `T` value
    ///
    /// Disabled rows are skipped unless `include_disabled` is set.
    ///
    /// # Panics
    /// Panics if `T` is not part of this archetype.
    pub fn for_each_mut<T: Component>(
        &mut self,
        include_disabled: bool,
        mut func: impl FnMut(Entity, &mut T),
    ) {
        if !self.has::<T>() {
            missing_column::<T>(&self.mask);
        }

        let Self {
            columns,
            entities,
            enabled,
            min_component,
            ..
        } = self;
        let slot = component_id::<T>().index() - *min_component;
        let Some(column) = columns[slot]
            .as_deref_mut()
            .and_then(|column| column.as_any_mut().downcast_mut::<ComponentStore<T>>())
        else {
            unreachable!("column type does not match its component id")
        };

        let mut values = column.access_mut();
        for (row, (&entity, value)) in entities.iter().zip(values.iter_mut()).enumerate() {
            if include_disabled || enabled.get(row) {
                func(entity, value);
            }
        }
    }

    /// Reserve space for additional rows
    pub fn reserve_rows(&mut self, additional: usize) {
        self.entities.reserve(additional);
        for column in self.columns.iter_mut().flatten() {
            column.reserve(additional);
        }
    }

    /// Drop every row, keeping the columns
    pub(crate) fn clear(&mut self) {
        self.entities.clear();
        self.enabled.reset();
        for column in self.columns.iter_mut().flatten() {
            column.clear();
        }
    }
}

fn missing_column<T>(mask: &ComponentMask) -> ! {
    panic!(
        "archetype {mask:?} has no column for {}",
        std::any::type_name::<T>()
    )
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("id", &self.id)
            .field("mask", &self.mask)
            .field("len", &self.len())
            .field("disabled", &self.disabled_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    fn archetype_of<S: crate::component::ComponentSet>() -> Archetype {
        let mask = ComponentMask::from_set::<S>().to_owned_mask();
        Archetype::new(ArchetypeId::new(1), mask, 16)
    }

    #[test]
    fn test_archetype_creation() {
        let arch = archetype_of::<(Position, Velocity)>();
        assert_eq!(arch.len(), 0);
        assert!(arch.has::<Position>());
        assert!(arch.has::<Velocity>());
        assert!(!arch.has::<u8>());
        assert_eq!(arch.component_ids().len(), 2);
    }

    #[test]
    fn test_empty_archetype() {
        let mut arch = Archetype::new(ArchetypeId::EMPTY, ComponentMask::new(), 4);
        let row = arch.add_entity(Entity::new(0, 0), true);
        assert_eq!(row, 0);
        assert!(arch.store(component_id::<Position>()).is_none());
        assert_eq!(arch.remove_entity(0), None);
        assert!(arch.is_empty());
    }

    #[test]
    fn test_add_entity_defaults_columns() {
        let mut arch = archetype_of::<(Position,)>();
        let row = arch.add_entity(Entity::new(3, 0), true);
        assert_eq!(arch.get::<Position>(row), Some(&Position::default()));
        assert_eq!(arch.entity(row), Entity::new(3, 0));
    }

    #[test]
    fn test_remove_middle_swaps_last() {
        let mut arch = archetype_of::<(Position,)>();
        for i in 0..3 {
            let row = arch.add_entity(Entity::new(i, 0), true);
            arch.components_mut::<Position>()[row] = Position { x: i as f32, y: 0.0 };
        }

        let moved = arch.remove_entity(1);
        assert_eq!(moved, Some(Entity::new(2, 0)));
        assert_eq!(arch.entities(), &[Entity::new(0, 0), Entity::new(2, 0)]);
        assert_eq!(arch.get::<Position>(1).map(|p| p.x), Some(2.0));
        assert_eq!(arch.count(true), 2);
    }

    #[test]
    fn test_enabled_bits_follow_swap() {
        let mut arch = archetype_of::<(Position,)>();
        arch.add_entity(Entity::new(0, 0), true);
        arch.add_entity(Entity::new(1, 0), true);
        arch.add_entity(Entity::new(2, 0), false);
        assert_eq!(arch.count(false), 2);

        // Row 2 (disabled) is moved into row 0
        arch.remove_entity(0);
        assert!(!arch.is_enabled(0));
        assert!(arch.is_enabled(1));
        assert!(arch.is_enabled(2));
        assert_eq!(arch.count(false), 1);

        // Removing the disabled row clears its bit
        arch.remove_entity(0);
        assert_eq!(arch.disabled_count(), 0);
        assert_eq!(arch.count(false), 1);
    }

    #[test]
    fn test_set_enabled_ignores_rows_past_len() {
        let mut arch = archetype_of::<(Position,)>();
        arch.add_entity(Entity::new(0, 0), true);

        arch.set_enabled(500, false);
        arch.set_enabled(1, false);
        assert_eq!(arch.disabled_count(), 0);
        assert_eq!(arch.count(false), 1);

        arch.set_enabled(0, false);
        assert_eq!(arch.count(false), 0);
    }

    #[test]
    fn test_component_ref() {
        let mut arch = archetype_of::<(Position,)>();
        arch.add_entity(Entity::new(0, 0), true);
        let row = arch.add_entity(Entity::new(1, 0), true);

        arch.component_ref::<Position>(row).x = 4.0;
        assert_eq!(arch.get::<Position>(row).map(|p| p.x), Some(4.0));
        assert_eq!(arch.get::<Position>(0), Some(&Position::default()));
    }

    #[test]
    fn test_accessors_count_locks() {
        let mut arch = archetype_of::<(Position, Velocity)>();
        arch.add_entity(Entity::new(0, 0), true);

        let positions = arch.components::<Position>();
        let velocities = arch.components::<Velocity>();
        assert_eq!(positions.lock_count(), 1);
        assert_eq!(velocities.len(), 1);
        drop(positions);
        drop(velocities);

        let column = arch.store(component_id::<Position>()).unwrap();
        assert_eq!(column.lock_count(), 0);
        assert!(arch.try_components::<u16>().is_none());
    }

    #[test]
    #[should_panic(expected = "has no column")]
    fn test_missing_column_panics() {
        let arch = archetype_of::<(Position,)>();
        let _ = arch.components::<Velocity>();
    }
}
