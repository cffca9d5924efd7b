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

//! Component, ComponentSet and Bundle traits
//!
//! Components are data attached to entities. Every component type is bound
//! to a process-wide [`ComponentId`] the first time it is used.
//! Component sets name a group of types; bundles also carry their values.

use std::any::TypeId;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::archetype::Archetype;
use crate::column::{ComponentStore, ErasedStore};

/// Maximum number of components supported by tuple set implementations
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Inline list of component ids
pub type ComponentIds = SmallVec<[ComponentId; MAX_BUNDLE_COMPONENTS]>;

/// Marker trait for components
///
/// Components must be 'static (no borrowed data) and default-constructible:
/// new rows start out holding `T::default()` until written.
pub trait Component: Default + 'static + Send + Sync {}

/// Automatically implement Component for all valid types
impl<T: Default + 'static + Send + Sync> Component for T {}

/// Small integer bound to one component type for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Wrap a raw id. Ids not produced by [`component_id`] have no
    /// registered store and cannot be used to create entities.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Id of `T`, registering it on first use
    #[inline]
    pub fn of<T: Component>() -> Self {
        component_id::<T>()
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registration record for one component type
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub type_id: TypeId,
    pub name: &'static str,
    new_store: fn() -> Box<dyn ErasedStore>,
}

impl ComponentInfo {
    fn of<T: Component>(id: ComponentId) -> Self {
        Self {
            id,
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            new_store: new_store_for::<T>,
        }
    }

    /// Create an empty store for this component type
    pub fn new_store(&self) -> Box<dyn ErasedStore> {
        (self.new_store)()
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

fn new_store_for<T: Component>() -> Box<dyn ErasedStore> {
    Box::new(ComponentStore::<T>::new())
}

#[derive(Default)]
struct ComponentRegistry {
    by_type: FxHashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

fn registry() -> &'static RwLock<ComponentRegistry> {
    static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(ComponentRegistry::default()))
}

/// Id of `T`, assigning the next free id on first use
///
/// Safe to call from several threads at once: concurrent first uses of
/// distinct types always receive distinct ids.
pub fn component_id<T: Component>() -> ComponentId {
    let type_id = TypeId::of::<T>();
    if let Some(&id) = registry().read().by_type.get(&type_id) {
        return id;
    }

    let mut registry = registry().write();
    // Another thread may have registered T between the two locks
    if let Some(&id) = registry.by_type.get(&type_id) {
        return id;
    }
    let id = ComponentId(registry.infos.len() as u32);
    registry.infos.push(ComponentInfo::of::<T>(id));
    registry.by_type.insert(type_id, id);
    id
}

/// Registration record for `id`, if any type was bound to it
pub fn component_info(id: ComponentId) -> Option<ComponentInfo> {
    registry().read().infos.get(id.index()).copied()
}

/// Number of component types registered so far
pub fn registered_components() -> usize {
    registry().read().infos.len()
}

/// A static set of component types
pub trait ComponentSet: 'static {
    /// Ids of all component types in the set
    fn component_ids() -> ComponentIds;
}

/// Component set carrying initial values
pub trait Bundle: ComponentSet + Send + Sync {
    /// Write every value into `row` of an archetype containing all set types
    fn write_into(self, archetype: &mut Archetype, row: usize);
}

impl ComponentSet for () {
    fn component_ids() -> ComponentIds {
        SmallVec::new()
    }
}

impl Bundle for () {
    fn write_into(self, _archetype: &mut Archetype, _row: usize) {}
}

// Macro for tuple set implementations
macro_rules! impl_bundle {
    ($($T:ident),*) => {
        impl<$($T: Component),*> ComponentSet for ($($T,)*) {
            fn component_ids() -> ComponentIds {
                smallvec![$(component_id::<$T>()),*]
            }
        }

        impl<$($T: Component),*> Bundle for ($($T,)*) {
            #[allow(non_snake_case)]
            fn write_into(self, archetype: &mut Archetype, row: usize) {
                let ($($T,)*) = self;
                $(
                    archetype.components_mut::<$T>()[row] = $T;
                )*
            }
        }
    };
}

// Implement for tuples of 1-8 components
impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    #![allow(dead_code)]
    use super::*;

    #[test]
    fn test_id_is_stable() {
        #[derive(Default)]
        struct Position {
            x: f32,
            y: f32,
        }

        let first = component_id::<Position>();
        let second = ComponentId::of::<Position>();
        assert_eq!(first, second);

        let info = component_info(first).unwrap();
        assert_eq!(info.type_id, TypeId::of::<Position>());
        assert!(info.name.ends_with("Position"));
    }

    #[test]
    fn test_distinct_types_get_distinct_ids() {
        #[derive(Default)]
        struct A;
        #[derive(Default)]
        struct B;

        assert_ne!(component_id::<A>(), component_id::<B>());
        assert!(registered_components() >= 2);
    }

    #[test]
    fn test_concurrent_registration() {
        #[derive(Default)]
        struct T0;
        #[derive(Default)]
        struct T1;
        #[derive(Default)]
        struct T2;
        #[derive(Default)]
        struct T3;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || match i % 4 {
                    0 => component_id::<T0>(),
                    1 => component_id::<T1>(),
                    2 => component_id::<T2>(),
                    _ => component_id::<T3>(),
                })
            })
            .collect();
        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for i in 0..4 {
            assert_eq!(ids[i], ids[i + 4]);
        }
        let mut unique = ids[..4].to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_tuple_component_ids() {
        #[derive(Default)]
        struct Position {
            x: f32,
        }

        #[derive(Default)]
        struct Velocity {
            x: f32,
        }

        let ids = <(Position, Velocity)>::component_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], component_id::<Position>());
        assert!(<()>::component_ids().is_empty());
    }

    #[test]
    fn test_new_store_matches_type() {
        let info = component_info(component_id::<u64>()).unwrap();
        let store = info.new_store();
        assert!(store.as_any().is::<ComponentStore<u64>>());
    }
}
