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

//! Per-type component columns
//!
//! A column is typed internally and erased at the archetype boundary
//! through [`ErasedStore`]. Rows are parallel to the owning archetype's
//! entity list.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::buffer::DenseVec;
use crate::component::Component;

/// Rows reserved by a fresh column
const INITIAL_ROWS: usize = 128;

/// Type-erased column interface used by archetypes
pub trait ErasedStore: Any + Send + Sync {
    /// Append one default-valued row
    fn push_default(&mut self);

    /// Unordered removal of `row`
    fn swap_remove(&mut self, row: usize);

    /// Move the value at `src_row` into `dst_row` of `dst`
    ///
    /// # Panics
    /// Panics if `dst` does not store the same component type.
    fn transfer_to(&mut self, src_row: usize, dst: &mut dyn ErasedStore, dst_row: usize);

    /// Make room for `additional` rows
    fn reserve(&mut self, additional: usize);

    /// Number of rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of scoped accessors currently alive
    fn lock_count(&self) -> usize;

    /// Drop every row
    fn clear(&mut self);

    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense column of `T` values
pub struct ComponentStore<T> {
    values: DenseVec<T>,
    locks: AtomicUsize,
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self {
            values: DenseVec::with_capacity(INITIAL_ROWS),
            locks: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.values.get(row)
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        self.values.get_mut(row)
    }

    /// Overwrite the value at `row`
    ///
    /// # Panics
    /// Panics if `row` is out of range.
    #[inline]
    pub fn set(&mut self, row: usize, value: T) {
        self.values[row] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        self.values.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.values.as_mut_slice()
    }

    /// Scoped shared view; counted until dropped
    pub fn access(&self) -> ComponentAccess<'_, T> {
        self.locks.fetch_add(1, Ordering::AcqRel);
        ComponentAccess { store: self }
    }

    /// Scoped exclusive view; counted until dropped
    pub fn access_mut(&mut self) -> ComponentAccessMut<'_, T> {
        self.locks.fetch_add(1, Ordering::AcqRel);
        ComponentAccessMut { store: self }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locks.load(Ordering::Acquire) > 0
    }

    #[inline]
    fn unlock(&self) {
        self.locks.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn push_default(&mut self) {
        self.values.push_default();
    }

    fn swap_remove(&mut self, row: usize) {
        self.values.unordered_remove_at(row);
    }

    fn transfer_to(&mut self, src_row: usize, dst: &mut dyn ErasedStore, dst_row: usize) {
        let dst_name = dst.type_name();
        let Some(dst) = dst.as_any_mut().downcast_mut::<ComponentStore<T>>() else {
            panic!(
                "column type mismatch: {} -> {dst_name}",
                std::any::type_name::<T>()
            );
        };
        dst.values[dst_row] = std::mem::take(&mut self.values[src_row]);
    }

    fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn lock_count(&self) -> usize {
        self.locks.load(Ordering::Acquire)
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Component> fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStore")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.values.len())
            .field("locks", &self.locks.load(Ordering::Relaxed))
            .finish()
    }
}

/// Shared scoped accessor over a column's rows
///
/// The lock counter is advisory bookkeeping; it never blocks other access.
pub struct ComponentAccess<'a, T: Component> {
    store: &'a ComponentStore<T>,
}

impl<'a, T: Component> ComponentAccess<'a, T> {
    /// Counter value including this accessor
    pub fn lock_count(&self) -> usize {
        self.store.lock_count()
    }
}

impl<'a, T: Component> Deref for ComponentAccess<'a, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.store.as_slice()
    }
}

impl<'a, T: Component> Drop for ComponentAccess<'a, T> {
    fn drop(&mut self) {
        self.store.unlock();
    }
}

/// Exclusive scoped accessor over a column's rows
pub struct ComponentAccessMut<'a, T: Component> {
    store: &'a mut ComponentStore<T>,
}

impl<'a, T: Component> ComponentAccessMut<'a, T> {
    pub fn lock_count(&self) -> usize {
        self.store.lock_count()
    }
}

impl<'a, T: Component> Deref for ComponentAccessMut<'a, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.store.as_slice()
    }
}

impl<'a, T: Component> DerefMut for ComponentAccessMut<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.store.as_mut_slice()
    }
}

impl<'a, T: Component> Drop for ComponentAccessMut<'a, T> {
    fn drop(&mut self) {
        self.store.unlock();
    }
}

/// Mutable handle to a single row of a column
///
/// Holds the column's mutable access for as long as it lives, so the lock
/// count stays raised until the handle is dropped.
pub struct ComponentRef<'a, T: Component> {
    access: ComponentAccessMut<'a, T>,
    row: usize,
}

impl<'a, T: Component> ComponentRef<'a, T> {
    /// # Panics
    /// Panics if `row` is past the end of the column.
    pub fn new(access: ComponentAccessMut<'a, T>, row: usize) -> Self {
        assert!(
            row < access.len(),
            "row {row} out of range for a column of {} rows",
            access.len()
        );
        Self { access, row }
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn lock_count(&self) -> usize {
        self.access.lock_count()
    }
}

impl<'a, T: Component> Deref for ComponentRef<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.access[self.row]
    }
}

impl<'a, T: Component> DerefMut for ComponentRef<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.access[self.row]
    }
}
