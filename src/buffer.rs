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

//! Growable dense buffer
//!
//! `DenseVec` keeps every backing slot initialised and tracks a logical
//! length separately. Slots past the length hold either defaults or stale
//! values left behind by [`DenseVec::fast_clear`].

use std::ops::{Index, IndexMut};

/// Smallest capacity after the first growth
const MIN_CAPACITY: usize = 4;

/// Amortized-growth contiguous buffer with O(1) unordered removal
#[derive(Debug, Clone)]
pub struct DenseVec<T> {
    slots: Vec<T>,
    len: usize,
}

impl<T: Default> Default for DenseVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Next capacity in the 1.4x growth sequence
#[inline]
fn grown(capacity: usize) -> usize {
    if capacity == 0 {
        MIN_CAPACITY
    } else {
        // ceil(capacity * 1.4) without floating point
        (capacity * 14).div_ceil(10).max(capacity + 1)
    }
}

impl<T: Default> DenseVec<T> {
    /// Create an empty buffer without allocating
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Create a buffer with `capacity` default-initialised slots
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        Self { slots, len: 0 }
    }

    /// Number of live elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of initialised backing slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.slots[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.slots[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Write `value` at `index`, growing the buffer and length when needed
    pub fn set_at(&mut self, index: usize, value: T) {
        if self.slots.len() <= index {
            self.allocate_at_least(index + 1);
        }
        if self.len <= index {
            self.len = index + 1;
        }
        self.slots[index] = value;
    }

    /// Append one element
    pub fn push(&mut self, value: T) {
        if self.len == self.slots.len() {
            self.allocate_more();
        }
        self.slots[self.len] = value;
        self.len += 1;
    }

    /// Append a default element and return its index
    pub fn push_default(&mut self) -> usize {
        if self.len == self.slots.len() {
            self.allocate_more();
        }
        // Slot may hold a stale value after fast_clear
        self.slots[self.len] = T::default();
        self.len += 1;
        self.len - 1
    }

    /// Insert at `index`, shifting later elements right
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len, "insert index {index} out of range");
        if self.len == self.slots.len() {
            self.allocate_more();
        }
        self.slots[index..=self.len].rotate_right(1);
        self.slots[index] = value;
        self.len += 1;
    }

    /// Remove at `index`, shifting later elements left (order preserving, O(n))
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> T {
        assert!(index < self.len, "remove index {index} out of range");
        self.slots[index..self.len].rotate_left(1);
        self.len -= 1;
        std::mem::take(&mut self.slots[self.len])
    }

    /// Move the last element into `index` and shrink by one
    ///
    /// Returns `true` if an element was moved into `index`, `false` if
    /// `index` was the last element. The vacated slot is reset to default.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn unordered_remove_at(&mut self, index: usize) -> bool {
        assert!(index < self.len, "remove index {index} out of range");
        self.len -= 1;
        let last = self.len;
        if index == last {
            self.slots[last] = T::default();
            return false;
        }
        self.slots.swap(index, last);
        self.slots[last] = T::default();
        true
    }

    /// Remove every element (resets slots so held values are dropped)
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = T::default();
        }
        self.len = 0;
    }

    /// Reset the length only; stale slots stay alive until overwritten
    #[inline]
    pub fn fast_clear(&mut self) {
        self.len = 0;
    }

    /// Make sure at least `capacity` slots are allocated
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            self.allocate_at_least(capacity);
        }
    }

    /// Make room for `additional` more elements
    pub fn reserve(&mut self, additional: usize) {
        self.ensure_capacity(self.len + additional);
    }

    /// Set the logical length, growing with defaults if needed
    pub fn resize(&mut self, new_len: usize) {
        self.ensure_capacity(new_len);
        if new_len < self.len {
            for slot in &mut self.slots[new_len..self.len] {
                *slot = T::default();
            }
        }
        self.len = new_len;
    }

    /// Free unused backing slots
    pub fn trim(&mut self) {
        self.slots.truncate(self.len);
        self.slots.shrink_to_fit();
    }

    /// Append `count` copies of `value`
    pub fn add_many(&mut self, value: &T, count: usize)
    where
        T: Clone,
    {
        if count == 0 {
            return;
        }
        let new_len = self.len + count;
        self.ensure_capacity(new_len);
        for slot in &mut self.slots[self.len..new_len] {
            *slot = value.clone();
        }
        self.len = new_len;
    }

    /// Append a slice, growing once
    pub fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        if items.is_empty() {
            return;
        }
        let new_len = self.len + items.len();
        self.ensure_capacity(new_len);
        self.slots[self.len..new_len].clone_from_slice(items);
        self.len = new_len;
    }

    /// Append from an iterator, growing once using its size hint
    pub fn add_range<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items = items.into_iter();
        let (lower, upper) = items.size_hint();
        self.reserve(upper.unwrap_or(lower));
        for item in items {
            self.push(item);
        }
    }

    /// Index of the last element equal to `value`
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.as_slice().iter().rposition(|item| item == value)
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// Order-preserving removal of the last element equal to `value`
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Unordered removal of the last element equal to `value`
    pub fn unordered_remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(index) => {
                self.unordered_remove_at(index);
                true
            }
            None => false,
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.as_slice().to_vec()
    }

    fn allocate_more(&mut self) {
        let capacity = grown(self.slots.len());
        self.slots.resize_with(capacity, T::default);
    }

    fn allocate_at_least(&mut self, required: usize) {
        let mut capacity = self.slots.len();
        while capacity < required {
            capacity = grown(capacity);
        }
        self.slots.resize_with(capacity, T::default);
    }
}

impl<T: Default> Index<usize> for DenseVec<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Default> IndexMut<usize> for DenseVec<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Default> FromIterator<T> for DenseVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = DenseVec::new();
        buffer.add_range(iter);
        buffer
    }
}

impl<'a, T: Default> IntoIterator for &'a DenseVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
