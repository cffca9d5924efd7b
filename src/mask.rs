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

//! Component type-set masks
//!
//! A [`ComponentMask`] is the identity of an archetype: a bitset of
//! component ids plus the cached index of its highest set bit. Equality and
//! hashing only look at the words up to that bit, so masks with the same
//! members compare equal whatever their backing capacity.
//!
//! Short-lived working masks are [`PooledMask`]s. They borrow their word
//! buffer from a small process-wide pool and hand it back when dropped.
//! Archetypes keep a plain `ComponentMask` copy that never enters the pool.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::OnceLock;

use crossbeam::queue::ArrayQueue;

use crate::component::{ComponentId, ComponentSet};

/// Buffers kept for reuse; extra released buffers are freed
pub const MAX_POOLED_MASKS: usize = 8;

/// Words reserved by a freshly allocated pooled buffer
const POOLED_WORDS: usize = 8;

static EMPTY: ComponentMask = ComponentMask {
    words: Vec::new(),
    highest: None,
};

fn pool() -> &'static ArrayQueue<Vec<u64>> {
    static POOL: OnceLock<ArrayQueue<Vec<u64>>> = OnceLock::new();
    POOL.get_or_init(|| ArrayQueue::new(MAX_POOLED_MASKS))
}

fn take_words() -> Vec<u64> {
    match pool().pop() {
        Some(mut words) => {
            words.clear();
            words
        }
        None => Vec::with_capacity(POOLED_WORDS),
    }
}

/// Number of word buffers currently waiting in the pool
pub fn pooled_masks() -> usize {
    pool().len()
}

/// Set of component ids
///
/// Words past the highest set bit are always zero.
pub struct ComponentMask {
    words: Vec<u64>,
    highest: Option<usize>,
}

impl ComponentMask {
    /// Empty owned mask
    pub const fn new() -> Self {
        Self {
            words: Vec::new(),
            highest: None,
        }
    }

    /// The shared empty mask
    pub fn empty() -> &'static ComponentMask {
        &EMPTY
    }

    /// Pooled mask holding exactly `ids`
    pub fn from_ids(ids: &[ComponentId]) -> PooledMask {
        let mut mask = PooledMask::take();
        for &id in ids {
            mask.inner.insert(id);
        }
        mask
    }

    /// Pooled mask holding the types of `S`
    pub fn from_set<S: ComponentSet>() -> PooledMask {
        Self::from_ids(&S::component_ids())
    }

    /// Pooled copy of `self` plus `id`
    pub fn include(&self, id: ComponentId) -> PooledMask {
        let mut mask = PooledMask::copy(self);
        mask.inner.insert(id);
        mask
    }

    /// Pooled copy of `self` minus `id`
    pub fn exclude(&self, id: ComponentId) -> PooledMask {
        let mut mask = PooledMask::copy(self);
        mask.inner.remove(id);
        mask
    }

    #[inline]
    pub fn contains(&self, id: ComponentId) -> bool {
        let index = id.index();
        match self.highest {
            Some(highest) if index <= highest => {
                (self.words[index / 64] & (1 << (index % 64))) != 0
            }
            _ => false,
        }
    }

    /// True if every id in `other` is also in `self`
    pub fn includes(&self, other: &ComponentMask) -> bool {
        if other.highest > self.highest {
            return false;
        }
        other
            .populated()
            .iter()
            .zip(&self.words)
            .all(|(&required, &word)| word & required == required)
    }

    /// True if no id is in both `self` and `other`
    pub fn excludes(&self, other: &ComponentMask) -> bool {
        self.populated()
            .iter()
            .zip(other.populated())
            .all(|(&word, &forbidden)| word & forbidden == 0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.highest.is_none()
    }

    /// Number of ids in the set
    pub fn len(&self) -> usize {
        self.populated().iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Highest id in the set
    #[inline]
    pub fn highest(&self) -> Option<ComponentId> {
        self.highest.map(|h| ComponentId::from_raw(h as u32))
    }

    /// Lowest id in the set
    pub fn lowest(&self) -> Option<ComponentId> {
        self.ids().next()
    }

    /// Member ids in ascending order
    pub fn ids(&self) -> MaskIds<'_> {
        let words = self.populated();
        MaskIds {
            words,
            word_idx: 0,
            current_word: words.first().copied().unwrap_or(0),
        }
    }

    #[inline]
    fn word_len(&self) -> usize {
        self.highest.map_or(0, |h| h / 64 + 1)
    }

    #[inline]
    fn populated(&self) -> &[u64] {
        &self.words[..self.word_len()]
    }

    fn insert(&mut self, id: ComponentId) {
        let index = id.index();
        let word_idx = index / 64;
        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }
        self.words[word_idx] |= 1 << (index % 64);
        if self.highest.map_or(true, |h| index > h) {
            self.highest = Some(index);
        }
    }

    fn remove(&mut self, id: ComponentId) {
        let index = id.index();
        let Some(highest) = self.highest else {
            return;
        };
        if index > highest {
            return;
        }
        self.words[index / 64] &= !(1 << (index % 64));

        if index == highest {
            // Rescan for the new highest bit
            self.highest = self
                .words
                .iter()
                .rposition(|&w| w != 0)
                .map(|w| w * 64 + 63 - self.words[w].leading_zeros() as usize);
            let len = self.word_len();
            self.words.truncate(len);
        }
    }

    fn copy_from(&mut self, other: &ComponentMask) {
        self.words.clear();
        self.words.extend_from_slice(other.populated());
        self.highest = other.highest;
    }
}

impl Default for ComponentMask {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ComponentMask {
    fn clone(&self) -> Self {
        Self {
            words: self.populated().to_vec(),
            highest: self.highest,
        }
    }
}

impl PartialEq for ComponentMask {
    fn eq(&self, other: &Self) -> bool {
        self.highest == other.highest && self.populated() == other.populated()
    }
}

impl Eq for ComponentMask {}

impl Hash for ComponentMask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.populated().hash(state);
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ids()).finish()
    }
}

impl FromIterator<ComponentId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut mask = ComponentMask::new();
        for id in iter {
            mask.insert(id);
        }
        mask
    }
}

/// Iterator over the ids of a mask
pub struct MaskIds<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl<'a> Iterator for MaskIds<'a> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let trailing = self.current_word.trailing_zeros();
                self.current_word &= !(1 << trailing);
                return Some(ComponentId::from_raw(
                    (self.word_idx * 64) as u32 + trailing,
                ));
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current_word = self.words[self.word_idx];
        }
    }
}

/// Working mask whose buffer returns to the pool on drop
pub struct PooledMask {
    inner: ComponentMask,
}

impl PooledMask {
    fn take() -> Self {
        Self {
            inner: ComponentMask {
                words: take_words(),
                highest: None,
            },
        }
    }

    /// Independent pooled duplicate of `mask`
    pub fn copy(mask: &ComponentMask) -> Self {
        let mut pooled = Self::take();
        pooled.inner.copy_from(mask);
        pooled
    }

    /// Non-pooled copy suitable as a permanent key
    pub fn to_owned_mask(&self) -> ComponentMask {
        self.inner.clone()
    }
}

impl Deref for PooledMask {
    type Target = ComponentMask;

    #[inline]
    fn deref(&self) -> &ComponentMask {
        &self.inner
    }
}

impl Drop for PooledMask {
    fn drop(&mut self) {
        let words = std::mem::take(&mut self.inner.words);
        // A full pool just frees the buffer
        let _ = pool().push(words);
    }
}

impl fmt::Debug for PooledMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> ComponentId {
        ComponentId::from_raw(raw)
    }

    fn owned(ids: &[u32]) -> ComponentMask {
        ids.iter().map(|&raw| id(raw)).collect()
    }

    #[test]
    fn test_empty_singleton() {
        let empty = ComponentMask::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.highest(), None);
        assert!(std::ptr::eq(empty, ComponentMask::empty()));
        assert_eq!(*empty, ComponentMask::new());
    }

    #[test]
    fn test_from_ids_and_contains() {
        let mask = ComponentMask::from_ids(&[id(1), id(70), id(3)]);
        assert!(mask.contains(id(1)));
        assert!(mask.contains(id(70)));
        assert!(!mask.contains(id(2)));
        assert!(!mask.contains(id(500)));
        assert_eq!(mask.highest(), Some(id(70)));
        assert_eq!(mask.len(), 3);
        assert_eq!(mask.ids().collect::<Vec<_>>(), vec![id(1), id(3), id(70)]);
    }

    #[test]
    fn test_include_leaves_original() {
        let base = owned(&[2]);
        let grown = base.include(id(5));
        assert!(grown.contains(id(5)));
        assert!(!base.contains(id(5)));
        assert!(grown.includes(&base));
    }

    #[test]
    fn test_exclude_include_round_trip() {
        let base = owned(&[1, 4, 9]);
        for extra in [0, 5, 9, 100, 200] {
            let included = base.include(id(extra));
            let back = included.exclude(id(extra));
            if base.contains(id(extra)) {
                assert_eq!(*back, owned(&[1, 4]));
            } else {
                assert_eq!(*back, base);
            }
        }
    }

    #[test]
    fn test_removing_highest_rescans() {
        let mask = owned(&[3, 130]);
        let lowered = mask.exclude(id(130));
        assert_eq!(lowered.highest(), Some(id(3)));
        assert_eq!(*lowered, owned(&[3]));

        let emptied = lowered.exclude(id(3));
        assert!(emptied.is_empty());
        assert_eq!(*emptied, *ComponentMask::empty());
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let mut wide = ComponentMask::new();
        wide.insert(id(300));
        wide.insert(id(2));
        wide.remove(id(300));

        let narrow = owned(&[2]);
        assert_eq!(wide, narrow);

        let mut hashes = std::collections::HashSet::new();
        hashes.insert(wide);
        assert!(hashes.contains(&narrow));
    }

    #[test]
    fn test_includes_excludes() {
        let group = owned(&[1, 2, 3]);
        assert!(group.includes(&owned(&[1, 3])));
        assert!(group.includes(ComponentMask::empty()));
        assert!(!group.includes(&owned(&[1, 4])));
        assert!(!group.includes(&owned(&[90])));

        assert!(group.excludes(&owned(&[4, 90])));
        assert!(group.excludes(ComponentMask::empty()));
        assert!(!group.excludes(&owned(&[3])));
        assert!(ComponentMask::empty().excludes(&group));
    }

    #[test]
    fn test_pool_reuse_is_bounded() {
        let masks: Vec<_> = (0..20).map(|i| ComponentMask::from_ids(&[id(i)])).collect();
        drop(masks);
        assert!(pooled_masks() <= MAX_POOLED_MASKS);

        // Reused buffer starts clean
        let reused = ComponentMask::from_ids(&[id(7)]);
        assert_eq!(reused.ids().collect::<Vec<_>>(), vec![id(7)]);
    }

    #[test]
    fn test_owned_copy_is_independent() {
        let pooled = ComponentMask::from_ids(&[id(4), id(8)]);
        let key = pooled.to_owned_mask();
        drop(pooled);
        assert_eq!(key, owned(&[4, 8]));
    }
}
