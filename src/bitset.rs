//! Growable bit vector of per-row enabled flags.
//! Backed by a Vec<u64> of *disabled* bits, so unallocated rows read as enabled.

/// Words allocated on the first growth
const MIN_WORDS: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct EnabledBits {
    disabled: Vec<u64>,
    disabled_count: usize,
}

impl EnabledBits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vector with storage for at least `capacity` flags.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            disabled: vec![0; capacity.div_ceil(64)],
            disabled_count: 0,
        }
    }

    /// Flag at `index`. Anything past the allocated words reads as `true`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        let (word_idx, bit_idx) = (index / 64, index % 64);
        match self.disabled.get(word_idx) {
            Some(word) => (word & (1 << bit_idx)) == 0,
            None => true,
        }
    }

    /// Set the flag at `index`, growing storage on demand.
    /// Updates the disabled count only on an actual transition.
    pub fn set(&mut self, index: usize, enabled: bool) {
        if self.get(index) == enabled {
            return;
        }
        let (word_idx, bit_idx) = (index / 64, index % 64);
        if word_idx >= self.disabled.len() {
            let new_len = (word_idx + 1).max(self.disabled.len() * 3 / 2).max(MIN_WORDS);
            self.disabled.resize(new_len, 0);
        }
        if enabled {
            self.disabled[word_idx] &= !(1 << bit_idx);
            self.disabled_count -= 1;
        } else {
            self.disabled[word_idx] |= 1 << bit_idx;
            self.disabled_count += 1;
        }
    }

    /// Number of flags currently `false`.
    #[inline]
    pub fn disabled_count(&self) -> usize {
        self.disabled_count
    }

    /// Number of flags covered by allocated storage.
    pub fn capacity(&self) -> usize {
        self.disabled.len() * 64
    }

    /// Re-enable every flag without freeing storage.
    pub fn reset(&mut self) {
        self.disabled.iter_mut().for_each(|word| *word = 0);
        self.disabled_count = 0;
    }

    /// Returns iterator over indices of disabled flags
    pub fn disabled(&self) -> DisabledIter<'_> {
        DisabledIter {
            bits: self,
            word_idx: 0,
            current_word: self.disabled.first().copied().unwrap_or(0),
        }
    }
}

pub struct DisabledIter<'a> {
    bits: &'a EnabledBits,
    word_idx: usize,
    current_word: u64,
}

impl<'a> Iterator for DisabledIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let trailing = self.current_word.trailing_zeros();
                self.current_word &= !(1 << trailing);
                return Some(self.word_idx * 64 + trailing as usize);
            }

            self.word_idx += 1;
            if self.word_idx >= self.bits.disabled.len() {
                return None;
            }
            self.current_word = self.bits.disabled[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_reads_enabled() {
        let bits = EnabledBits::new();
        assert!(bits.get(0));
        assert!(bits.get(10_000));
        assert_eq!(bits.capacity(), 0);
    }

    #[test]
    fn test_set_tracks_disabled_count() {
        let mut bits = EnabledBits::new();
        bits.set(3, false);
        bits.set(200, false);
        assert!(!bits.get(3));
        assert!(!bits.get(200));
        assert!(bits.get(4));
        assert_eq!(bits.disabled_count(), 2);

        // Repeated writes are not transitions
        bits.set(3, false);
        bits.set(5, true);
        assert_eq!(bits.disabled_count(), 2);

        bits.set(3, true);
        assert!(bits.get(3));
        assert_eq!(bits.disabled_count(), 1);
    }

    #[test]
    fn test_growth_keeps_untouched_rows_enabled() {
        let mut bits = EnabledBits::new();
        bits.set(1000, false);
        assert!((0..1000).all(|i| bits.get(i)));
        assert!(bits.get(5000));
    }

    #[test]
    fn test_disabled_iter() {
        let mut bits = EnabledBits::with_capacity(256);
        for i in [1, 64, 130] {
            bits.set(i, false);
        }
        assert_eq!(bits.disabled().collect::<Vec<_>>(), vec![1, 64, 130]);

        bits.reset();
        assert_eq!(bits.disabled().count(), 0);
        assert_eq!(bits.disabled_count(), 0);
    }
}
