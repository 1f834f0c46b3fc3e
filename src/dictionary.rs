//! Recency dictionary used to classify and reconstruct WK words.
//!
//! A most-recently-used queue with a fixed capacity: full hits and
//! reconstructed partial matches move to the front, misses are inserted
//! at the front and evict the tail once the dictionary is full. Kept as
//! a plain `Vec<u64>` scanned linearly rather than indexed by a hash
//! map, since MRU reordering already touches an unbounded prefix of the
//! list on every hit and a hash index would need rebuilding at the same
//! cost; dictionaries stay small enough in practice for the scan to be
//! cheap.

/// Ordered recency queue, MRU at index 0, bounded by `capacity`.
#[derive(Clone, Debug)]
pub struct Dictionary {
    entries: Vec<u64>,
    capacity: usize,
}

impl Dictionary {
    /// New dictionary seeded with a single `0` entry. The seed is not
    /// counted against `capacity` and is logically unreachable by
    /// HIT/PARTIAL, since any word equal to zero is tagged ZERO before
    /// dictionary lookup happens at all.
    pub fn new(capacity: usize) -> Self {
        Dictionary {
            entries: vec![0],
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    /// First index whose stored word equals `w`.
    pub fn find_full(&self, w: u64) -> Option<usize> {
        self.entries.iter().position(|&e| e == w)
    }

    /// First index whose stored word's high bits (under split `low_bit_mask`)
    /// equal `high(w)`. Callers must test `find_full` first so an exact
    /// match always wins over a high-bits-only match.
    pub fn find_high(&self, w: u64, low_bit_mask: u64) -> Option<usize> {
        let target_high = w & !low_bit_mask;
        self.entries
            .iter()
            .position(|&e| (e & !low_bit_mask) == target_high)
    }

    pub fn get(&self, index: usize) -> u64 {
        self.entries[index]
    }

    /// Promote the entry at `i` to the front, unchanged otherwise. No-op
    /// for `i == 0`.
    pub fn touch_full(&mut self, i: usize) {
        if i > 0 {
            let w = self.entries.remove(i);
            self.entries.insert(0, w);
        }
    }

    /// Replace the PARTIAL match at `i` with the fully reconstructed
    /// word `w_new`. At `i == 0` this replaces in place with no
    /// reordering; otherwise the old entry is removed and `w_new` is
    /// inserted at the front.
    pub fn replace_partial(&mut self, i: usize, w_new: u64) {
        if i == 0 {
            self.entries[0] = w_new;
        } else {
            self.entries.remove(i);
            self.entries.insert(0, w_new);
        }
    }

    /// Insert a MISS word at the front, evicting the tail entry once
    /// the dictionary is at capacity.
    pub fn insert_miss(&mut self, w: u64) {
        if self.entries.len() < self.capacity {
            self.entries.insert(0, w);
        } else {
            self.entries.pop();
            self.entries.insert(0, w);
        }
    }
}
