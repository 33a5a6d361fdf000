// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Valid/invalid member buckets of a container.
//!
//! A [`Partition`] keeps each member in exactly one of two sorted buckets.
//! Sorting depends on arena data the partition cannot see, so every operation
//! that needs it takes a [`BucketOrder`]: one comparator per bucket, passed
//! explicitly by the container.

use std::cmp::Ordering;

/// Comparator of one bucket.
pub type Comparator<'a, K> = &'a dyn Fn(&K, &K) -> Ordering;

/// Comparators for the valid and invalid buckets.
pub struct BucketOrder<'a, K> {
    pub valid: Comparator<'a, K>,
    pub invalid: Comparator<'a, K>,
}

impl<'a, K> BucketOrder<'a, K> {
    /// Same comparator for both buckets.
    pub fn uniform(cmp: Comparator<'a, K>) -> Self {
        Self {
            valid: cmp,
            invalid: cmp,
        }
    }

    fn of(&self, valid: bool) -> Comparator<'a, K> {
        if valid {
            self.valid
        } else {
            self.invalid
        }
    }
}

#[derive(Debug, Clone)]
pub struct Partition<K> {
    valid: Vec<K>,
    invalid: Vec<K>,
}

impl<K: Copy + Eq> Partition<K> {
    pub fn new() -> Self {
        Self {
            valid: Vec::new(),
            invalid: Vec::new(),
        }
    }

    pub fn valid(&self) -> &[K] {
        &self.valid
    }

    pub fn invalid(&self) -> &[K] {
        &self.invalid
    }

    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }

    /// Valid members first, then invalid ones.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.valid.iter().chain(self.invalid.iter())
    }

    pub fn contains(&self, key: K) -> bool {
        self.residency(key).is_some()
    }

    /// `Some(true)` if `key` sits in the valid bucket, `Some(false)` for the
    /// invalid one, `None` if it is not a member.
    pub fn residency(&self, key: K) -> Option<bool> {
        if self.valid.contains(&key) {
            Some(true)
        } else if self.invalid.contains(&key) {
            Some(false)
        } else {
            None
        }
    }

    /// Inserts `key` into the bucket matching `valid`, or moves it there if
    /// it is already a member.
    pub fn insert(&mut self, key: K, valid: bool, order: &BucketOrder<'_, K>) {
        self.relocate(key, valid, order);
    }

    /// Moves `key` into the bucket matching `valid`.
    ///
    /// A member already in that bucket is left alone. Returns `true` if the
    /// key was moved or inserted.
    pub fn relocate(&mut self, key: K, valid: bool, order: &BucketOrder<'_, K>) -> bool {
        match self.residency(key) {
            Some(current) if current == valid => false,
            Some(current) => {
                Self::take(self.bucket_mut(current), key, order.of(current));
                Self::put(self.bucket_mut(valid), key, order.of(valid));
                true
            }
            None => {
                Self::put(self.bucket_mut(valid), key, order.of(valid));
                true
            }
        }
    }

    /// Removes `key` from whichever bucket holds it.
    pub fn remove(&mut self, key: K, order: &BucketOrder<'_, K>) -> bool {
        match self.residency(key) {
            Some(current) => Self::take(self.bucket_mut(current), key, order.of(current)),
            None => false,
        }
    }

    /// Empties both buckets, returning the former members.
    pub fn clear(&mut self) -> Vec<K> {
        let mut out = std::mem::take(&mut self.valid);
        out.append(&mut self.invalid);
        out
    }

    fn bucket_mut(&mut self, valid: bool) -> &mut Vec<K> {
        if valid {
            &mut self.valid
        } else {
            &mut self.invalid
        }
    }

    /// Inserts after any equal elements, so ties keep arrival order.
    fn put(bucket: &mut Vec<K>, key: K, cmp: Comparator<'_, K>) {
        let at = bucket.partition_point(|member| cmp(member, &key) != Ordering::Greater);
        bucket.insert(at, key);
    }

    fn take(bucket: &mut Vec<K>, key: K, cmp: Comparator<'_, K>) -> bool {
        // Binary search first; fall back to a scan when the member's sort key
        // changed since it was inserted
        let at = bucket
            .binary_search_by(|member| cmp(member, &key))
            .ok()
            .filter(|&i| bucket[i] == key)
            .or_else(|| bucket.iter().position(|k| *k == key));
        match at {
            Some(i) => {
                bucket.remove(i);
                true
            }
            None => false,
        }
    }
}

impl<K: Copy + Eq> Default for Partition<K> {
    fn default() -> Self {
        Self::new()
    }
}
