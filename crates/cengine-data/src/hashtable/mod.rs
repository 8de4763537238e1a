// Copyright 2025 eraflo
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

//! A separately chained hash table with a fixed bucket directory.
//!
//! The directory is a [`Vector`] of optional buckets whose length is chosen
//! at construction and never changes: the table does not rehash. A bucket is
//! created on the first insertion that lands in it and is itself a `Vector`
//! of entries, scanned linearly with the table's key equality.

use crate::allocators::SystemAllocator;
use crate::hash::Fnv1aHasher;
use crate::vector::Vector;
use cengine_core::{AllocError, CollectionError, RawAllocator};
use std::fmt;
use std::hash::{Hash, Hasher};


/// Bucket count used by [`HashTable::new`].
pub const DEFAULT_BUCKETS: usize = 64;

/// Decides whether two keys name the same entry.
pub trait KeyEq<K: ?Sized> {
    /// Returns `true` if `a` and `b` are the same key.
    fn key_eq(&self, a: &K, b: &K) -> bool;
}

/// Key equality through `PartialEq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyEquality;

impl<K: PartialEq + ?Sized> KeyEq<K> for KeyEquality {
    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Key equality through a caller-supplied function.
#[derive(Clone, Copy)]
pub struct EqFn<F>(pub F);

impl<K: ?Sized, F: Fn(&K, &K) -> bool> KeyEq<K> for EqFn<F> {
    fn key_eq(&self, a: &K, b: &K) -> bool {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for EqFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EqFn(..)")
    }
}

struct Entry<K, V> {
    key: K,
    value: V,
}

type Bucket<K, V, A> = Vector<Entry<K, V>, A>;

/// A hash table mapping `K` to `V`.
pub struct HashTable<K, V, E = KeyEquality, A: RawAllocator + Clone = SystemAllocator> {
    buckets: Vector<Option<Bucket<K, V, A>>, A>,
    len: usize,
    collisions: usize,
    eq: E,
}

impl<K: Hash + PartialEq, V> HashTable<K, V> {
    /// Creates a table with [`DEFAULT_BUCKETS`] buckets on the process heap.
    pub fn new() -> Result<Self, CollectionError> {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Creates a table with `bucket_count` buckets on the process heap.
    pub fn with_buckets(bucket_count: usize) -> Result<Self, CollectionError> {
        Self::with_buckets_in(bucket_count, KeyEquality, SystemAllocator)
    }
}

impl<K: Hash, V, F: Fn(&K, &K) -> bool> HashTable<K, V, EqFn<F>> {
    /// Creates a table comparing keys with `eq`.
    pub fn with_equality(bucket_count: usize, eq: F) -> Result<Self, CollectionError> {
        Self::with_buckets_in(bucket_count, EqFn(eq), SystemAllocator)
    }
}

impl<K, V, E, A> HashTable<K, V, E, A>
where
    K: Hash,
    E: KeyEq<K>,
    A: RawAllocator + Clone,
{
    /// Creates a table with `bucket_count` buckets, comparing keys with `eq`
    /// and allocating through `alloc`.
    pub fn with_buckets_in(bucket_count: usize, eq: E, alloc: A) -> Result<Self, CollectionError> {
        if bucket_count == 0 {
            return Err(CollectionError::ZeroBuckets);
        }
        let mut buckets = Vector::with_capacity_in(bucket_count, alloc)?;
        buckets.push_n_with(bucket_count, |_| None)?;
        log::debug!("Created hash table with {bucket_count} buckets");
        Ok(Self {
            buckets,
            len: 0,
            collisions: 0,
            eq,
        })
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the fixed size of the bucket directory.
    pub fn bucket_count(&self) -> usize {
        self.buckets.size()
    }

    /// Returns how many insertions landed in an already occupied bucket
    /// since the table was created or last cleared.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Inserts `key -> value`. Returns `Ok(false)`, leaving the table
    /// unchanged, if the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool, AllocError> {
        if self.locate(&key).is_some() {
            return Ok(false);
        }

        let index = self.bucket_index(&key);
        let alloc = self.buckets.allocator().clone();
        let slot = &mut self.buckets[index];
        match slot {
            Some(bucket) => {
                bucket.push(Entry { key, value })?;
                self.collisions += 1;
            }
            None => {
                let mut bucket = Vector::try_new_in(alloc)?;
                bucket.push(Entry { key, value })?;
                *slot = Some(bucket);
            }
        }
        self.len += 1;
        Ok(true)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.locate(key).is_some()
    }

    /// Returns the value stored under `key`.
    pub fn find(&self, key: &K) -> Option<&V> {
        let (index, position) = self.locate(key)?;
        let bucket = self.buckets[index].as_ref()?;
        Some(&bucket[position].value)
    }

    /// Returns the value stored under `key`, mutably.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let (index, position) = self.locate(key)?;
        let bucket = self.buckets[index].as_mut()?;
        Some(&mut bucket[position].value)
    }

    /// Removes `key` and returns its value. An emptied bucket is released.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let (index, position) = self.locate(key)?;
        let slot = &mut self.buckets[index];
        let bucket = slot.as_mut()?;
        let entry = bucket.delete(position);
        if bucket.is_empty() {
            *slot = None;
        }
        self.len -= 1;
        Some(entry.value)
    }

    /// Removes every entry and releases every bucket. The directory keeps its size.
    pub fn clear(&mut self) {
        for slot in self.buckets.iter_mut() {
            *slot = None;
        }
        self.len = 0;
        self.collisions = 0;
    }

    /// Iterates over the entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets
            .iter()
            .flatten()
            .flat_map(|bucket| bucket.iter())
            .map(|entry| (&entry.key, &entry.value))
    }

    fn bucket_index(&self, key: &K) -> usize {
        let mut hasher = Fnv1aHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.size() as u64) as usize
    }

    /// Returns `(bucket index, position in bucket)` of `key`.
    fn locate(&self, key: &K) -> Option<(usize, usize)> {
        let index = self.bucket_index(key);
        let bucket = self.buckets[index].as_ref()?;
        bucket
            .iter()
            .position(|entry| self.eq.key_eq(&entry.key, key))
            .map(|position| (index, position))
    }
}

impl<K, V, E, A> fmt::Debug for HashTable<K, V, E, A>
where
    K: Hash + fmt::Debug,
    V: fmt::Debug,
    E: KeyEq<K>,
    A: RawAllocator + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
