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

use super::{Vector, DEFAULT_CAPACITY};
use crate::allocators::failing::FailingAllocator;
use crate::allocators::TrackingAllocator;
use cengine_core::{AllocError, MemoryCounters};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

fn assert_invariant<T, A: cengine_core::RawAllocator>(v: &Vector<T, A>) {
    assert!(
        v.size() <= v.capacity(),
        "size {} exceeds capacity {}",
        v.size(),
        v.capacity()
    );
}

/// Counts how many times it has been dropped.
#[derive(Debug, Clone)]
struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

// --- CONSTRUCTION ---

#[test]
fn new_is_unallocated() {
    let v: Vector<u32> = Vector::new();
    assert!(!v.is_allocated());
    assert_eq!(v.size(), 0);
    assert_eq!(v.capacity(), 0);
    assert!(v.is_empty());
    assert!(v.is_full());
}

#[test]
fn try_new_uses_default_capacity() {
    let v: Vector<u32> = Vector::try_new().unwrap();
    assert_eq!(v.capacity(), DEFAULT_CAPACITY);
    assert_eq!(v.size(), 0);
}

#[test]
fn first_push_on_unallocated_vector_allocates_default_capacity() {
    let mut v = Vector::new();
    v.push(7u8).unwrap();
    assert_eq!(v.capacity(), DEFAULT_CAPACITY);
    assert_eq!(v, [7]);
}

#[test]
fn with_capacity_zero_stays_unallocated() {
    let v: Vector<u64> = Vector::with_capacity(0).unwrap();
    assert!(!v.is_allocated());
}

// --- GROWTH ---

#[test]
fn fifth_push_into_four_slots_doubles_capacity() {
    let mut v = Vector::with_capacity(4).unwrap();
    for value in 1..=4 {
        v.push(value).unwrap();
        assert_eq!(v.capacity(), 4, "no growth before the buffer is full");
    }
    assert!(v.is_full());

    v.push(5).unwrap();
    assert_eq!(v.capacity(), 8);
    assert_eq!(v.size(), 5);
    assert_eq!(v, [1, 2, 3, 4, 5]);
}

#[test]
fn growth_happens_exactly_once_per_full_buffer() {
    let capacity = 16;
    let mut v = Vector::with_capacity(capacity).unwrap();
    let mut growths = 0;
    let mut last_capacity = v.capacity();

    for value in 0..=capacity {
        v.push(value).unwrap();
        if v.capacity() != last_capacity {
            growths += 1;
            assert_eq!(v.capacity(), last_capacity * 2);
            last_capacity = v.capacity();
        }
        assert_invariant(&v);
    }
    assert_eq!(growths, 1);
    assert_eq!(v.capacity(), 2 * capacity);
}

#[test]
fn insert_n_keeps_doubling_until_it_fits() {
    let mut v = Vector::with_capacity(2).unwrap();
    v.push(0u32).unwrap();
    let inserted = v.push_n_with(9, |i| i as u32 + 1).unwrap();
    assert_eq!(inserted.len(), 9);
    assert_eq!(v.capacity(), 16);
    assert_eq!(v, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn reserve_only_grows() {
    let mut v: Vector<u16> = Vector::with_capacity(8).unwrap();
    v.reserve(4).unwrap();
    assert_eq!(v.capacity(), 8);
    v.reserve(20).unwrap();
    assert_eq!(v.capacity(), 20);
    assert_eq!(v.size(), 0);
}

// --- SHRINK ---

#[test]
fn popping_down_to_a_quarter_halves_capacity() {
    let mut v = Vector::with_capacity(8).unwrap();
    for value in 1..=8 {
        v.push(value).unwrap();
    }
    assert_eq!(v.capacity(), 8);

    for expected_size in (3..=7).rev() {
        v.pop().unwrap();
        assert_eq!(v.size(), expected_size);
        assert_eq!(v.capacity(), 8, "no shrink while size > capacity / 4");
    }

    v.pop().unwrap();
    assert_eq!(v.size(), 2);
    assert_eq!(v.capacity(), 4);
    assert_eq!(v, [1, 2]);
}

#[test]
fn shrink_never_goes_below_size_or_to_zero() {
    let mut v = Vector::with_capacity(8).unwrap();
    for value in 0..8 {
        v.push(value).unwrap();
    }
    while v.pop().is_some() {
        assert_invariant(&v);
        assert!(v.capacity() >= 1);
    }
    assert!(v.is_allocated());
    assert_eq!(v.capacity(), 1);
}

#[test]
fn fit_trims_to_size() {
    let mut v = Vector::with_capacity(32).unwrap();
    v.push(1u8).unwrap();
    v.push(2u8).unwrap();
    v.fit().unwrap();
    assert_eq!(v.capacity(), 2);

    let mut empty: Vector<u8> = Vector::with_capacity(8).unwrap();
    empty.fit().unwrap();
    assert_eq!(empty.capacity(), 1);
}

// --- POP / PUSH ---

#[test]
fn push_then_pop_round_trips() {
    let mut v = Vector::try_new().unwrap();
    v.push(10).unwrap();
    v.push(20).unwrap();
    let before = v.size();

    v.push(99).unwrap();
    assert_eq!(v.pop(), Some(99));
    assert_eq!(v.size(), before);
}

#[test]
fn pop_on_empty_returns_none_and_changes_nothing() {
    let mut v: Vector<i32> = Vector::with_capacity(4).unwrap();
    assert_eq!(v.pop(), None);
    assert_eq!(v.capacity(), 4);
    assert_eq!(v.size(), 0);

    let mut unallocated: Vector<i32> = Vector::new();
    assert_eq!(unallocated.pop(), None);
    assert!(!unallocated.is_allocated());
}

#[test]
fn push_front_prepends() {
    let mut v = Vector::new();
    v.push_front(3).unwrap();
    v.push_front(2).unwrap();
    v.push_front(1).unwrap();
    assert_eq!(v, [1, 2, 3]);
}

// --- INSERT / DELETE ---

#[test]
fn insert_preserves_order_of_the_tail() {
    let mut v = Vector::from_slice(&[10, 20, 30, 40]).unwrap();
    v.insert(1, 15).unwrap();
    assert_eq!(v[1], 15);
    assert_eq!(v, [10, 15, 20, 30, 40]);

    v.insert(v.size(), 50).unwrap();
    assert_eq!(v.last(), Some(&50));
}

#[test]
fn insert_n_opens_a_gap_in_one_move() {
    let mut v = Vector::from_slice(&['a', 'e']).unwrap();
    let gap = v.insert_n_with(1, 3, |i| (b'b' + i as u8) as char).unwrap();
    assert_eq!(gap, ['b', 'c', 'd']);
    assert_eq!(v, ['a', 'b', 'c', 'd', 'e']);
}

#[test]
#[should_panic(expected = "insertion index")]
fn insert_past_the_end_panics() {
    let mut v = Vector::from_slice(&[1, 2]).unwrap();
    let _ = v.insert(3, 9);
}

#[test]
fn delete_from_the_middle_closes_the_gap() {
    let mut v = Vector::from_slice(&[10, 20, 30]).unwrap();
    assert_eq!(v.delete(1), 20);
    assert_eq!(v, [10, 30]);
    assert_eq!(v.size(), 2);
}

#[test]
fn delete_n_removes_a_range_and_shrinks_once() {
    let mut v = Vector::with_capacity(16).unwrap();
    for value in 0..12 {
        v.push(value).unwrap();
    }
    v.delete_n(2, 8);
    assert_eq!(v, [0, 1, 10, 11]);
    assert_eq!(v.capacity(), 8);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn delete_n_out_of_range_panics() {
    let mut v = Vector::from_slice(&[1, 2, 3]).unwrap();
    v.delete_n(2, 2);
}

#[test]
#[should_panic(expected = "removal index")]
fn delete_on_empty_panics() {
    let mut v: Vector<u8> = Vector::new();
    v.delete(0);
}

#[test]
fn invariant_holds_across_mixed_operations() {
    let mut v = Vector::new();
    for round in 0..200usize {
        match round % 5 {
            0 | 1 => v.push(round).unwrap(),
            2 => v.insert(v.size() / 2, round).unwrap(),
            3 => {
                v.pop();
            }
            _ => {
                if !v.is_empty() {
                    v.delete(0);
                }
            }
        }
        assert_invariant(&v);
    }
}

#[test]
fn removing_nothing_leaves_capacity_alone() {
    let mut empty: Vector<u32> = Vector::try_new().unwrap();
    empty.clear();
    empty.clear();
    assert_eq!(empty.capacity(), DEFAULT_CAPACITY);
    assert_eq!(empty.size(), 0);

    let mut v = Vector::from_slice(&[1, 2]).unwrap();
    v.reserve(8).unwrap();
    v.delete_n(1, 0);
    v.delete_n(2, 0);
    assert_eq!(v.capacity(), 8);
    assert_eq!(v, [1, 2]);
}

// --- SUPPLEMENTARY OPERATIONS ---

#[test]
fn clear_drops_everything_and_applies_one_shrink() {
    let mut v = Vector::with_capacity(8).unwrap();
    v.try_extend(0..6).unwrap();
    v.clear();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), 4);
}

#[test]
fn fill_swap_and_sort() {
    let mut v = Vector::from_slice(&[5, 3, 9, 1]).unwrap();
    v.swap(0, 3);
    assert_eq!(v, [1, 3, 9, 5]);
    v.sort();
    assert_eq!(v, [1, 3, 5, 9]);
    v.fill(0);
    assert_eq!(v, [0, 0, 0, 0]);
}

#[test]
fn append_slice_concatenates() {
    let mut a = Vector::from_slice(&[1, 2]).unwrap();
    let b = Vector::from_slice(&[3, 4, 5]).unwrap();
    a.append_slice(&b).unwrap();
    assert_eq!(a, [1, 2, 3, 4, 5]);
}

#[test]
fn copy_from_replaces_contents() {
    let mut v = Vector::from_slice(&[9, 9, 9, 9]).unwrap();
    v.copy_from(&[1, 2]).unwrap();
    assert_eq!(v, [1, 2]);
    assert_eq!(v.capacity(), 4);
}

#[test]
fn begin_end_span_the_elements() {
    let v = Vector::from_slice(&[1u32, 2, 3]).unwrap();
    let range = v.as_ptr_range();
    assert_eq!(range.start, v.as_ptr());
    assert_eq!(unsafe { range.end.offset_from(range.start) }, 3);
}

#[test]
fn clone_is_deep_and_keeps_capacity() {
    let mut original = Vector::with_capacity(8).unwrap();
    original.try_extend([1, 2, 3]).unwrap();
    let copy = original.clone();
    original.push(4).unwrap();
    assert_eq!(copy, [1, 2, 3]);
    assert_eq!(copy.capacity(), 8);
}

#[test]
fn iterates_by_reference() {
    let mut v = Vector::from_slice(&[1, 2, 3]).unwrap();
    for value in &mut v {
        *value *= 10;
    }
    let sum: i32 = (&v).into_iter().sum();
    assert_eq!(sum, 60);
}

// --- OWNERSHIP ---

#[test]
fn elements_are_dropped_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    {
        let mut v = Vector::new();
        for _ in 0..10 {
            v.push(DropCounter(drops.clone())).unwrap();
        }
        drop(v.pop());
        assert_eq!(drops.get(), 1);
        drop(v.delete(0));
        assert_eq!(drops.get(), 2);
        v.delete_n(0, 3);
        assert_eq!(drops.get(), 5);
    }
    assert_eq!(drops.get(), 10);
}

#[test]
fn free_releases_the_buffer() {
    let counters = Arc::new(MemoryCounters::new());
    let mut v = Vector::try_new_in(TrackingAllocator::new(counters.clone())).unwrap();
    v.try_extend(0u64..100).unwrap();
    assert!(counters.current_bytes() > 0);

    v.free();
    assert!(counters.snapshot().is_balanced());
}

#[test]
fn growth_and_shrink_go_through_reallocate() {
    let counters = Arc::new(MemoryCounters::new());
    let mut v = Vector::with_capacity_in(4, TrackingAllocator::new(counters.clone())).unwrap();
    v.try_extend(0u32..5).unwrap();
    assert_eq!(counters.current_bytes(), 8 * 4);

    while v.size() > 2 {
        v.pop();
    }
    assert_eq!(v.capacity(), 4);
    assert_eq!(counters.current_bytes(), 4 * 4);

    let stats = counters.snapshot();
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.reallocations, 2);
}

#[test]
fn zero_sized_elements_follow_the_same_policy() {
    let mut v = Vector::with_capacity(2).unwrap();
    v.push(()).unwrap();
    v.push(()).unwrap();
    v.push(()).unwrap();
    assert_eq!(v.capacity(), 4);
    assert_eq!(v.size(), 3);
    v.pop();
    v.pop();
    assert_eq!(v.capacity(), 2);
}

// --- ALLOCATION FAILURE ---

#[test]
fn failed_init_reports_the_error() {
    let result = Vector::<u32, _>::try_new_in(FailingAllocator::new(0));
    assert!(matches!(
        result,
        Err(AllocError::OutOfMemory {
            requested_bytes: 32
        })
    ));
}

#[test]
fn failed_growth_leaves_the_vector_unchanged() {
    let alloc = FailingAllocator::new(1);
    let mut v = Vector::with_capacity_in(2, alloc.clone()).unwrap();
    v.push(1).unwrap();
    v.push(2).unwrap();

    assert!(v.push(3).is_err());
    assert_eq!(v, [1, 2]);
    assert_eq!(v.capacity(), 2);

    assert!(v.insert(0, 0).is_err());
    assert!(v.push_n_with(4, |i| i as i32).is_err());
    assert_eq!(v, [1, 2]);

    alloc.set_budget(1);
    v.push(3).unwrap();
    assert_eq!(v, [1, 2, 3]);
    assert_eq!(v.capacity(), 4);
}

#[test]
fn failed_shrink_keeps_the_larger_buffer() {
    let alloc = FailingAllocator::new(1);
    let mut v = Vector::with_capacity_in(8, alloc).unwrap();
    v.try_extend([1, 2, 3]).unwrap();

    assert_eq!(v.pop(), Some(3));
    assert_eq!(v.capacity(), 8);
    assert_eq!(v, [1, 2]);
}

#[test]
fn failed_copy_from_leaves_contents() {
    let alloc = FailingAllocator::new(1);
    let mut v = Vector::with_capacity_in(2, alloc).unwrap();
    v.try_extend([7, 8]).unwrap();

    assert!(v.copy_from(&[1, 2, 3, 4]).is_err());
    assert_eq!(v, [7, 8]);
}

#[test]
fn capacity_overflow_is_reported() {
    let mut v: Vector<u64> = Vector::new();
    assert_eq!(v.reserve(usize::MAX), Err(AllocError::CapacityOverflow));
    assert!(!v.is_allocated());
}
