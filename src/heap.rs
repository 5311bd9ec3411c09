//! Bounded heap that keeps the `k` most extreme values of a stream.
//!
//! [`FloatHeap`] holds at most `capacity` `(value, index)` pairs. It is laid
//! out as a binary heap whose root is the *weakest* retained element (the
//! smallest for [`HeapOrder::KeepLargest`], the largest for
//! [`HeapOrder::KeepSmallest`]), so deciding whether a challenger gets in is a
//! single comparison against the root.
//!
//! # Missing values
//! Values are stored as `Option<NotNan<f64>>`; a NaN pushed into the heap is
//! held as `None`, which is weaker than every real number in either
//! orientation. A missing value can fill a free slot but never evicts a real
//! value, and any real challenger evicts it once the heap is full.
//!
//! # Ties
//! A challenger equal in strength to the weakest retained element is
//! rejected. Among retained elements of equal strength the later-pushed one
//! is treated as weaker, so earlier pushes always win.

use ordered_float::NotNan;
use std::cmp::Ordering;

/// Which end of the value range the heap keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeapOrder {
    /// Keep the largest values (top-k).
    KeepLargest,
    /// Keep the smallest values (bottom-k).
    KeepSmallest,
}

/// A value paired with the index of the series it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValIndex {
    pub val: f64,
    pub index: usize,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    val: Option<NotNan<f64>>,
    index: usize,
    seq: u64,
}

impl Entry {
    fn into_pair(self) -> ValIndex {
        ValIndex { val: self.val.map_or(f64::NAN, NotNan::into_inner), index: self.index }
    }
}

/// Fixed-capacity min/max heap over `f64` values. Reused across groups and
/// steps: every flush leaves it empty with its storage intact.
#[derive(Clone, Debug)]
pub struct FloatHeap {
    order: HeapOrder,
    capacity: usize,
    entries: Vec<Entry>,
    next_seq: u64,
}

impl FloatHeap {
    #[must_use]
    pub fn new(order: HeapOrder, capacity: usize) -> Self {
        Self { order, capacity, entries: Vec::with_capacity(capacity), next_seq: 0 }
    }

    /// `take_top` selects [`HeapOrder::KeepLargest`].
    #[must_use]
    pub fn with_top(take_top: bool, capacity: usize) -> Self {
        let order = if take_top { HeapOrder::KeepLargest } else { HeapOrder::KeepSmallest };
        Self::new(order, capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn order(&self) -> HeapOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The weakest retained pair, i.e. the next one to be evicted.
    pub fn peek_weakest(&self) -> Option<ValIndex> {
        self.entries.first().map(|e| e.into_pair())
    }

    /// Offer a value. Returns `true` if it was retained.
    pub fn push(&mut self, val: f64, index: usize) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let entry = Entry { val: NotNan::new(val).ok(), index, seq: self.next_seq };
        self.next_seq += 1;

        if self.entries.len() < self.capacity {
            self.entries.push(entry);
            self.sift_up(self.entries.len() - 1);
            return true;
        }

        if self.strength(entry.val, self.entries[0].val) != Ordering::Greater {
            return false;
        }
        self.entries[0] = entry;
        self.sift_down(0);
        true
    }

    /// Drain every retained pair in no particular order.
    pub fn flush(&mut self) -> Vec<ValIndex> {
        self.next_seq = 0;
        self.entries.drain(..).map(Entry::into_pair).collect()
    }

    /// Drain every retained pair, most extreme first. Pairs of equal
    /// strength come out in push order.
    pub fn ordered_flush(&mut self) -> Vec<ValIndex> {
        let order = self.order;
        self.entries
            .sort_unstable_by(|a, b| cmp_strength(order, b.val, a.val).then(a.seq.cmp(&b.seq)));
        self.flush()
    }

    /// Drop every retained pair without returning them. [`flush`](Self::flush)
    /// and [`ordered_flush`](Self::ordered_flush) already leave the heap in
    /// this state.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }

    fn strength(&self, a: Option<NotNan<f64>>, b: Option<NotNan<f64>>) -> Ordering {
        cmp_strength(self.order, a, b)
    }

    /// `a` must sit above `b` in the heap: weaker, or as strong but pushed later.
    fn above(&self, a: &Entry, b: &Entry) -> bool {
        match self.strength(a.val, b.val) {
            Ordering::Less => true,
            Ordering::Equal => a.seq > b.seq,
            Ordering::Greater => false,
        }
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.above(&self.entries[idx], &self.entries[parent]) {
                break;
            }
            self.entries.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut top = idx;
            if left < len && self.above(&self.entries[left], &self.entries[top]) {
                top = left;
            }
            if right < len && self.above(&self.entries[right], &self.entries[top]) {
                top = right;
            }
            if top == idx {
                return;
            }
            self.entries.swap(idx, top);
            idx = top;
        }
    }
}

/// `Greater` when `a` is more extreme than `b` under `order`. Missing is
/// weaker than any real value.
fn cmp_strength(order: HeapOrder, a: Option<NotNan<f64>>, b: Option<NotNan<f64>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match order {
            HeapOrder::KeepLargest => x.cmp(&y),
            HeapOrder::KeepSmallest => y.cmp(&x),
        },
    }
}
