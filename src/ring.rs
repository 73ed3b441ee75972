//! Lock-free SPSC bounded ring for interrupt/foreground byte transport.
//!
//! # Overview
//! - Single producer, single consumer.
//! - Fixed capacity `N`; all `N` slots are usable.
//! - A full ring rejects writes. Nothing already stored is ever overwritten.
//! - Bulk operations are all-or-nothing: a transfer either moves every item
//!   or leaves the ring untouched.
//!
//! # Memory ordering
//! Cursors run over `[0, 2N)` so that "full" and "empty" are distinguishable
//! without sacrificing a slot. Each cursor is written by exactly one side:
//! the producer owns `head`, the consumer owns `tail`. The producer writes
//! slots first and then publishes `head` with `Release`; the consumer reads
//! `head` with `Acquire` before touching the slots, and hands slots back by
//! publishing `tail` with `Release`.
//!
//! # Notes
//! - `T` is `Copy` so that values can be moved in and out without drops.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

use crate::sync::{AtomicUsize, Ordering};

/// Bounded SPSC ring.
/// Producer and consumer never wait; a full ring refuses, an empty ring yields `None`.
pub struct Ring<T: Copy, const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    slots: [UnsafeCell<MaybeUninit<T>>; N],
}

unsafe impl<T: Copy + Send, const N: usize> Sync for Ring<T, N> {}

impl<T: Copy, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> Ring<T, N> {
    pub const fn new() -> Self {
        assert!(N > 0);
        assert!(N <= usize::MAX / 2);
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            slots: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
        }
    }

    #[inline(always)]
    const fn advance(pos: usize, by: usize) -> usize {
        let next = pos + by;
        if next >= 2 * N { next - 2 * N } else { next }
    }

    #[inline(always)]
    const fn slot_for(pos: usize) -> usize {
        if pos >= N { pos - N } else { pos }
    }

    #[inline(always)]
    const fn distance(head: usize, tail: usize) -> usize {
        if head >= tail {
            head - tail
        } else {
            head + 2 * N - tail
        }
    }

    /// Create the producer handle. Only one producer may be active.
    #[inline]
    pub fn producer(&self) -> Producer<'_, T, N> {
        Producer { ring: self }
    }

    /// Create the consumer handle. Only one consumer may be active.
    #[inline]
    pub fn consumer(&self) -> Consumer<'_, T, N> {
        Consumer { ring: self }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of occupied slots, never more than `N`.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        Self::distance(head, tail).min(N)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Free slots left for the producer.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len()
    }

    #[inline]
    unsafe fn write_slot(&self, pos: usize, value: T) {
        let idx = Self::slot_for(pos);
        unsafe { (*self.slots[idx].get()).as_mut_ptr().write(value) };
    }

    #[inline]
    unsafe fn read_slot(&self, pos: usize) -> T {
        let idx = Self::slot_for(pos);
        unsafe { (*self.slots[idx].get()).assume_init_read() }
    }

    #[inline]
    fn push_inner(&self, value: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if Self::distance(head, tail) == N {
            return false;
        }

        unsafe { self.write_slot(head, value) };
        self.head.store(Self::advance(head, 1), Ordering::Release);
        true
    }

    fn push_bulk_inner(&self, values: &[T]) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if values.len() > N - Self::distance(head, tail) {
            return false;
        }

        for (i, value) in values.iter().enumerate() {
            unsafe { self.write_slot(Self::advance(head, i), *value) };
        }
        self.head.store(Self::advance(head, values.len()), Ordering::Release);
        true
    }

    #[inline]
    fn pop_inner(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let value = unsafe { self.read_slot(tail) };
        self.tail.store(Self::advance(tail, 1), Ordering::Release);
        Some(value)
    }

    fn pop_bulk_inner(&self, out: &mut [T]) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if out.len() > Self::distance(head, tail) {
            return false;
        }

        for (i, dst) in out.iter_mut().enumerate() {
            *dst = unsafe { self.read_slot(Self::advance(tail, i)) };
        }
        self.tail.store(Self::advance(tail, out.len()), Ordering::Release);
        true
    }

    fn discard_inner(&self, count: usize) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if count > Self::distance(head, tail) {
            return false;
        }
        self.tail.store(Self::advance(tail, count), Ordering::Release);
        true
    }

    #[inline]
    fn peek_inner(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        Some(unsafe { self.read_slot(tail) })
    }
}

pub struct Producer<'a, T: Copy, const N: usize> {
    ring: &'a Ring<T, N>,
}

impl<'a, T: Copy, const N: usize> Producer<'a, T, N> {
    /// Store one value. Returns `false` (and stores nothing) when the ring is full.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        self.ring.push_inner(value)
    }

    /// Store every value or none of them.
    #[inline]
    pub fn push_bulk(&self, values: &[T]) -> bool {
        self.ring.push_bulk_inner(values)
    }

    /// Slot index the next push will land in.
    #[inline]
    pub fn write_index(&self) -> usize {
        Ring::<T, N>::slot_for(self.ring.head.load(Ordering::Relaxed))
    }
}

pub struct Consumer<'a, T: Copy, const N: usize> {
    ring: &'a Ring<T, N>,
}

impl<'a, T: Copy, const N: usize> Consumer<'a, T, N> {
    /// Take the oldest value.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        self.ring.pop_inner()
    }

    /// Fill `out` completely from the ring, or take nothing.
    /// The requested count is `out.len()`.
    #[inline]
    pub fn pop_bulk(&self, out: &mut [T]) -> bool {
        self.ring.pop_bulk_inner(out)
    }

    /// Drop the `count` oldest values, or none of them.
    #[inline]
    pub fn discard(&self, count: usize) -> bool {
        self.ring.discard_inner(count)
    }

    /// Copy of the oldest value without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<T> {
        self.ring.peek_inner()
    }
}
