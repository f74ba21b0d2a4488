//! Reusable scratch buffers.
//!
//! Each pool is owned by an [`Index`](crate::Index) handle. A buffer is checked
//! out for one unit of work and handed back, cleared, when its guard drops.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Objects that can be reset to an empty state for reuse.
pub trait Recycle: Default {
    fn recycle(&mut self);

    /// Retained capacity, used to drop oversized objects instead of keeping them.
    fn footprint(&self) -> usize;
}

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) {
        self.clear();
    }

    fn footprint(&self) -> usize {
        self.capacity()
    }
}

/// A bounded free list of `T`.
#[derive(Debug)]
pub struct ScratchPool<T: Recycle> {
    free: Mutex<Vec<T>>,
    max_retained: usize,
    max_footprint: usize,
}

impl<T: Recycle> ScratchPool<T> {
    /// Keeps at most `max_retained` idle objects, each no larger than
    /// `max_footprint`.
    pub fn new(max_retained: usize, max_footprint: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_retained)),
            max_retained,
            max_footprint,
        }
    }

    pub fn acquire(&self) -> Pooled<'_, T> {
        let item = self.free.lock().pop().unwrap_or_default();
        Pooled {
            pool: self,
            item: Some(item),
        }
    }

    /// Number of idle objects currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut item: T) {
        if item.footprint() > self.max_footprint {
            return;
        }
        item.recycle();
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(item);
        }
    }
}

/// Checked-out pool object. Returned to its pool on drop.
pub struct Pooled<'a, T: Recycle> {
    pool: &'a ScratchPool<T>,
    item: Option<T>,
}

impl<T: Recycle> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `Drop` takes the item.
        match self.item.as_ref() {
            Some(item) => item,
            None => unreachable!("pooled item taken before drop"),
        }
    }
}

impl<T: Recycle> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.item.as_mut() {
            Some(item) => item,
            None => unreachable!("pooled item taken before drop"),
        }
    }
}

impl<T: Recycle> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

/// The buffers one index handle draws from.
#[derive(Debug)]
pub struct ScratchPools {
    /// Intermediate JSON and decompression output.
    pub scratch: ScratchPool<Vec<u8>>,
    /// Encoded request bodies.
    pub payload: ScratchPool<Vec<u8>>,
}

impl ScratchPools {
    pub fn new(workers: usize) -> Self {
        let retained = workers.max(1) * 2;
        Self {
            scratch: ScratchPool::new(retained, 1 << 20),
            payload: ScratchPool::new(retained, 8 << 20),
        }
    }
}

impl Default for ScratchPools {
    fn default() -> Self {
        Self::new(crate::settings::default_parallelism())
    }
}
