//! Size-bucketed buffer reuse (C6).
//!
//! Grounded directly on the original `TryAllocateBuffer`/`UpdateTick`/
//! `DeallocateBuffer`/`RemoveBuffer` state machine: buffers are tracked by
//! size in a `BTreeMap` so a request can scan upward from its exact size to
//! `factor * size` looking for a near-fit before paying for a fresh
//! allocation.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BufferId(u64);

#[derive(Debug)]
pub struct Buffer {
    pub id: BufferId,
    pub size: u64,
}

#[derive(Debug)]
pub struct BufferPool {
    aging_threshold: u32,
    size_class_factor: u64,

    by_size: BTreeMap<u64, Vec<BufferId>>,
    sizes: std::collections::HashMap<BufferId, u64>,
    used: HashSet<BufferId>,
    unused_time: std::collections::HashMap<BufferId, u32>,
    pending_delete: HashSet<BufferId>,
    next_id: u64,
}

impl BufferPool {
    pub fn new(aging_threshold: u32, size_class_factor: u64) -> Self {
        BufferPool {
            aging_threshold,
            size_class_factor,
            by_size: BTreeMap::new(),
            sizes: std::collections::HashMap::new(),
            used: HashSet::new(),
            unused_time: std::collections::HashMap::new(),
            pending_delete: HashSet::new(),
            next_id: 0,
        }
    }

    /// Find a non-leased, non-pending buffer whose size lies in
    /// `[size, factor * size]`, or allocate a new one of exactly `size`.
    /// Leasing a buffer is invariant-preserving: a leased buffer is never in
    /// `pending_delete` — leasing removes it from the aging tracker the
    /// moment it is handed out, and it only re-enters aging after a matching
    /// `deallocate`.
    pub fn try_allocate(&mut self, size: u64) -> BufferId {
        let max_size = size.saturating_mul(self.size_class_factor);
        let found = self
            .by_size
            .range(size..=max_size)
            .flat_map(|(_, ids)| ids.iter())
            .find(|id| !self.used.contains(id) && !self.pending_delete.contains(id))
            .copied();

        let id = match found {
            Some(id) => id,
            None => self.allocate_fresh(size),
        };

        self.used.insert(id);
        self.unused_time.remove(&id);
        self.update_tick();
        id
    }

    fn allocate_fresh(&mut self, size: u64) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.sizes.insert(id, size);
        self.by_size.entry(size).or_default().push(id);
        id
    }

    pub fn deallocate(&mut self, id: BufferId) {
        self.used.remove(&id);
        self.unused_time.insert(id, 0);
    }

    pub fn update_tick(&mut self) {
        let mut newly_stale = Vec::new();
        for (id, ticks) in self.unused_time.iter_mut() {
            *ticks += 1;
            if *ticks > self.aging_threshold {
                newly_stale.push(*id);
            }
        }
        for id in newly_stale {
            self.unused_time.remove(&id);
            self.pending_delete.insert(id);
        }
    }

    /// Physically forget a buffer. Only valid once it has aged past the
    /// threshold and landed in `pending_delete`.
    pub fn remove(&mut self, id: BufferId) -> Result<()> {
        if !self.pending_delete.remove(&id) {
            return Err(Error::BufferNotMarkedForDeletion);
        }
        if let Some(size) = self.sizes.remove(&id) {
            if let Some(ids) = self.by_size.get_mut(&size) {
                ids.retain(|&x| x != id);
                if ids.is_empty() {
                    self.by_size.remove(&size);
                }
            }
        }
        Ok(())
    }

    pub fn is_leased(&self, id: BufferId) -> bool {
        self.used.contains(&id)
    }

    pub fn size_of(&self, id: BufferId) -> Option<u64> {
        self.sizes.get(&id).copied()
    }

    pub fn stats(&self) -> PoolStats {
        let total_allocated: u64 = self.sizes.values().sum();
        let unused: u64 = self
            .sizes
            .iter()
            .filter(|(id, _)| !self.used.contains(id))
            .map(|(_, size)| *size)
            .sum();
        PoolStats {
            total_allocated_bytes: total_allocated,
            unused_bytes: unused,
            buffer_count: self.sizes.len(),
            pending_delete_count: self.pending_delete.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    pub total_allocated_bytes: u64,
    pub unused_bytes: u64,
    pub buffer_count: usize,
    pub pending_delete_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leased_buffer_is_never_pending_delete() {
        let mut pool = BufferPool::new(1, 8);
        let id = pool.try_allocate(16);
        for _ in 0..10 {
            pool.update_tick();
        }
        assert!(pool.is_leased(id));
        assert!(pool.remove(id).is_err());
    }

    #[test]
    fn a_deallocated_buffer_eventually_becomes_pending_and_removable() {
        let mut pool = BufferPool::new(2, 8);
        let id = pool.try_allocate(16);
        pool.deallocate(id);
        for _ in 0..4 {
            pool.update_tick();
        }
        assert!(pool.remove(id).is_ok());
    }

    #[test]
    fn a_retired_buffer_within_the_size_class_is_reused() {
        let mut pool = BufferPool::new(512, 8);
        let first = pool.try_allocate(16);
        pool.deallocate(first);
        let second = pool.try_allocate(10);
        assert_eq!(first, second);
    }

    #[test]
    fn a_request_far_outside_the_size_class_allocates_fresh() {
        let mut pool = BufferPool::new(512, 2);
        let first = pool.try_allocate(10);
        pool.deallocate(first);
        let second = pool.try_allocate(1000);
        assert_ne!(first, second);
    }

    #[test]
    fn remove_before_pending_delete_is_an_error() {
        let mut pool = BufferPool::new(512, 8);
        let id = pool.try_allocate(4);
        pool.deallocate(id);
        assert!(pool.remove(id).is_err());
    }
}
