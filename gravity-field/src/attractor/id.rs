// Copyright 2025 John Brosnihan
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
//! Attractor identity and id allocation
//!
//! Attractors are identified by an index plus a generation counter. When an
//! attractor is destroyed its slot is recycled with a bumped generation, so a
//! stale id can never alias a newer attractor.

use std::fmt;

/// Generational identifier of an attractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttractorId {
    index: u32,
    generation: u32,
}

impl AttractorId {
    /// Create an id from a raw index and generation
    pub fn new(index: u32, generation: u32) -> Self {
        AttractorId { index, generation }
    }

    /// Get the slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation number
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for AttractorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attractor({}, gen: {})", self.index, self.generation)
    }
}

/// Allocator handing out generational attractor ids
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    alive_count: usize,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id, reusing a released slot when one is available
    pub(crate) fn allocate(&mut self) -> AttractorId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.alive.push(false);
                index
            }
        };

        self.alive[index as usize] = true;
        self.alive_count += 1;
        AttractorId::new(index, self.generations[index as usize])
    }

    /// Release an id
    ///
    /// Increments the slot generation to invalidate old references. Returns
    /// false if the id was not alive.
    pub(crate) fn release(&mut self, id: AttractorId) -> bool {
        if !self.is_alive(id) {
            return false;
        }

        let slot = id.index as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(id.index);
        self.alive_count -= 1;
        true
    }

    /// Check whether an id refers to a live slot
    pub(crate) fn is_alive(&self, id: AttractorId) -> bool {
        let slot = id.index as usize;
        slot < self.generations.len() && self.alive[slot] && self.generations[slot] == id.generation
    }

    pub(crate) fn alive_count(&self) -> usize {
        self.alive_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        let a = AttractorId::new(1, 0);
        let b = AttractorId::new(1, 0);
        let c = AttractorId::new(1, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "Attractor(1, gen: 0)");
    }

    #[test]
    fn test_allocate_release_cycle() {
        let mut ids = IdAllocator::new();

        let first = ids.allocate();
        let second = ids.allocate();
        assert_ne!(first, second);
        assert_eq!(ids.alive_count(), 2);

        assert!(ids.release(first));
        assert!(!ids.is_alive(first));
        assert!(!ids.release(first));

        // The freed slot comes back with a new generation
        let reused = ids.allocate();
        assert_eq!(reused.index(), first.index());
        assert_ne!(reused.generation(), first.generation());
        assert!(ids.is_alive(reused));
        assert!(!ids.is_alive(first));
    }

    #[test]
    fn test_unknown_id_not_alive() {
        let ids = IdAllocator::new();
        assert!(!ids.is_alive(AttractorId::new(5, 0)));
    }
}
