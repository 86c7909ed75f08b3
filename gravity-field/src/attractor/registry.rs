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
//! Registry of live attractors
//!
//! The registry holds every active attractor and tracks which of them are
//! static. Static attractors feed the baker; dynamic ones are summed directly
//! at query time.
//!
//! Entries are keyed by [`AttractorId`]. Exclusion lists compare ids, never
//! attractor values, so two identical bodies are still distinct sources.

use super::{Attractor, AttractorId};
use std::collections::{HashMap, HashSet};

struct Entry {
    id: AttractorId,
    attractor: Attractor,
}

/// Registry of live attractors partitioned into static and dynamic sets
///
/// # Thread Safety
///
/// Mutation requires `&mut self`, sampling only `&self`, so registration can
/// never overlap a sampling pass. Hosts that register from several threads
/// should queue commands and apply them between simulation steps.
#[derive(Default)]
pub struct AttractorRegistry {
    entries: Vec<Entry>,
    index: HashMap<AttractorId, usize>,
    static_ids: HashSet<AttractorId>,
}

impl AttractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attractor under `id`
    ///
    /// Adds the attractor to the "all" set, and to the static set when it is
    /// flagged static. Registering an id that is already present leaves the
    /// existing entry untouched and returns false.
    pub fn register(&mut self, id: AttractorId, attractor: Attractor) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }

        if attractor.is_static() {
            self.static_ids.insert(id);
        }
        log::trace!("registered {} ({:?})", id, attractor.kind());
        self.index.insert(id, self.entries.len());
        self.entries.push(Entry { id, attractor });
        true
    }

    /// Remove an attractor from both sets
    ///
    /// Returns the removed attractor, or `None` when `id` was not registered.
    pub fn deregister(&mut self, id: AttractorId) -> Option<Attractor> {
        let slot = self.index.remove(&id)?;
        self.static_ids.remove(&id);

        let entry = self.entries.swap_remove(slot);
        if let Some(moved) = self.entries.get(slot) {
            self.index.insert(moved.id, slot);
        }

        log::trace!("deregistered {}", id);
        Some(entry.attractor)
    }

    /// Check whether `id` is registered
    pub fn contains(&self, id: AttractorId) -> bool {
        self.index.contains_key(&id)
    }

    /// Get a registered attractor
    pub fn get(&self, id: AttractorId) -> Option<&Attractor> {
        self.index.get(&id).map(|&slot| &self.entries[slot].attractor)
    }

    /// Get mutable access to a registered attractor
    ///
    /// The static flag cannot be changed through this reference; use
    /// [`AttractorRegistry::set_static`].
    pub fn get_mut(&mut self, id: AttractorId) -> Option<&mut Attractor> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.entries[slot].attractor)
    }

    /// Move an attractor between the static and dynamic sets
    ///
    /// Returns false when `id` is not registered.
    pub fn set_static(&mut self, id: AttractorId, is_static: bool) -> bool {
        let Some(attractor) = self.get_mut(id) else {
            return false;
        };
        attractor.set_static(is_static);

        if is_static {
            self.static_ids.insert(id);
        } else {
            self.static_ids.remove(&id);
        }
        true
    }

    /// Dynamic attractors that contribute to the field, minus `exclude`
    ///
    /// Yields attractors with `is_static == false` and `affects_field == true`
    /// whose id does not appear in `exclude`.
    pub fn all_dynamic<'a>(
        &'a self,
        exclude: &'a [AttractorId],
    ) -> impl Iterator<Item = (AttractorId, &'a Attractor)> + 'a {
        self.entries
            .iter()
            .filter(|entry| !entry.attractor.is_static() && entry.attractor.affects_field())
            .filter(move |entry| !exclude.contains(&entry.id))
            .map(|entry| (entry.id, &entry.attractor))
    }

    /// Static attractors, the input to a bake
    pub fn static_attractors(&self) -> impl Iterator<Item = &Attractor> + '_ {
        self.entries
            .iter()
            .filter(|entry| self.static_ids.contains(&entry.id))
            .map(|entry| &entry.attractor)
    }

    /// Iterate over every registered attractor
    pub fn iter(&self) -> impl Iterator<Item = (AttractorId, &Attractor)> + '_ {
        self.entries.iter().map(|entry| (entry.id, &entry.attractor))
    }

    /// Ids of every registered attractor
    pub fn ids(&self) -> impl Iterator<Item = AttractorId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    /// Number of registered attractors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of static attractors
    pub fn static_count(&self) -> usize {
        self.static_ids.len()
    }

    /// Remove every attractor
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.static_ids.clear();
    }
}
