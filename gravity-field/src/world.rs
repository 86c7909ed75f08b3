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
//! The gravity world context
//!
//! [`GravityWorld`] owns everything a simulation needs: configuration, the
//! attractor registry, published grids, and neutralizers. Hosts create one per
//! simulation and pass it explicitly; there is no global state, so independent
//! worlds can run side by side.
//!
//! # Lifecycle
//!
//! Attractors are added with [`GravityWorld::spawn`] and removed with
//! [`GravityWorld::despawn`]. For owners that should deregister on drop,
//! [`GravityWorld::spawn_scoped`] returns an [`AttractorHandle`]; dropping it
//! queues the removal, which is applied at the next [`GravityWorld::sync`]
//! (also run at the start of every [`GravityWorld::step`]).
//!
//! # Example
//!
//! ```rust
//! use gravity_field::{Attractor, GravityWorld, Region, DVec2};
//!
//! let mut world = GravityWorld::new();
//! world.spawn(Attractor::point(DVec2::ZERO, 1000.0).with_static(true));
//! world.bake_region(Region::new(DVec2::ZERO, 20.0), 64).unwrap();
//!
//! let probe = world.spawn(Attractor::point(DVec2::new(5.0, 0.0), 1.0));
//! world.step(0.01).unwrap();
//! assert!(world.attractor(probe).unwrap().velocity().x < 0.0);
//! ```

use crate::attractor::{Attractor, AttractorId, AttractorRegistry, IdAllocator};
use crate::config::GravityConfig;
use crate::error::{GravityError, Result};
use crate::field::{bake, FieldGrid, FieldSampler, GridId, Region};
use crate::integration::SemiImplicitEuler;
use crate::neutralizer::{Neutralizer, NeutralizerId, NeutralizerSet};
use glam::DVec2;
use std::sync::{Arc, Mutex, PoisonError};

type PendingQueue = Arc<Mutex<Vec<AttractorId>>>;

/// Explicit context owning the registry, grids, and neutralizers
pub struct GravityWorld {
    config: GravityConfig,
    ids: IdAllocator,
    registry: AttractorRegistry,
    // Parallel vectors: `grid_ids[i]` names `grids[i]`
    grid_ids: Vec<GridId>,
    grids: Vec<Arc<FieldGrid>>,
    next_grid_id: u64,
    neutralizers: NeutralizerSet,
    pending_despawns: PendingQueue,
}

impl GravityWorld {
    /// Create a world with the default configuration
    pub fn new() -> Self {
        Self::from_valid_config(GravityConfig::default())
    }

    /// Create a world with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn with_config(config: GravityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: GravityConfig) -> Self {
        GravityWorld {
            config,
            ids: IdAllocator::new(),
            registry: AttractorRegistry::new(),
            grid_ids: Vec::new(),
            grids: Vec::new(),
            next_grid_id: 0,
            neutralizers: NeutralizerSet::new(),
            pending_despawns: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the active configuration
    pub fn config(&self) -> &GravityConfig {
        &self.config
    }

    /// Get read access to the attractor registry
    pub fn registry(&self) -> &AttractorRegistry {
        &self.registry
    }

    // ----------------------------------------------------------------------
    // Attractors
    // ----------------------------------------------------------------------

    /// Allocate an id for `attractor` and register it
    pub fn spawn(&mut self, attractor: Attractor) -> AttractorId {
        let id = self.ids.allocate();
        self.registry.register(id, attractor);
        id
    }

    /// Spawn an attractor whose registration ends when the handle is dropped
    pub fn spawn_scoped(&mut self, attractor: Attractor) -> AttractorHandle {
        let id = self.spawn(attractor);
        AttractorHandle {
            id,
            pending: Some(Arc::clone(&self.pending_despawns)),
        }
    }

    /// Deregister an attractor and release its id
    ///
    /// Returns the attractor, or `None` if `id` is stale.
    pub fn despawn(&mut self, id: AttractorId) -> Option<Attractor> {
        if !self.ids.release(id) {
            return None;
        }
        self.registry.deregister(id)
    }

    /// Re-register a previously deregistered attractor under its id
    ///
    /// Idempotent: returns `Ok(false)` if `id` is already registered.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::UnknownAttractor`] if `id` was not allocated by
    /// this world or has been despawned.
    pub fn register(&mut self, id: AttractorId, attractor: Attractor) -> Result<bool> {
        if !self.ids.is_alive(id) {
            return Err(GravityError::UnknownAttractor(id));
        }
        Ok(self.registry.register(id, attractor))
    }

    /// Deregister an attractor while keeping its id reserved
    ///
    /// No-op returning `None` if `id` is not registered.
    pub fn deregister(&mut self, id: AttractorId) -> Option<Attractor> {
        self.registry.deregister(id)
    }

    /// Get a registered attractor
    pub fn attractor(&self, id: AttractorId) -> Option<&Attractor> {
        self.registry.get(id)
    }

    /// Get mutable access to a registered attractor
    pub fn attractor_mut(&mut self, id: AttractorId) -> Option<&mut Attractor> {
        self.registry.get_mut(id)
    }

    /// Move an attractor between the static and dynamic sets
    ///
    /// Baked grids are not updated; re-bake to reflect the change.
    pub fn set_static(&mut self, id: AttractorId, is_static: bool) -> Result<()> {
        if self.registry.set_static(id, is_static) {
            Ok(())
        } else {
            Err(GravityError::UnknownAttractor(id))
        }
    }

    /// Number of live attractor ids
    pub fn attractor_count(&self) -> usize {
        self.ids.alive_count()
    }

    /// Apply queued deregistrations from dropped handles
    ///
    /// Returns the number of attractors removed.
    pub fn sync(&mut self) -> usize {
        let drained: Vec<AttractorId> = {
            let mut pending = self
                .pending_despawns
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).collect()
        };

        let removed = drained
            .into_iter()
            .filter(|id| self.despawn(*id).is_some())
            .count();
        if removed > 0 {
            log::debug!("sync removed {} attractors released by handles", removed);
        }
        removed
    }

    // ----------------------------------------------------------------------
    // Grids
    // ----------------------------------------------------------------------

    /// Bake the registry's static attractors over `region` and publish the grid
    ///
    /// The grid only becomes visible to samplers once fully built.
    pub fn bake_region(&mut self, region: Region, resolution: usize) -> Result<GridId> {
        let grid = bake(&region, resolution, self.registry.static_attractors(), &self.config)?;
        Ok(self.publish_grid(grid))
    }

    /// Publish an already-built grid, e.g. one loaded from disk
    pub fn publish_grid(&mut self, grid: FieldGrid) -> GridId {
        let id = GridId(self.next_grid_id);
        self.next_grid_id += 1;
        log::debug!(
            "published {} covering {:?}..{:?}",
            id,
            grid.bottom_left(),
            grid.top_right()
        );
        self.grid_ids.push(id);
        self.grids.push(Arc::new(grid));
        id
    }

    /// Replace a published grid in place, keeping its lookup priority
    ///
    /// Returns false if `id` is not published.
    pub fn replace_grid(&mut self, id: GridId, grid: FieldGrid) -> bool {
        match self.grid_slot(id) {
            Some(slot) => {
                self.grids[slot] = Arc::new(grid);
                true
            }
            None => false,
        }
    }

    /// Remove a published grid
    pub fn remove_grid(&mut self, id: GridId) -> bool {
        let Some(slot) = self.grid_slot(id) else {
            return false;
        };
        self.grid_ids.remove(slot);
        self.grids.remove(slot);
        log::debug!("removed {}", id);
        true
    }

    /// Remove every published grid
    pub fn clear_grids(&mut self) {
        self.grid_ids.clear();
        self.grids.clear();
    }

    /// Get a published grid
    ///
    /// The `Arc` lets readers such as renderers keep a grid alive across a
    /// re-bake.
    pub fn grid(&self, id: GridId) -> Option<Arc<FieldGrid>> {
        self.grid_slot(id).map(|slot| Arc::clone(&self.grids[slot]))
    }

    /// Iterate over published grids in lookup order
    pub fn grids(&self) -> impl Iterator<Item = (GridId, &FieldGrid)> + '_ {
        self.grid_ids
            .iter()
            .zip(&self.grids)
            .map(|(id, grid)| (*id, grid.as_ref()))
    }

    fn grid_slot(&self, id: GridId) -> Option<usize> {
        self.grid_ids.iter().position(|published| *published == id)
    }

    // ----------------------------------------------------------------------
    // Neutralizers
    // ----------------------------------------------------------------------

    /// Activate a neutralizer
    pub fn register_neutralizer(&mut self, neutralizer: Neutralizer) -> NeutralizerId {
        self.neutralizers.register(neutralizer)
    }

    /// Deactivate a neutralizer; no-op if absent
    pub fn deregister_neutralizer(&mut self, id: NeutralizerId) -> Option<Neutralizer> {
        self.neutralizers.deregister(id)
    }

    /// Whether neutralizers block the line of sight from `from` to `to`
    pub fn is_occluded(&self, from: DVec2, to: DVec2) -> bool {
        self.neutralizers.is_occluded(from, to)
    }

    // ----------------------------------------------------------------------
    // Sampling
    // ----------------------------------------------------------------------

    /// Borrow a sampler over the current state
    pub fn sampler(&self) -> FieldSampler<'_> {
        FieldSampler::new(&self.config, &self.registry, &self.grids, &self.neutralizers)
    }

    /// Baked gravity at `point`
    pub fn sample_static(&self, point: DVec2) -> DVec2 {
        self.sampler().sample_static(point)
    }

    /// Gravity from dynamic attractors at `point`, minus `exclude`
    pub fn sample_dynamic(&self, point: DVec2, exclude: &[AttractorId]) -> DVec2 {
        self.sampler().sample_dynamic(point, exclude)
    }

    /// Baked plus dynamic gravity at `point`, minus `exclude`
    ///
    /// Excluded static attractors are subtracted from the baked component;
    /// see [`FieldSampler::sample_total`].
    pub fn sample_total(&self, point: DVec2, exclude: &[AttractorId]) -> DVec2 {
        self.sampler().sample_total(point, exclude)
    }

    /// Gravity acting on a registered attractor
    pub fn sample_for(&self, id: AttractorId) -> Option<DVec2> {
        self.sampler().sample_for(id)
    }

    // ----------------------------------------------------------------------
    // Simulation
    // ----------------------------------------------------------------------

    /// Advance every free-moving attractor by `dt`
    ///
    /// Applies pending handle drops first. Returns the number of attractors
    /// moved.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::InvalidConfiguration`] if `dt` is not positive
    /// and finite.
    pub fn step(&mut self, dt: f64) -> Result<usize> {
        let integrator = SemiImplicitEuler::new(dt)?;
        self.sync();
        Ok(integrator.integrate(self))
    }

    pub(crate) fn registry_mut(&mut self) -> &mut AttractorRegistry {
        &mut self.registry
    }
}

impl Default for GravityWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration of an attractor
///
/// Dropping the handle queues the attractor for removal at the owning world's
/// next sync point. The handle does not borrow the world.
#[must_use = "dropping the handle deregisters the attractor"]
pub struct AttractorHandle {
    id: AttractorId,
    pending: Option<PendingQueue>,
}

impl AttractorHandle {
    /// Id of the scoped attractor
    pub fn id(&self) -> AttractorId {
        self.id
    }

    /// Give up scoped ownership; the attractor stays registered until despawned
    pub fn detach(mut self) -> AttractorId {
        self.pending = None;
        self.id
    }
}

impl Drop for AttractorHandle {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neutralizer::NeutralizerShape;

    #[test]
    fn test_spawn_and_despawn() {
        let mut world = GravityWorld::new();
        let id = world.spawn(Attractor::point(DVec2::ZERO, 1.0));
        assert_eq!(world.attractor_count(), 1);
        assert!(world.attractor(id).is_some());

        assert!(world.despawn(id).is_some());
        assert!(world.despawn(id).is_none());
        assert!(world.attractor(id).is_none());
        assert_eq!(world.attractor_count(), 0);
    }

    #[test]
    fn test_register_requires_live_id() {
        let mut world = GravityWorld::new();
        let id = world.spawn(Attractor::point(DVec2::ZERO, 1.0));

        let body = world.deregister(id).unwrap();
        assert!(world.deregister(id).is_none());
        assert!(world.register(id, body.clone()).unwrap());
        assert!(!world.register(id, body.clone()).unwrap());

        world.despawn(id);
        assert!(matches!(
            world.register(id, body),
            Err(GravityError::UnknownAttractor(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GravityConfig::new().with_gravitational_constant(f64::NAN);
        assert!(GravityWorld::with_config(config).is_err());
    }

    #[test]
    fn test_set_static_unknown() {
        let mut world = GravityWorld::new();
        assert!(world.set_static(AttractorId::new(4, 0), true).is_err());
    }

    #[test]
    fn test_grid_publication() {
        let mut world = GravityWorld::new();
        world.spawn(Attractor::point(DVec2::ZERO, 100.0).with_static(true));

        let first = world.bake_region(Region::new(DVec2::ZERO, 4.0), 5).unwrap();
        let second = world.bake_region(Region::new(DVec2::new(10.0, 0.0), 4.0), 5).unwrap();
        assert_ne!(first, second);
        assert_eq!(world.grids().count(), 2);

        let held = world.grid(first).unwrap();
        assert!(world.remove_grid(first));
        assert!(!world.remove_grid(first));
        // Readers keep their copy after removal
        assert_eq!(held.resolution(), 5);
        assert_eq!(world.sample_static(DVec2::new(1.0, 0.0)), DVec2::ZERO);

        world.clear_grids();
        assert_eq!(world.grids().count(), 0);
    }

    #[test]
    fn test_replace_grid_keeps_priority() {
        let mut world = GravityWorld::new();
        let region = Region::new(DVec2::ZERO, 4.0);
        let first = world.bake_region(region, 3).unwrap();

        world.spawn(Attractor::point(DVec2::new(5.0, 0.0), 100.0).with_static(true));
        let statics = world.registry().static_attractors();
        let rebaked = bake(&region, 3, statics, world.config()).unwrap();
        assert!(world.replace_grid(first, rebaked));
        assert!(world.sample_static(DVec2::ZERO).x > 0.0);
    }

    #[test]
    fn test_bake_region_propagates_errors() {
        let mut world = GravityWorld::new();
        assert!(world.bake_region(Region::new(DVec2::ZERO, 4.0), 1).is_err());
        assert!(world.bake_region(Region::new(DVec2::ZERO, 0.0), 4).is_err());
        assert_eq!(world.grids().count(), 0);
    }

    #[test]
    fn test_scoped_handle_deregisters_on_sync() {
        let mut world = GravityWorld::new();
        let handle = world.spawn_scoped(Attractor::point(DVec2::X, 10.0));
        let id = handle.id();

        drop(handle);
        // Removal waits for the sync point
        assert!(world.attractor(id).is_some());
        assert_eq!(world.sync(), 1);
        assert!(world.attractor(id).is_none());
        assert_eq!(world.sync(), 0);
    }

    #[test]
    fn test_detached_handle_stays_registered() {
        let mut world = GravityWorld::new();
        let handle = world.spawn_scoped(Attractor::point(DVec2::X, 10.0));
        let id = handle.detach();

        assert_eq!(world.sync(), 0);
        assert!(world.attractor(id).is_some());
    }

    #[test]
    fn test_handle_after_manual_despawn() {
        let mut world = GravityWorld::new();
        let handle = world.spawn_scoped(Attractor::point(DVec2::X, 10.0));
        world.despawn(handle.id());
        drop(handle);
        assert_eq!(world.sync(), 0);
    }

    #[test]
    fn test_neutralizer_registration() {
        let mut world = GravityWorld::new();
        let id = world.register_neutralizer(Neutralizer::volume(NeutralizerShape::Circle {
            center: DVec2::ZERO,
            radius: 1.0,
        }));
        assert!(world.is_occluded(DVec2::ZERO, DVec2::new(3.0, 0.0)));

        assert!(world.deregister_neutralizer(id).is_some());
        assert!(world.deregister_neutralizer(id).is_none());
        assert!(!world.is_occluded(DVec2::ZERO, DVec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_invalid_timestep() {
        let mut world = GravityWorld::new();
        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                world.step(dt),
                Err(GravityError::InvalidConfiguration(_))
            ));
        }
    }
}
