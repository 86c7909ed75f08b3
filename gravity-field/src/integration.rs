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
//! Step integration for free-moving attractors
//!
//! Gravity is applied as an acceleration with semi-implicit Euler:
//!
//! - v(t + dt) = v(t) + a(t) * dt
//! - x(t + dt) = x(t) + v(t + dt) * dt
//!
//! All accelerations are sampled from the pre-step state before any attractor
//! moves, so the update order of attractors does not matter.

use crate::attractor::AttractorId;
use crate::error::{GravityError, Result};
use crate::world::GravityWorld;
use glam::DVec2;

/// Semi-implicit Euler integrator driven by the gravity field
#[derive(Debug, Clone, Copy)]
pub struct SemiImplicitEuler {
    timestep: f64,
}

impl SemiImplicitEuler {
    /// Create an integrator with the given timestep
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::InvalidConfiguration`] if the timestep is
    /// non-positive, NaN, or infinite.
    pub fn new(timestep: f64) -> Result<Self> {
        if !(timestep > 0.0 && timestep.is_finite()) {
            return Err(GravityError::InvalidConfiguration(format!(
                "timestep must be positive and finite, got {}",
                timestep
            )));
        }
        Ok(SemiImplicitEuler { timestep })
    }

    /// Get the timestep
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Advance every dynamic attractor with `apply_force_to_self`
    ///
    /// Static attractors never move. Attractors whose update would produce a
    /// non-finite state are left untouched. Returns the number of attractors
    /// moved.
    pub fn integrate(&self, world: &mut GravityWorld) -> usize {
        let dt = self.timestep;
        let warn_on_invalid = world.config().warn_on_invalid;

        let accelerations: Vec<(AttractorId, DVec2)> = {
            let sampler = world.sampler();
            world
                .registry()
                .iter()
                .filter(|(_, attractor)| !attractor.is_static() && attractor.apply_force_to_self())
                .filter_map(|(id, _)| sampler.sample_for(id).map(|acceleration| (id, acceleration)))
                .collect()
        };

        let mut moved = 0;
        for (id, acceleration) in accelerations {
            let Some(attractor) = world.registry_mut().get_mut(id) else {
                continue;
            };

            let velocity = attractor.velocity() + acceleration * dt;
            let position = attractor.position() + velocity * dt;
            if !velocity.is_finite() || !position.is_finite() {
                if warn_on_invalid {
                    log::warn!("skipping non-finite update for {}", id);
                }
                continue;
            }

            attractor.set_velocity(velocity);
            attractor.set_position(position);
            moved += 1;
        }

        moved
    }
}
