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
//! Field sampling
//!
//! The total gravity at a point is the bilinearly interpolated value of the
//! first baked grid that covers it plus the direct sum over every dynamic
//! attractor.

use crate::attractor::{Attractor, AttractorId, AttractorRegistry};
use crate::config::GravityConfig;
use crate::field::FieldGrid;
use crate::force_law::{bake_contribution, force_at};
use crate::neutralizer::NeutralizerSet;
use glam::DVec2;
use std::sync::Arc;

/// Bilinear lookup of `point` in `grid`
///
/// Returns `None` when the grid does not cover the point.
pub(crate) fn interpolate(grid: &FieldGrid, point: DVec2) -> Option<DVec2> {
    let cell = Cell::locate(grid, point)?;
    Some(cell.blend(|index| grid.vectors()[index]))
}

/// Grid cell enclosing a point, with the point's offset inside it
struct Cell {
    corners: [usize; 4],
    tx: f64,
    ty: f64,
}

impl Cell {
    fn locate(grid: &FieldGrid, point: DVec2) -> Option<Cell> {
        if !grid.contains(point) {
            return None;
        }

        let resolution = grid.resolution();
        let last = resolution as f64 - 1.0;
        let bottom_left = grid.bottom_left();
        let top_right = grid.top_right();

        let fx = inverse_lerp(bottom_left.x, top_right.x, point.x) * last;
        let fy = inverse_lerp(bottom_left.y, top_right.y, point.y) * last;
        let x0 = base_cell(fx, resolution)?;
        let y0 = base_cell(fy, resolution)?;

        // Order: (x0, y0), (x1, y0), (x0, y1), (x1, y1)
        let corners = [
            grid.index(x0, y0),
            grid.index(x0 + 1, y0),
            grid.index(x0, y0 + 1),
            grid.index(x0 + 1, y0 + 1),
        ];
        let p00 = grid.positions()[corners[0]];
        let p11 = grid.positions()[corners[3]];

        Some(Cell {
            corners,
            tx: inverse_lerp(p00.x, p11.x, point.x),
            ty: inverse_lerp(p00.y, p11.y, point.y),
        })
    }

    /// Interpolate the per-node values produced by `value`
    fn blend(&self, value: impl Fn(usize) -> DVec2) -> DVec2 {
        let [c00, c10, c01, c11] = self.corners;
        let bottom = lerp(value(c00), value(c10), self.tx);
        let top = lerp(value(c01), value(c11), self.tx);
        lerp(bottom, top, self.ty)
    }
}

/// Base cell index along one axis
///
/// A coordinate on the far edge floors to `R - 1`; it is pulled back one cell
/// so the upper neighbour stays in range.
fn base_cell(fractional: f64, resolution: usize) -> Option<usize> {
    if !fractional.is_finite() {
        return None;
    }

    let mut cell = fractional.floor();
    if cell >= resolution as f64 - 1.0 {
        cell -= 1.0;
    }
    cell = cell.min(resolution as f64 - 2.0);
    if cell < 0.0 {
        return None;
    }
    Some(cell as usize)
}

fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

// Exact at both endpoints
fn lerp(a: DVec2, b: DVec2, t: f64) -> DVec2 {
    a * (1.0 - t) + b * t
}

/// Read-only view over the sources needed to sample the field
///
/// Obtained from [`GravityWorld::sampler`](crate::GravityWorld::sampler), or
/// built directly from its parts for hosts that manage their own storage.
pub struct FieldSampler<'a> {
    config: &'a GravityConfig,
    registry: &'a AttractorRegistry,
    grids: &'a [Arc<FieldGrid>],
    neutralizers: &'a NeutralizerSet,
}

impl<'a> FieldSampler<'a> {
    /// Create a sampler over the given sources
    ///
    /// Grids are searched in slice order; the first one containing a point
    /// wins.
    pub fn new(
        config: &'a GravityConfig,
        registry: &'a AttractorRegistry,
        grids: &'a [Arc<FieldGrid>],
        neutralizers: &'a NeutralizerSet,
    ) -> Self {
        FieldSampler {
            config,
            registry,
            grids,
            neutralizers,
        }
    }

    /// Baked gravity at `point`
    ///
    /// Zero when no grid covers the point.
    pub fn sample_static(&self, point: DVec2) -> DVec2 {
        self.covering_grid(point)
            .and_then(|grid| interpolate(grid, point))
            .unwrap_or(DVec2::ZERO)
    }

    /// Gravity from dynamic attractors at `point`, minus `exclude`
    pub fn sample_dynamic(&self, point: DVec2, exclude: &[AttractorId]) -> DVec2 {
        self.sum_dynamic(point, exclude, None)
    }

    /// Baked plus dynamic gravity at `point`, minus `exclude`
    ///
    /// Excluded static attractors are removed from the baked component by
    /// subtracting their own contribution at the corners of the enclosing
    /// cell before interpolating. This assumes the grid was baked from the
    /// attractor's current state; a static attractor moved or added since the
    /// last bake is subtracted as it is now.
    pub fn sample_total(&self, point: DVec2, exclude: &[AttractorId]) -> DVec2 {
        self.static_excluding(point, exclude) + self.sample_dynamic(point, exclude)
    }

    /// Gravity acting on the registered attractor `id`
    ///
    /// Excludes the attractor itself and honours the layer matrix against its
    /// layer. Static attractors never move, so they only receive the dynamic
    /// component. Returns `None` if `id` is not registered.
    pub fn sample_for(&self, id: AttractorId) -> Option<DVec2> {
        let receiver = self.registry.get(id)?;
        let point = receiver.position();
        let dynamic = self.sum_dynamic(point, &[id], Some(receiver.layer()));

        if receiver.is_static() {
            Some(dynamic)
        } else {
            Some(self.sample_static(point) + dynamic)
        }
    }

    /// Whether neutralizers block the line of sight from `from` to `to`
    pub fn is_occluded(&self, from: DVec2, to: DVec2) -> bool {
        self.neutralizers.is_occluded(from, to)
    }

    fn covering_grid(&self, point: DVec2) -> Option<&'a FieldGrid> {
        let grids: &'a [Arc<FieldGrid>] = self.grids;
        grids
            .iter()
            .find(|grid| grid.contains(point))
            .map(|grid| grid.as_ref())
    }

    fn excluded_static<'s>(
        &self,
        exclude: &'s [AttractorId],
    ) -> impl Iterator<Item = &'a Attractor> + 's
    where
        'a: 's,
    {
        let registry: &'a AttractorRegistry = self.registry;
        exclude
            .iter()
            .filter_map(move |id| registry.get(*id))
            .filter(|attractor| attractor.is_static())
    }

    fn static_excluding(&self, point: DVec2, exclude: &[AttractorId]) -> DVec2 {
        if self.excluded_static(exclude).next().is_none() {
            return self.sample_static(point);
        }
        let Some(grid) = self.covering_grid(point) else {
            return DVec2::ZERO;
        };
        let Some(cell) = Cell::locate(grid, point) else {
            return DVec2::ZERO;
        };

        cell.blend(|index| {
            let node = grid.positions()[index];
            let baked = grid.vectors()[index];
            let own = self
                .excluded_static(exclude)
                .map(|attractor| bake_contribution(attractor, node, self.config))
                .fold(DVec2::ZERO, |total, force| total + force);
            let remaining = baked - own;
            // A singular own contribution was zeroed at bake time too
            if remaining.is_finite() {
                remaining
            } else {
                baked
            }
        })
    }

    fn sum_dynamic(
        &self,
        point: DVec2,
        exclude: &[AttractorId],
        receiver_layer: Option<u8>,
    ) -> DVec2 {
        let check_occlusion = self.config.use_neutralizers && !self.neutralizers.is_empty();

        self.registry
            .all_dynamic(exclude)
            .filter(|(_, attractor)| match receiver_layer {
                Some(layer) => self.config.layer_matrix.interacts(attractor.layer(), layer),
                None => true,
            })
            .filter(|(_, attractor)| {
                !check_occlusion || !self.neutralizers.is_occluded(point, attractor.position())
            })
            .map(|(_, attractor)| force_at(attractor, point, self.config))
            .fold(DVec2::ZERO, |total, force| total + force)
    }
}
