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
//! Force laws for each attractor variant
//!
//! Every law is a pure function of the attractor state, the query point, and
//! the engine configuration. [`force_at`] dispatches on the attractor's
//! [`ForceLawKind`](crate::attractor::ForceLawKind) and is what the sampler
//! uses; [`bake_contribution`] additionally rasterizes baked attractors and is
//! what the baker uses.
//!
//! # Laws
//!
//! With `d = source - p`:
//!
//! - **Point**: `normalize(d) * G * m / |d|²`, zero when `|d| == 0`
//! - **Shell**: point law for `|d| ≥ r`; `normalize(d) * (G * m / r²) * |d| / r`
//!   inside the shell. The two agree at `|d| == r` so the field is continuous.
//! - **Ring / Line**: point law at the attractor position, or nothing,
//!   depending on [`ExtendedShapeLaw`]
//! - **Baked**: no runtime law; the raster enters the field when baking

use crate::attractor::{Attractor, AttractorShape, BakedSource};
use crate::config::{ExtendedShapeLaw, ExtrapolationSource, GravityConfig};
use glam::DVec2;

/// Inverse-square attraction toward `source`
///
/// Returns zero when `point` coincides with `source`.
pub fn point_law(source: DVec2, mass: f64, gravitational_constant: f64, point: DVec2) -> DVec2 {
    let displacement = source - point;
    let distance_sq = displacement.length_squared();
    if distance_sq == 0.0 {
        return DVec2::ZERO;
    }

    let direction = displacement / distance_sq.sqrt();
    direction * (gravitational_constant * mass / distance_sq)
}

/// Shell-theorem approximation centred on `source`
///
/// Outside the radius the shell acts as a point mass of its total mass. Inside
/// it the magnitude falls linearly from the surface value to zero at the
/// centre. A radius that is not strictly positive and finite degrades to the
/// point law instead of dividing by zero.
pub fn shell_law(
    source: DVec2,
    mass: f64,
    radius: f64,
    gravitational_constant: f64,
    point: DVec2,
) -> DVec2 {
    if !(radius > 0.0 && radius.is_finite()) {
        return point_law(source, mass, gravitational_constant, point);
    }

    let displacement = source - point;
    let distance = displacement.length();
    if distance >= radius {
        return point_law(source, mass, gravitational_constant, point);
    }
    if distance == 0.0 {
        return DVec2::ZERO;
    }

    let surface_gravity = gravitational_constant * mass / (radius * radius);
    (displacement / distance) * surface_gravity * (distance / radius)
}

/// Gravity exerted by `attractor` at `point` at query time
///
/// Non-contributing attractors (zero mass or `affects_field == false`) and
/// baked attractors yield zero.
pub fn force_at(attractor: &Attractor, point: DVec2, config: &GravityConfig) -> DVec2 {
    if !attractor.contributes() {
        return DVec2::ZERO;
    }

    let g = config.gravitational_constant;
    match attractor.shape() {
        AttractorShape::Point => point_law(attractor.position(), attractor.mass(), g, point),
        AttractorShape::Shell { radius } => {
            shell_law(attractor.position(), attractor.mass(), *radius, g, point)
        }
        AttractorShape::Ring { .. } | AttractorShape::Line { .. } => {
            match config.extended_shape_law {
                ExtendedShapeLaw::PointFallback => {
                    point_law(attractor.position(), attractor.mass(), g, point)
                }
                ExtendedShapeLaw::Omit => DVec2::ZERO,
            }
        }
        AttractorShape::Baked(_) => DVec2::ZERO,
    }
}

/// Gravity exerted by `attractor` at a bake node
///
/// Identical to [`force_at`] except that baked attractors contribute their
/// raster where the node falls inside it, and point-law extrapolation outside.
pub fn bake_contribution(attractor: &Attractor, point: DVec2, config: &GravityConfig) -> DVec2 {
    match attractor.shape() {
        AttractorShape::Baked(source) if attractor.contributes() => {
            baked_law(attractor, source, point, config)
        }
        _ => force_at(attractor, point, config),
    }
}

fn baked_law(
    attractor: &Attractor,
    source: &BakedSource,
    point: DVec2,
    config: &GravityConfig,
) -> DVec2 {
    let local = point - attractor.position();
    if let Some(value) = source.raster.sample(local) {
        return value;
    }

    let origin = match config.extrapolation_source {
        ExtrapolationSource::Position => attractor.position(),
        ExtrapolationSource::CenterOfGravity => attractor.position() + source.center_of_gravity,
    };
    point_law(origin, attractor.mass(), config.gravitational_constant, point)
}
