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
//! Gravity sources and the registry that tracks them
//!
//! An [`Attractor`] is a body that sources and/or receives gravity. Its shape
//! is a tagged union ([`AttractorShape`]) whose discriminant is the
//! [`ForceLawKind`] used to pick a force law in [`crate::force_law`].
//!
//! # Example
//!
//! ```rust
//! use gravity_field::attractor::{Attractor, ForceLawKind};
//! use gravity_field::DVec2;
//!
//! let planet = Attractor::shell(DVec2::new(10.0, 0.0), 500.0, 2.0).with_static(true);
//! assert_eq!(planet.kind(), ForceLawKind::Shell);
//! assert!(planet.is_static());
//! assert!(planet.contributes());
//! ```

mod id;
mod registry;

pub use id::AttractorId;
pub(crate) use id::IdAllocator;
pub use registry::AttractorRegistry;

use crate::config::LAYER_COUNT;
use crate::field::FieldGrid;
use glam::DVec2;
use std::sync::Arc;

/// Discriminant of the force law an attractor uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForceLawKind {
    /// Inverse-square point mass
    Point,
    /// Hollow shell with linear falloff inside the radius
    Shell,
    /// Partial annulus
    Ring,
    /// Line segment
    Line,
    /// Precomputed raster
    Baked,
}

/// A precomputed raster of gravity vectors carried by a baked attractor
///
/// The raster grid is expressed in coordinates relative to the attractor's
/// position, so moving the attractor between bakes moves its raster too.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedSource {
    /// Superposed gravity vectors in attractor-local coordinates
    pub raster: Arc<FieldGrid>,
    /// Centre of gravity in attractor-local coordinates
    pub center_of_gravity: DVec2,
}

impl BakedSource {
    /// Create a baked source from a raster and its centre of gravity
    pub fn new(raster: FieldGrid, center_of_gravity: DVec2) -> Self {
        BakedSource {
            raster: Arc::new(raster),
            center_of_gravity,
        }
    }
}

/// Shape parameters of an attractor
#[derive(Debug, Clone, PartialEq)]
pub enum AttractorShape {
    /// No extra shape
    Point,
    /// Hollow shell of the given radius
    Shell {
        /// Shell radius
        radius: f64,
    },
    /// Partial annulus spanning `start_angle..end_angle` radians
    ///
    /// The span only shapes the visible wedge; it does not change the force law.
    Ring {
        /// Ring radius
        radius: f64,
        /// Start of the span in radians
        start_angle: f64,
        /// End of the span in radians
        end_angle: f64,
    },
    /// Segment between two offsets from the attractor position
    Line {
        /// Segment start relative to the attractor position
        start: DVec2,
        /// Segment end relative to the attractor position
        end: DVec2,
    },
    /// Precomputed raster source
    Baked(BakedSource),
}

impl AttractorShape {
    /// Get the force law discriminant for this shape
    pub fn kind(&self) -> ForceLawKind {
        match self {
            AttractorShape::Point => ForceLawKind::Point,
            AttractorShape::Shell { .. } => ForceLawKind::Shell,
            AttractorShape::Ring { .. } => ForceLawKind::Ring,
            AttractorShape::Line { .. } => ForceLawKind::Line,
            AttractorShape::Baked(_) => ForceLawKind::Baked,
        }
    }
}

/// A body that sources and/or receives gravity
#[derive(Debug, Clone, PartialEq)]
pub struct Attractor {
    position: DVec2,
    velocity: DVec2,
    mass: f64,
    affects_field: bool,
    apply_force_to_self: bool,
    is_static: bool,
    layer: u8,
    shape: AttractorShape,
}

impl Attractor {
    /// Create an attractor with the given shape
    ///
    /// Defaults: zero velocity, dynamic, layer 0, affects the field and
    /// receives force.
    pub fn new(position: DVec2, mass: f64, shape: AttractorShape) -> Self {
        Attractor {
            position,
            velocity: DVec2::ZERO,
            mass,
            affects_field: true,
            apply_force_to_self: true,
            is_static: false,
            layer: 0,
            shape,
        }
    }

    /// Create a point-mass attractor
    pub fn point(position: DVec2, mass: f64) -> Self {
        Self::new(position, mass, AttractorShape::Point)
    }

    /// Create a shell attractor
    pub fn shell(position: DVec2, mass: f64, radius: f64) -> Self {
        Self::new(position, mass, AttractorShape::Shell { radius })
    }

    /// Create a ring attractor spanning `start_angle..end_angle` radians
    pub fn ring(position: DVec2, mass: f64, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self::new(
            position,
            mass,
            AttractorShape::Ring {
                radius,
                start_angle,
                end_angle,
            },
        )
    }

    /// Create a line attractor from offsets relative to `position`
    pub fn line(position: DVec2, mass: f64, start: DVec2, end: DVec2) -> Self {
        Self::new(position, mass, AttractorShape::Line { start, end })
    }

    /// Create a baked attractor
    ///
    /// `mass` is the total mass used when extrapolating outside the raster.
    pub fn baked(position: DVec2, mass: f64, source: BakedSource) -> Self {
        Self::new(position, mass, AttractorShape::Baked(source)).with_static(true)
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Mark the attractor as static (bakeable) or dynamic
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Set whether the attractor contributes to the field
    pub fn with_affects_field(mut self, affects_field: bool) -> Self {
        self.affects_field = affects_field;
        self
    }

    /// Set whether the attractor receives force from the field
    pub fn with_apply_force_to_self(mut self, apply: bool) -> Self {
        self.apply_force_to_self = apply;
        self
    }

    /// Set the interaction layer
    ///
    /// # Panics
    ///
    /// Panics if `layer` is not below [`LAYER_COUNT`].
    pub fn with_layer(mut self, layer: u8) -> Self {
        assert!(layer < LAYER_COUNT, "Layer must be below LAYER_COUNT");
        self.layer = layer;
        self
    }

    /// Get the position
    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Set the position
    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    /// Get the velocity
    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Set the velocity
    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    /// Get the mass (negative mass repels)
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Set the mass
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    /// Whether the attractor is flagged as contributing to the field
    pub fn affects_field(&self) -> bool {
        self.affects_field
    }

    /// Set whether the attractor contributes to the field
    pub fn set_affects_field(&mut self, affects_field: bool) {
        self.affects_field = affects_field;
    }

    /// Whether the attractor receives force from the field
    pub fn apply_force_to_self(&self) -> bool {
        self.apply_force_to_self
    }

    /// Set whether the attractor receives force from the field
    pub fn set_apply_force_to_self(&mut self, apply: bool) {
        self.apply_force_to_self = apply;
    }

    /// Whether the attractor is static (eligible for baking)
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Only the registry flips this, so its static partition stays in sync
    pub(crate) fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    /// Get the interaction layer
    pub fn layer(&self) -> u8 {
        self.layer
    }

    /// Get the shape parameters
    pub fn shape(&self) -> &AttractorShape {
        &self.shape
    }

    /// Replace the shape parameters
    pub fn set_shape(&mut self, shape: AttractorShape) {
        self.shape = shape;
    }

    /// Get the force law discriminant
    pub fn kind(&self) -> ForceLawKind {
        self.shape.kind()
    }

    /// Whether the attractor actually sources any gravity
    ///
    /// Zero-mass bodies and bodies with `affects_field == false` never do.
    pub fn contributes(&self) -> bool {
        self.affects_field && self.mass != 0.0
    }

    /// Gravity magnitude at the surface of a shell, `G * m / r²`
    ///
    /// Returns `None` for non-shell attractors and for degenerate radii.
    pub fn surface_gravity(&self, gravitational_constant: f64) -> Option<f64> {
        match self.shape {
            AttractorShape::Shell { radius } if radius > 0.0 && radius.is_finite() => {
                Some(gravitational_constant * self.mass / (radius * radius))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let attractor = Attractor::point(DVec2::new(1.0, 2.0), 10.0);
        assert_eq!(attractor.position(), DVec2::new(1.0, 2.0));
        assert_eq!(attractor.velocity(), DVec2::ZERO);
        assert!(attractor.affects_field());
        assert!(attractor.apply_force_to_self());
        assert!(!attractor.is_static());
        assert_eq!(attractor.layer(), 0);
        assert_eq!(attractor.kind(), ForceLawKind::Point);
    }

    #[test]
    fn test_contributes() {
        assert!(Attractor::point(DVec2::ZERO, 1.0).contributes());
        assert!(Attractor::point(DVec2::ZERO, -1.0).contributes());
        assert!(!Attractor::point(DVec2::ZERO, 0.0).contributes());
        assert!(!Attractor::point(DVec2::ZERO, 1.0)
            .with_affects_field(false)
            .contributes());
    }

    #[test]
    fn test_shape_kinds() {
        assert_eq!(Attractor::shell(DVec2::ZERO, 1.0, 2.0).kind(), ForceLawKind::Shell);
        assert_eq!(
            Attractor::ring(DVec2::ZERO, 1.0, 2.0, 0.0, 1.0).kind(),
            ForceLawKind::Ring
        );
        assert_eq!(
            Attractor::line(DVec2::ZERO, 1.0, DVec2::X, DVec2::Y).kind(),
            ForceLawKind::Line
        );
    }

    #[test]
    fn test_surface_gravity() {
        let shell = Attractor::shell(DVec2::ZERO, 100.0, 2.0);
        assert_eq!(shell.surface_gravity(1.0), Some(25.0));

        let collapsed = Attractor::shell(DVec2::ZERO, 100.0, 0.0);
        assert_eq!(collapsed.surface_gravity(1.0), None);

        let point = Attractor::point(DVec2::ZERO, 100.0);
        assert_eq!(point.surface_gravity(1.0), None);
    }

    #[test]
    #[should_panic(expected = "Layer must be below LAYER_COUNT")]
    fn test_layer_out_of_range_panics() {
        Attractor::point(DVec2::ZERO, 1.0).with_layer(32);
    }
}
