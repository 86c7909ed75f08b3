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
//! Engine configuration
//!
//! [`GravityConfig`] gathers the tunables shared by the baker, the sampler and
//! the step integrator. It can be built in code with the `with_*` methods or
//! loaded from JSON:
//!
//! ```rust
//! use gravity_field::config::{GravityConfig, ExtendedShapeLaw};
//!
//! let config = GravityConfig::from_json_str(
//!     r#"{ "gravitational_constant": 100.0, "extended_shape_law": "omit" }"#,
//! ).unwrap();
//! assert_eq!(config.gravitational_constant, 100.0);
//! assert_eq!(config.extended_shape_law, ExtendedShapeLaw::Omit);
//! ```

use crate::error::{GravityError, Result};
use serde::{Deserialize, Serialize};

/// Default gravitational constant
///
/// A game-balance value rather than the physical constant: masses of a few
/// hundred units produce noticeable pulls at distances of a few world units.
pub const DEFAULT_GRAVITATIONAL_CONSTANT: f64 = 667.4;

/// Number of interaction layers an attractor can be assigned to
pub const LAYER_COUNT: u8 = 32;

/// Force law used for ring and line attractors
///
/// Neither shape has a dedicated field model; the engine either approximates
/// them as a point mass at the attractor position or leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedShapeLaw {
    /// Inverse-square law about the attractor position
    #[default]
    PointFallback,
    /// Ring and line attractors contribute nothing
    Omit,
}

/// Source location used when extrapolating a baked attractor outside its raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationSource {
    /// The attractor's own position
    #[default]
    Position,
    /// The raster's stored centre of gravity
    CenterOfGravity,
}

/// Symmetric layer interaction table
///
/// Bit `b` of row `a` is set when layer `a` and layer `b` interact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMatrix {
    rows: [u32; LAYER_COUNT as usize],
}

impl LayerMatrix {
    /// Every layer interacts with every other layer
    pub fn all() -> Self {
        LayerMatrix {
            rows: [u32::MAX; LAYER_COUNT as usize],
        }
    }

    /// No layer interacts with any other layer, including itself
    pub fn none() -> Self {
        LayerMatrix {
            rows: [0; LAYER_COUNT as usize],
        }
    }

    /// Enable or disable interaction between two layers
    ///
    /// # Panics
    ///
    /// Panics if either layer is not below [`LAYER_COUNT`].
    pub fn set_interaction(&mut self, a: u8, b: u8, enabled: bool) {
        assert!(
            a < LAYER_COUNT && b < LAYER_COUNT,
            "Layer must be below LAYER_COUNT"
        );
        if enabled {
            self.rows[a as usize] |= 1 << b;
            self.rows[b as usize] |= 1 << a;
        } else {
            self.rows[a as usize] &= !(1 << b);
            self.rows[b as usize] &= !(1 << a);
        }
    }

    /// Check whether two layers interact
    ///
    /// Out-of-range layers never interact.
    pub fn interacts(&self, a: u8, b: u8) -> bool {
        if a >= LAYER_COUNT || b >= LAYER_COUNT {
            return false;
        }
        self.rows[a as usize] & (1 << b) != 0
    }

    fn is_symmetric(&self) -> bool {
        (0..LAYER_COUNT)
            .all(|a| (0..LAYER_COUNT).all(|b| self.interacts(a, b) == self.interacts(b, a)))
    }
}

impl Default for LayerMatrix {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration shared by baking, sampling, and stepping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Gravitational constant applied by every force law
    pub gravitational_constant: f64,
    /// Force law for ring and line attractors
    pub extended_shape_law: ExtendedShapeLaw,
    /// Extrapolation origin for baked attractors
    pub extrapolation_source: ExtrapolationSource,
    /// Whether dynamic sampling honours neutralizer occlusion
    pub use_neutralizers: bool,
    /// Which layers attract which
    pub layer_matrix: LayerMatrix,
    /// Whether to log warnings for non-finite values that get discarded
    pub warn_on_invalid: bool,
}

impl Default for GravityConfig {
    fn default() -> Self {
        GravityConfig {
            gravitational_constant: DEFAULT_GRAVITATIONAL_CONSTANT,
            extended_shape_law: ExtendedShapeLaw::default(),
            extrapolation_source: ExtrapolationSource::default(),
            use_neutralizers: true,
            layer_matrix: LayerMatrix::default(),
            warn_on_invalid: true,
        }
    }
}

impl GravityConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON and validate it
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GravityConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the gravitational constant
    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = g;
        self
    }

    /// Set the ring and line force law
    pub fn with_extended_shape_law(mut self, law: ExtendedShapeLaw) -> Self {
        self.extended_shape_law = law;
        self
    }

    /// Set the baked attractor extrapolation source
    pub fn with_extrapolation_source(mut self, source: ExtrapolationSource) -> Self {
        self.extrapolation_source = source;
        self
    }

    /// Enable or disable neutralizer occlusion during dynamic sampling
    pub fn with_neutralizers(mut self, enabled: bool) -> Self {
        self.use_neutralizers = enabled;
        self
    }

    /// Replace the layer interaction table
    pub fn with_layer_matrix(mut self, matrix: LayerMatrix) -> Self {
        self.layer_matrix = matrix;
        self
    }

    /// Enable or disable warnings for discarded non-finite values
    pub fn with_warn_on_invalid(mut self, warn: bool) -> Self {
        self.warn_on_invalid = warn;
        self
    }

    /// Check the configuration for values that would poison the field
    pub fn validate(&self) -> Result<()> {
        if !self.gravitational_constant.is_finite() {
            return Err(GravityError::InvalidConfiguration(format!(
                "gravitational constant must be finite, got {}",
                self.gravitational_constant
            )));
        }
        if !self.layer_matrix.is_symmetric() {
            return Err(GravityError::InvalidConfiguration(
                "layer matrix must be symmetric".to_string(),
            ));
        }
        Ok(())
    }
}
