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
//! # Gravity Field
//!
//! A 2D gravitational field engine for games and simulations: heterogeneous
//! attractors, baked field grids with bilinear lookup, and line-of-sight
//! neutralizers.
//!
//! ## Features
//!
//! - **Attractors**: point, shell, ring, line, and baked raster sources with
//!   signed mass and per-layer interaction
//! - **Static/dynamic split**: static attractors are baked once into dense
//!   grids; dynamic attractors are summed directly per query
//! - **Bilinear sampling**: grids tile the world and are looked up by
//!   containment
//! - **Neutralizers**: volumes and (one-way) barriers that block gravity along
//!   a line of sight
//! - **Parallelization**: optional Rayon integration for baking
//!
//! ## Example
//!
//! ```rust
//! use gravity_field::{Attractor, GravityWorld, Region, DVec2};
//!
//! let mut world = GravityWorld::new();
//! world.spawn(Attractor::shell(DVec2::ZERO, 1000.0, 2.0).with_static(true));
//! world.bake_region(Region::new(DVec2::ZERO, 16.0), 33).unwrap();
//!
//! let ship = world.spawn(Attractor::point(DVec2::new(4.0, 3.0), 1.0));
//! let pull = world.sample_total(DVec2::new(4.0, 3.0), &[ship]);
//! assert!(pull.x < 0.0 && pull.y < 0.0);
//! ```

#![warn(missing_docs)]

/// Attractors and the attractor registry
pub mod attractor;

/// Engine configuration
pub mod config;

/// Error types
pub mod error;

/// Baking and sampling of field grids
pub mod field;

/// Force laws per attractor variant
pub mod force_law;

/// Step integration driven by the field
pub mod integration;

/// Line-of-sight occlusion
pub mod neutralizer;

/// The world context tying the engine together
pub mod world;

pub use attractor::{Attractor, AttractorId, AttractorShape, ForceLawKind};
pub use config::GravityConfig;
pub use error::{GravityError, Result};
pub use field::{bake, FieldGrid, GridId, Region};
pub use glam::DVec2;
pub use neutralizer::{Neutralizer, NeutralizerShape};
pub use world::{AttractorHandle, GravityWorld};
