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
//! Baked gravity fields
//!
//! - [`bake`] superposes static attractors onto a [`FieldGrid`]
//! - [`FieldSampler`] combines baked grids with dynamic attractors

mod baker;
mod grid;
mod sampler;

pub use baker::bake;
pub use grid::{FieldGrid, GridId, Region, GRID_FORMAT_VERSION};
pub use sampler::FieldSampler;
