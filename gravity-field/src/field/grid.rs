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
//! Baked field grids and their persisted form

use crate::error::{GravityError, Result};
use glam::DVec2;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the persisted grid format
///
/// Format: MAJOR.MINOR.PATCH following semantic versioning. Grids written by a
/// newer minor version or a different major version are rejected.
pub const GRID_FORMAT_VERSION: &str = "1.0.0";

/// Relative slack, as a fraction of the grid extent, when checking a loaded
/// grid's node layout against its bounds
const LAYOUT_TOLERANCE: f64 = 1e-9;

/// Square world-space region to bake
///
/// `position` is the centre of the region and `size` its side length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Centre of the region
    pub position: DVec2,
    /// Side length of the region
    pub size: f64,
}

impl Region {
    /// Create a region from its centre and side length
    pub fn new(position: DVec2, size: f64) -> Self {
        Region { position, size }
    }

    /// Create a region from its bottom-left corner and side length
    pub fn from_bottom_left(bottom_left: DVec2, size: f64) -> Self {
        Region {
            position: bottom_left + DVec2::splat(size * 0.5),
            size,
        }
    }

    /// Bottom-left corner
    pub fn bottom_left(&self) -> DVec2 {
        self.position - DVec2::splat(self.size * 0.5)
    }

    /// Top-right corner
    pub fn top_right(&self) -> DVec2 {
        self.position + DVec2::splat(self.size * 0.5)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: DVec2) -> bool {
        contains_inclusive(self.bottom_left(), self.top_right(), point)
    }

    /// Reject regions that cannot be sampled
    pub fn validate(&self) -> Result<()> {
        if !(self.size > 0.0 && self.size.is_finite()) {
            return Err(GravityError::InvalidConfiguration(format!(
                "region size must be positive and finite, got {}",
                self.size
            )));
        }
        if !self.position.is_finite() {
            return Err(GravityError::InvalidConfiguration(
                "region position must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identifier of a grid published to a [`GravityWorld`](crate::GravityWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub(crate) u64);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid({})", self.0)
    }
}

/// Dense `R×R` grid of gravity vectors covering a square region
///
/// Nodes are stored row by row: node `(x, y)` lives at index `y * R + x`
/// with `(0, 0)` at the bottom-left corner. The world position of every node
/// is stored next to its vector so interpolation never re-derives positions
/// from the (rounded) cell size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGrid {
    resolution: usize,
    bottom_left: DVec2,
    top_right: DVec2,
    cell_size: f64,
    vectors: Vec<DVec2>,
    positions: Vec<DVec2>,
}

impl FieldGrid {
    pub(crate) fn from_parts(
        region: &Region,
        resolution: usize,
        vectors: Vec<DVec2>,
        positions: Vec<DVec2>,
    ) -> Self {
        FieldGrid {
            resolution,
            bottom_left: region.bottom_left(),
            top_right: region.top_right(),
            cell_size: cell_size(region.size, resolution),
            vectors,
            positions,
        }
    }

    /// Nodes per axis
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Bottom-left corner of the covered region
    pub fn bottom_left(&self) -> DVec2 {
        self.bottom_left
    }

    /// Top-right corner of the covered region
    pub fn top_right(&self) -> DVec2 {
        self.top_right
    }

    /// Distance between neighbouring nodes
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// All node vectors in row-major order
    pub fn vectors(&self) -> &[DVec2] {
        &self.vectors
    }

    /// All node world positions in row-major order
    pub fn positions(&self) -> &[DVec2] {
        &self.positions
    }

    /// Flat index of node `(x, y)`
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.resolution + x
    }

    /// Vector stored at node `(x, y)`
    pub fn vector_at(&self, x: usize, y: usize) -> Option<DVec2> {
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        self.vectors.get(self.index(x, y)).copied()
    }

    /// World position of node `(x, y)`
    pub fn position_at(&self, x: usize, y: usize) -> Option<DVec2> {
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        self.positions.get(self.index(x, y)).copied()
    }

    /// Inclusive bounding box test
    pub fn contains(&self, point: DVec2) -> bool {
        contains_inclusive(self.bottom_left, self.top_right, point)
    }

    /// Bilinearly interpolated field value at `point`
    ///
    /// Returns `None` when the grid does not cover `point`.
    pub fn sample(&self, point: DVec2) -> Option<DVec2> {
        super::sampler::interpolate(self, point)
    }

    /// Serialize the grid with its format version
    pub fn to_json(&self) -> Result<String> {
        let file = GridFileRef {
            format_version: GRID_FORMAT_VERSION,
            grid: self,
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Load a grid written by [`FieldGrid::to_json`]
    ///
    /// # Errors
    ///
    /// - [`GravityError::IncompatibleFormat`] when the format version differs
    /// - [`GravityError::InvalidConfiguration`] when the grid is malformed
    /// - [`GravityError::Serialization`] when the JSON cannot be parsed
    pub fn from_json(json: &str) -> Result<Self> {
        let file: GridFile = serde_json::from_str(json)?;
        if !is_format_compatible(&file.format_version, GRID_FORMAT_VERSION) {
            return Err(GravityError::IncompatibleFormat {
                found: file.format_version,
                expected: GRID_FORMAT_VERSION.to_string(),
            });
        }
        file.grid.validate()?;
        Ok(file.grid)
    }

    fn validate(&self) -> Result<()> {
        let nodes = self.resolution.checked_mul(self.resolution);
        if self.resolution < 2
            || nodes != Some(self.vectors.len())
            || nodes != Some(self.positions.len())
        {
            return Err(GravityError::InvalidConfiguration(format!(
                "grid of resolution {} holds {} vectors and {} positions",
                self.resolution,
                self.vectors.len(),
                self.positions.len()
            )));
        }
        let extent = self.top_right - self.bottom_left;
        if !(extent.x > 0.0 && extent.y > 0.0 && extent.is_finite()) {
            return Err(GravityError::InvalidConfiguration(
                "grid bounds are empty or not finite".to_string(),
            ));
        }

        let tolerance = extent.max_element() * LAYOUT_TOLERANCE;
        let expected_cell = extent.x / (self.resolution - 1) as f64;
        if (self.cell_size - expected_cell).abs() > tolerance {
            return Err(GravityError::InvalidConfiguration(format!(
                "cell size {} does not match bounds (expected {})",
                self.cell_size, expected_cell
            )));
        }

        let first = self.positions[0];
        let last = self.positions[self.positions.len() - 1];
        if (first - self.bottom_left).abs().max_element() > tolerance
            || (last - self.top_right).abs().max_element() > tolerance
        {
            return Err(GravityError::InvalidConfiguration(
                "corner nodes do not match grid bounds".to_string(),
            ));
        }

        if !self.positions_increase() {
            return Err(GravityError::InvalidConfiguration(
                "node positions must increase along both axes".to_string(),
            ));
        }
        if !self.vectors.iter().all(|vector| vector.is_finite()) {
            return Err(GravityError::InvalidConfiguration(
                "grid holds non-finite vectors".to_string(),
            ));
        }
        Ok(())
    }

    fn positions_increase(&self) -> bool {
        let r = self.resolution;
        (0..r).all(|y| {
            (0..r).all(|x| {
                let here = self.positions[self.index(x, y)];
                let along_x = x == 0 || self.positions[self.index(x - 1, y)].x < here.x;
                let along_y = y == 0 || self.positions[self.index(x, y - 1)].y < here.y;
                here.is_finite() && along_x && along_y
            })
        })
    }
}

#[derive(Serialize)]
struct GridFileRef<'a> {
    format_version: &'a str,
    grid: &'a FieldGrid,
}

#[derive(Deserialize)]
struct GridFile {
    format_version: String,
    grid: FieldGrid,
}

pub(crate) fn cell_size(size: f64, resolution: usize) -> f64 {
    size / (resolution - 1) as f64
}

fn contains_inclusive(bottom_left: DVec2, top_right: DVec2, point: DVec2) -> bool {
    bottom_left.x <= point.x
        && point.x <= top_right.x
        && bottom_left.y <= point.y
        && point.y <= top_right.y
}

/// Check if a persisted grid version can be read by this build
///
/// Uses semantic versioning rules:
/// - Major version must match
/// - For major version 0.x.y, minor versions must match
/// - For major version >= 1, the file's minor version must not be newer
fn is_format_compatible(file_version: &str, reader_version: &str) -> bool {
    let file_ver = match Version::parse(file_version) {
        Ok(v) => v,
        Err(_) => return false,
    };
    let reader_ver = match Version::parse(reader_version) {
        Ok(v) => v,
        Err(_) => return false,
    };

    if file_ver.major != reader_ver.major {
        return false;
    }

    if file_ver.major != 0 {
        file_ver.minor <= reader_ver.minor
    } else {
        file_ver.minor == reader_ver.minor
    }
}
