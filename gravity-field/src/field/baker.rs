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
//! Field baking
//!
//! Baking superposes every static attractor onto each node of an `R×R` grid.
//! This is the dominant cost of the engine, `O(R² × N)` for `N` attractors,
//! and is paid once per bake rather than per query.
//!
//! ## Parallel Computation
//!
//! With the `parallel` feature the grid rows are distributed over the Rayon
//! thread pool. Each node depends only on its own position, so the parallel
//! and sequential paths produce identical grids.

use crate::attractor::Attractor;
use crate::config::GravityConfig;
use crate::error::{GravityError, Result};
use crate::field::grid::{cell_size, FieldGrid, Region};
use crate::force_law::bake_contribution;
use glam::DVec2;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Bake the field of `attractors` over `region` at `resolution` nodes per axis
///
/// Node `(x, y)` sits at `bottom_left + cell_size * (x, y)`, where
/// `cell_size = region.size / (resolution - 1)`. Attractors that do not
/// contribute (zero mass, `affects_field == false`) are skipped.
///
/// # Errors
///
/// Returns [`GravityError::InvalidConfiguration`] if `resolution < 2` or the
/// region is empty or not finite.
///
/// # Example
///
/// ```rust
/// use gravity_field::attractor::Attractor;
/// use gravity_field::config::GravityConfig;
/// use gravity_field::field::{bake, Region};
/// use gravity_field::DVec2;
///
/// let sun = Attractor::point(DVec2::ZERO, 1000.0).with_static(true);
/// let grid = bake(&Region::new(DVec2::ZERO, 4.0), 5, [&sun], &GravityConfig::default()).unwrap();
/// assert_eq!(grid.vectors().len(), 25);
/// ```
pub fn bake<'a, I>(
    region: &Region,
    resolution: usize,
    attractors: I,
    config: &GravityConfig,
) -> Result<FieldGrid>
where
    I: IntoIterator<Item = &'a Attractor>,
{
    if resolution < 2 {
        return Err(GravityError::InvalidConfiguration(format!(
            "resolution must be at least 2, got {}",
            resolution
        )));
    }
    region.validate()?;
    let node_count = resolution.checked_mul(resolution).ok_or_else(|| {
        GravityError::InvalidConfiguration(format!("resolution {} is too large", resolution))
    })?;

    let sources: Vec<&Attractor> = attractors
        .into_iter()
        .filter(|attractor| attractor.contributes())
        .collect();

    log::debug!(
        "baking {}x{} grid from {} attractors",
        resolution,
        resolution,
        sources.len()
    );
    let started = Instant::now();
    let mut vectors = vec![DVec2::ZERO; node_count];
    let mut positions = vec![DVec2::ZERO; node_count];

    let layout = NodeLayout {
        bottom_left: region.bottom_left(),
        cell_size: cell_size(region.size, resolution),
    };

    #[cfg(feature = "parallel")]
    {
        vectors
            .par_chunks_mut(resolution)
            .zip(positions.par_chunks_mut(resolution))
            .enumerate()
            .for_each(|(y, (vector_row, position_row))| {
                bake_row(y, vector_row, position_row, &layout, &sources, config);
            });
    }

    #[cfg(not(feature = "parallel"))]
    {
        vectors
            .chunks_mut(resolution)
            .zip(positions.chunks_mut(resolution))
            .enumerate()
            .for_each(|(y, (vector_row, position_row))| {
                bake_row(y, vector_row, position_row, &layout, &sources, config);
            });
    }

    let discarded = discard_non_finite(&mut vectors);
    if discarded > 0 && config.warn_on_invalid {
        log::warn!("bake discarded {} non-finite node values", discarded);
    }

    log::debug!(
        "baked {}x{} grid in {:?}",
        resolution,
        resolution,
        started.elapsed()
    );

    Ok(FieldGrid::from_parts(region, resolution, vectors, positions))
}

struct NodeLayout {
    bottom_left: DVec2,
    cell_size: f64,
}

fn bake_row(
    y: usize,
    vector_row: &mut [DVec2],
    position_row: &mut [DVec2],
    layout: &NodeLayout,
    sources: &[&Attractor],
    config: &GravityConfig,
) {
    for (x, (vector, position)) in vector_row.iter_mut().zip(position_row.iter_mut()).enumerate() {
        let node = layout.bottom_left + DVec2::new(x as f64, y as f64) * layout.cell_size;
        *position = node;
        *vector = sources
            .iter()
            .map(|attractor| bake_contribution(attractor, node, config))
            .fold(DVec2::ZERO, |total, force| total + force);
    }
}

fn discard_non_finite(vectors: &mut [DVec2]) -> usize {
    let mut discarded = 0;
    for vector in vectors.iter_mut().filter(|vector| !vector.is_finite()) {
        *vector = DVec2::ZERO;
        discarded += 1;
    }
    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force_law::point_law;
    use approx::assert_relative_eq;

    #[test]
    fn test_resolution_below_two_rejected() {
        let config = GravityConfig::default();
        for resolution in [0, 1] {
            let region = Region::new(DVec2::ZERO, 4.0);
            let result = bake(&region, resolution, std::iter::empty(), &config);
            assert!(matches!(result, Err(GravityError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_zero_size_region_rejected() {
        let config = GravityConfig::default();
        let result = bake(&Region::new(DVec2::ZERO, 0.0), 4, std::iter::empty(), &config);
        assert!(matches!(result, Err(GravityError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_bake_is_zero() {
        let config = GravityConfig::default();
        let grid = bake(&Region::new(DVec2::ZERO, 4.0), 3, std::iter::empty(), &config).unwrap();
        assert!(grid.vectors().iter().all(|v| *v == DVec2::ZERO));
    }

    #[test]
    fn test_node_layout() {
        let config = GravityConfig::default();
        let region = Region::new(DVec2::new(1.0, 1.0), 2.0);
        let grid = bake(&region, 3, std::iter::empty(), &config).unwrap();

        assert_eq!(grid.resolution(), 3);
        assert_eq!(grid.cell_size(), 1.0);
        assert_eq!(grid.position_at(0, 0), Some(DVec2::new(0.0, 0.0)));
        assert_eq!(grid.position_at(2, 0), Some(DVec2::new(2.0, 0.0)));
        assert_eq!(grid.position_at(1, 2), Some(DVec2::new(1.0, 2.0)));
        assert_eq!(grid.positions()[grid.index(1, 2)], DVec2::new(1.0, 2.0));
    }

    #[test]
    fn test_superposes_every_attractor() {
        let config = GravityConfig::default();
        let a = Attractor::point(DVec2::new(-3.0, 0.0), 50.0);
        let b = Attractor::shell(DVec2::new(3.0, 1.0), 80.0, 2.0);
        let grid = bake(&Region::new(DVec2::ZERO, 2.0), 3, [&a, &b], &config).unwrap();

        for (vector, position) in grid.vectors().iter().zip(grid.positions()) {
            let expected = bake_contribution(&a, *position, &config)
                + bake_contribution(&b, *position, &config);
            assert_relative_eq!(vector.x, expected.x);
            assert_relative_eq!(vector.y, expected.y);
        }
    }

    #[test]
    fn test_singular_node_is_zero() {
        let config = GravityConfig::default();
        let sun = Attractor::point(DVec2::ZERO, 1000.0);
        let grid = bake(&Region::new(DVec2::ZERO, 4.0), 5, [&sun], &config).unwrap();

        assert_eq!(grid.vector_at(2, 2), Some(DVec2::ZERO));
        let one_right = grid.vector_at(3, 2).unwrap();
        let expected = point_law(DVec2::ZERO, 1000.0, config.gravitational_constant, DVec2::X);
        assert_relative_eq!(one_right.x, expected.x);
    }

    #[test]
    fn test_non_contributors_skipped() {
        let config = GravityConfig::default();
        let massless = Attractor::point(DVec2::X, 0.0);
        let inert = Attractor::point(DVec2::Y, 10.0).with_affects_field(false);
        let grid = bake(&Region::new(DVec2::ZERO, 4.0), 4, [&massless, &inert], &config).unwrap();
        assert!(grid.vectors().iter().all(|v| *v == DVec2::ZERO));
    }

    #[test]
    fn test_discard_non_finite() {
        let mut vectors = vec![DVec2::X, DVec2::new(f64::NAN, 0.0), DVec2::new(0.0, f64::INFINITY)];
        assert_eq!(discard_non_finite(&mut vectors), 2);
        assert_eq!(vectors, vec![DVec2::X, DVec2::ZERO, DVec2::ZERO]);
    }

    #[test]
    fn test_rows_match_single_threaded_bake() {
        let config = GravityConfig::default();
        let bodies = [
            Attractor::point(DVec2::new(1.5, -0.5), 120.0),
            Attractor::shell(DVec2::new(-2.0, 2.0), 300.0, 1.5),
            Attractor::ring(DVec2::new(0.0, -3.0), 60.0, 1.0, 0.0, 2.0),
        ];
        let region = Region::new(DVec2::new(0.25, 0.0), 6.0);
        let resolution = 17;
        let grid = bake(&region, resolution, bodies.iter(), &config).unwrap();

        // Rebuild row by row on this thread, as the sequential build does
        let sources: Vec<&Attractor> = bodies.iter().collect();
        let layout = NodeLayout {
            bottom_left: region.bottom_left(),
            cell_size: cell_size(region.size, resolution),
        };
        let mut vectors = vec![DVec2::ZERO; resolution * resolution];
        let mut positions = vec![DVec2::ZERO; resolution * resolution];
        for (y, (vector_row, position_row)) in vectors
            .chunks_mut(resolution)
            .zip(positions.chunks_mut(resolution))
            .enumerate()
        {
            bake_row(y, vector_row, position_row, &layout, &sources, &config);
        }
        discard_non_finite(&mut vectors);

        assert_eq!(grid.vectors(), vectors.as_slice());
        assert_eq!(grid.positions(), positions.as_slice());
    }
}
