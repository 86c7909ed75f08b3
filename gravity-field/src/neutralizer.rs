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
//! Neutralizers: regions and barriers that block gravity
//!
//! A neutralizer cancels gravitational influence along a line of sight.
//!
//! - **Volume** neutralizers occlude a segment that crosses their boundary,
//!   i.e. exactly one endpoint lies inside.
//! - **Barrier** neutralizers occlude a segment that touches them at either
//!   endpoint or passes through them. A one-way barrier only blocks rays that
//!   travel against its configured direction.
//!
//! Sampling casts the line of sight from the query point toward each source,
//! so `direction` is expressed along that line of sight. A one-way barrier
//! with direction `d` shields a source from query points whose line of sight
//! to it runs against `d`.
//!
//! Every barrier along the segment is tested, not just the nearest one, so a
//! one-way barrier hidden behind a permeable one still blocks.
//!
//! # Example
//!
//! ```rust
//! use gravity_field::neutralizer::{Neutralizer, NeutralizerSet, NeutralizerShape};
//! use gravity_field::DVec2;
//!
//! let mut set = NeutralizerSet::new();
//! set.register(Neutralizer::volume(NeutralizerShape::Aabb {
//!     min: DVec2::ZERO,
//!     max: DVec2::ONE,
//! }));
//!
//! assert!(set.is_occluded(DVec2::new(0.5, 0.5), DVec2::new(5.0, 5.0)));
//! assert!(!set.is_occluded(DVec2::new(5.0, 5.0), DVec2::new(6.0, 6.0)));
//! ```

use glam::DVec2;
use std::fmt;

/// Distance within which a point counts as lying on a segment barrier
pub const SEGMENT_TOLERANCE: f64 = 1e-9;

/// Geometry of a neutralizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeutralizerShape {
    /// Axis-aligned box
    Aabb {
        /// Lower-left corner
        min: DVec2,
        /// Upper-right corner
        max: DVec2,
    },
    /// Disc
    Circle {
        /// Centre of the disc
        center: DVec2,
        /// Radius of the disc
        radius: f64,
    },
    /// Zero-thickness segment
    Segment {
        /// First endpoint
        start: DVec2,
        /// Second endpoint
        end: DVec2,
    },
}

impl NeutralizerShape {
    /// Inclusive point containment
    pub fn contains(&self, point: DVec2) -> bool {
        match *self {
            NeutralizerShape::Aabb { min, max } => {
                min.x <= point.x && point.x <= max.x && min.y <= point.y && point.y <= max.y
            }
            NeutralizerShape::Circle { center, radius } => {
                (point - center).length_squared() <= radius * radius
            }
            NeutralizerShape::Segment { start, end } => {
                let closest = closest_point_on_segment(start, end, point);
                (point - closest).length() <= SEGMENT_TOLERANCE
            }
        }
    }

    /// Whether the segment `from -> to` touches the shape anywhere
    pub fn intersects_segment(&self, from: DVec2, to: DVec2) -> bool {
        if from == to {
            return self.contains(from);
        }

        match *self {
            NeutralizerShape::Aabb { min, max } => segment_hits_aabb(from, to, min, max),
            NeutralizerShape::Circle { center, radius } => {
                let closest = closest_point_on_segment(from, to, center);
                (closest - center).length_squared() <= radius * radius
            }
            NeutralizerShape::Segment { start, end } => segments_intersect(from, to, start, end),
        }
    }
}

/// How a neutralizer occludes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeutralizerKind {
    /// Blocks segments that cross the boundary
    Volume,
    /// Blocks segments that touch or pass through it
    Barrier {
        /// Direction a line of sight from the query point toward the source
        /// may pass in; `None` blocks both ways
        one_way: Option<DVec2>,
    },
}

/// A region or barrier that blocks gravitational influence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neutralizer {
    /// Geometry
    pub shape: NeutralizerShape,
    /// Occlusion behaviour
    pub kind: NeutralizerKind,
}

impl Neutralizer {
    /// Create a volume neutralizer
    pub fn volume(shape: NeutralizerShape) -> Self {
        Neutralizer {
            shape,
            kind: NeutralizerKind::Volume,
        }
    }

    /// Create a barrier that blocks in both directions
    pub fn barrier(shape: NeutralizerShape) -> Self {
        Neutralizer {
            shape,
            kind: NeutralizerKind::Barrier { one_way: None },
        }
    }

    /// Create a barrier that only blocks rays travelling against `direction`
    ///
    /// Rays run from the query point toward the source, so a source on the
    /// `direction` side of the barrier stays visible and one on the other side
    /// is shielded.
    pub fn one_way_barrier(shape: NeutralizerShape, direction: DVec2) -> Self {
        Neutralizer {
            shape,
            kind: NeutralizerKind::Barrier {
                one_way: Some(direction),
            },
        }
    }

    /// Whether this is a barrier-type neutralizer
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, NeutralizerKind::Barrier { .. })
    }

    /// Whether a barrier hit by a ray travelling along `direction` blocks it
    fn blocks_ray(&self, direction: DVec2) -> bool {
        match self.kind {
            NeutralizerKind::Volume => false,
            NeutralizerKind::Barrier { one_way: None } => true,
            NeutralizerKind::Barrier {
                one_way: Some(pass_direction),
            } => pass_direction.dot(direction) < 0.0,
        }
    }

    /// Endpoint test for this neutralizer alone
    fn occludes_endpoints(&self, from: DVec2, to: DVec2) -> bool {
        match self.kind {
            NeutralizerKind::Volume => self.shape.contains(from) != self.shape.contains(to),
            NeutralizerKind::Barrier { .. } => self.shape.contains(from) || self.shape.contains(to),
        }
    }
}

/// Identifier of a registered neutralizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeutralizerId(u64);

impl fmt::Display for NeutralizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neutralizer({})", self.0)
    }
}

/// The set of active neutralizers
#[derive(Debug, Default)]
pub struct NeutralizerSet {
    neutralizers: Vec<(NeutralizerId, Neutralizer)>,
    next_id: u64,
}

impl NeutralizerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a neutralizer
    pub fn register(&mut self, neutralizer: Neutralizer) -> NeutralizerId {
        let id = NeutralizerId(self.next_id);
        self.next_id += 1;
        self.neutralizers.push((id, neutralizer));
        id
    }

    /// Deactivate a neutralizer
    ///
    /// Returns the removed neutralizer, or `None` if `id` was not active.
    pub fn deregister(&mut self, id: NeutralizerId) -> Option<Neutralizer> {
        let slot = self.neutralizers.iter().position(|(active, _)| *active == id)?;
        Some(self.neutralizers.remove(slot).1)
    }

    /// Get an active neutralizer
    pub fn get(&self, id: NeutralizerId) -> Option<&Neutralizer> {
        self.neutralizers
            .iter()
            .find(|(active, _)| *active == id)
            .map(|(_, neutralizer)| neutralizer)
    }

    /// Number of active neutralizers
    pub fn len(&self) -> usize {
        self.neutralizers.len()
    }

    /// Whether no neutralizer is active
    pub fn is_empty(&self) -> bool {
        self.neutralizers.is_empty()
    }

    /// Whether gravity travelling between `from` and `to` is blocked
    ///
    /// Returns true on the first qualifying hit.
    pub fn is_occluded(&self, from: DVec2, to: DVec2) -> bool {
        if self
            .neutralizers
            .iter()
            .any(|(_, neutralizer)| neutralizer.occludes_endpoints(from, to))
        {
            return true;
        }

        let direction = to - from;
        self.neutralizers
            .iter()
            .filter(|(_, neutralizer)| neutralizer.is_barrier())
            .any(|(_, barrier)| {
                barrier.shape.intersects_segment(from, to) && barrier.blocks_ray(direction)
            })
    }
}

fn closest_point_on_segment(start: DVec2, end: DVec2, point: DVec2) -> DVec2 {
    let along = end - start;
    let length_sq = along.length_squared();
    if length_sq == 0.0 {
        return start;
    }
    let t = ((point - start).dot(along) / length_sq).clamp(0.0, 1.0);
    start + along * t
}

// Slab test clipped to the segment's parameter range [0, 1]
fn segment_hits_aabb(from: DVec2, to: DVec2, min: DVec2, max: DVec2) -> bool {
    let delta = to - from;
    let mut t_enter = 0.0_f64;
    let mut t_exit = 1.0_f64;

    for (origin, step, low, high) in [
        (from.x, delta.x, min.x, max.x),
        (from.y, delta.y, min.y, max.y),
    ] {
        if step == 0.0 {
            if origin < low || origin > high {
                return false;
            }
            continue;
        }

        let mut t_low = (low - origin) / step;
        let mut t_high = (high - origin) / step;
        if t_low > t_high {
            std::mem::swap(&mut t_low, &mut t_high);
        }
        t_enter = t_enter.max(t_low);
        t_exit = t_exit.min(t_high);
        if t_enter > t_exit {
            return false;
        }
    }
    true
}

fn segments_intersect(p: DVec2, p_end: DVec2, q: DVec2, q_end: DVec2) -> bool {
    let r = p_end - p;
    let s = q_end - q;
    let offset = q - p;
    let denominator = r.perp_dot(s);

    if denominator == 0.0 {
        if offset.perp_dot(r) != 0.0 {
            return false;
        }
        // Collinear: compare the projections onto r
        let r_len_sq = r.length_squared();
        if r_len_sq == 0.0 {
            return (p - closest_point_on_segment(q, q_end, p)).length() <= SEGMENT_TOLERANCE;
        }
        let t0 = offset.dot(r) / r_len_sq;
        let t1 = (q_end - p).dot(r) / r_len_sq;
        let (low, high) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        return high >= 0.0 && low <= 1.0;
    }

    let t = offset.perp_dot(s) / denominator;
    let u = offset.perp_dot(r) / denominator;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}
