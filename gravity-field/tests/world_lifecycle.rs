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
//! World-level scenarios
//!
//! Registration lifecycle, scoped handles, neutralizer occlusion, grid
//! persistence, and stepping.

use approx::assert_relative_eq;
use gravity_field::attractor::BakedSource;
use gravity_field::config::{ExtrapolationSource, GravityConfig};
use gravity_field::field::GRID_FORMAT_VERSION;
use gravity_field::force_law::point_law;
use gravity_field::neutralizer::{Neutralizer, NeutralizerShape};
use gravity_field::{bake, Attractor, FieldGrid, GravityError, GravityWorld, Region, DVec2};

#[test]
fn test_registry_idempotence() {
    let mut world = GravityWorld::new();
    let id = world.spawn(Attractor::point(DVec2::ZERO, 10.0));
    let body = world.attractor(id).unwrap().clone();

    assert_eq!(world.register(id, body).unwrap(), false);
    assert_eq!(world.registry().len(), 1);

    let removed = world.deregister(id).unwrap();
    assert!(world.deregister(id).is_none());
    assert_eq!(world.registry().len(), 0);

    assert!(world.register(id, removed).unwrap());
    assert_eq!(world.registry().len(), 1);
}

#[test]
fn test_occlusion_scenario() {
    let mut world = GravityWorld::new();
    world.register_neutralizer(Neutralizer::volume(NeutralizerShape::Aabb {
        min: DVec2::ZERO,
        max: DVec2::ONE,
    }));

    assert!(world.is_occluded(DVec2::new(0.5, 0.5), DVec2::new(5.0, 5.0)));
    assert!(!world.is_occluded(DVec2::new(5.0, 5.0), DVec2::new(6.0, 6.0)));
}

#[test]
fn test_barrier_shields_dynamic_attractor() {
    let mut world = GravityWorld::new();
    world.spawn(Attractor::point(DVec2::new(-5.0, 0.0), 100.0));
    let wall = world.register_neutralizer(Neutralizer::one_way_barrier(
        NeutralizerShape::Segment {
            start: DVec2::new(0.0, -10.0),
            end: DVec2::new(0.0, 10.0),
        },
        DVec2::X,
    ));

    // Query point east of the wall looks west toward the attractor: blocked
    assert_eq!(world.sample_dynamic(DVec2::new(5.0, 0.0), &[]), DVec2::ZERO);
    // West of the wall nothing is in the way
    assert!(world.sample_dynamic(DVec2::new(-1.0, 0.0), &[]).x < 0.0);

    world.deregister_neutralizer(wall);
    assert!(world.sample_dynamic(DVec2::new(5.0, 0.0), &[]).x < 0.0);
}

#[test]
fn test_one_way_barrier_direction_follows_line_of_sight() {
    let wall = NeutralizerShape::Segment {
        start: DVec2::new(0.0, -10.0),
        end: DVec2::new(0.0, 10.0),
    };
    let query = DVec2::new(5.0, 0.0);

    // The source sits west of the wall, so the line of sight from the query
    // point runs west (-X) while the pull it feels also points west
    let mut world = GravityWorld::new();
    world.spawn(Attractor::point(DVec2::new(-5.0, 0.0), 100.0));

    let toward_source =
        world.register_neutralizer(Neutralizer::one_way_barrier(wall, DVec2::NEG_X));
    let pull = world.sample_dynamic(query, &[]);
    assert!(pull.x < 0.0, "a line of sight along the pass direction is not shielded");

    world.deregister_neutralizer(toward_source);
    world.register_neutralizer(Neutralizer::one_way_barrier(wall, DVec2::X));
    assert_eq!(world.sample_dynamic(query, &[]), DVec2::ZERO);
}

#[test]
fn test_scoped_handles_in_simulation_loop() {
    let mut world = GravityWorld::new();
    world.spawn(Attractor::point(DVec2::ZERO, 1000.0));

    let probe_id = {
        let probe = world.spawn_scoped(Attractor::point(DVec2::new(3.0, 0.0), 5.0));
        world.step(0.01).unwrap();
        assert!(world.attractor(probe.id()).is_some());
        probe.id()
    };

    // Removal is applied at the start of the next step
    assert!(world.attractor(probe_id).is_some());
    world.step(0.01).unwrap();
    assert!(world.attractor(probe_id).is_none());
    assert_eq!(world.attractor_count(), 1);
}

#[test]
fn test_grid_persistence_round_trip() {
    let mut world = GravityWorld::new();
    world.spawn(Attractor::shell(DVec2::new(1.0, -1.0), 400.0, 1.5).with_static(true));
    let id = world.bake_region(Region::new(DVec2::ZERO, 6.0), 13).unwrap();

    let json = world.grid(id).unwrap().to_json().unwrap();
    assert!(json.contains(GRID_FORMAT_VERSION));

    let loaded = FieldGrid::from_json(&json).unwrap();
    assert_eq!(&loaded, world.grid(id).unwrap().as_ref());

    let mut restored = GravityWorld::new();
    restored.publish_grid(loaded);
    for point in [DVec2::new(0.3, 0.7), DVec2::new(-2.9, 2.2), DVec2::new(2.5, -0.1)] {
        assert_eq!(restored.sample_static(point), world.sample_static(point));
    }
}

#[test]
fn test_incompatible_grid_version_rejected() {
    let region = Region::new(DVec2::ZERO, 2.0);
    let grid = bake(&region, 2, std::iter::empty(), &GravityConfig::default()).unwrap();
    let json = grid
        .to_json()
        .unwrap()
        .replace(GRID_FORMAT_VERSION, "9.0.0");

    match FieldGrid::from_json(&json) {
        Err(GravityError::IncompatibleFormat { found, expected }) => {
            assert_eq!(found, "9.0.0");
            assert_eq!(expected, GRID_FORMAT_VERSION);
        }
        other => panic!("expected IncompatibleFormat, got {:?}", other),
    }

    assert!(matches!(
        FieldGrid::from_json("{}"),
        Err(GravityError::Serialization(_))
    ));
}

#[test]
fn test_baked_attractor_stamps_its_raster() {
    let config = GravityConfig::default();
    let g = config.gravitational_constant;

    // Raster of a small moon, baked around its own origin
    let moon = Attractor::point(DVec2::ZERO, 50.0);
    let raster = bake(&Region::new(DVec2::ZERO, 2.0), 5, [&moon], &config).unwrap();

    let mut world = GravityWorld::new();
    let source = BakedSource::new(raster, DVec2::ZERO);
    world.spawn(Attractor::baked(DVec2::new(10.0, 0.0), 50.0, source));
    world.bake_region(Region::new(DVec2::new(10.0, 0.0), 8.0), 17).unwrap();

    // Inside the raster the baked grid reproduces the raster node
    let near = world.sample_static(DVec2::new(10.5, 0.0));
    assert_relative_eq!(near.x, point_law(DVec2::ZERO, 50.0, g, DVec2::new(0.5, 0.0)).x);

    // Outside it the moon is extrapolated as a point mass
    let far = world.sample_static(DVec2::new(13.0, 0.0));
    assert_relative_eq!(far.x, point_law(DVec2::new(10.0, 0.0), 50.0, g, DVec2::new(13.0, 0.0)).x);
}

#[test]
fn test_baked_attractor_centre_of_gravity_extrapolation() {
    let config =
        GravityConfig::default().with_extrapolation_source(ExtrapolationSource::CenterOfGravity);
    let g = config.gravitational_constant;
    let raster = bake(&Region::new(DVec2::ZERO, 1.0), 2, std::iter::empty(), &config).unwrap();

    let mut world = GravityWorld::with_config(config).unwrap();
    let source = BakedSource::new(raster, DVec2::new(0.0, 1.0));
    world.spawn(Attractor::baked(DVec2::ZERO, 80.0, source));
    world.bake_region(Region::new(DVec2::ZERO, 8.0), 9).unwrap();

    let sample = world.sample_static(DVec2::new(0.0, 4.0));
    assert_relative_eq!(sample.y, point_law(DVec2::new(0.0, 1.0), 80.0, g, DVec2::new(0.0, 4.0)).y);
}

#[test]
fn test_circular_orbit_stays_bound() {
    let mut world = GravityWorld::new();
    let g = world.config().gravitational_constant;
    let mass = 1000.0;
    let radius = 10.0;
    world.spawn(Attractor::point(DVec2::ZERO, mass).with_static(true));
    world.bake_region(Region::new(DVec2::ZERO, 40.0), 201).unwrap();

    let speed = (g * mass / radius).sqrt();
    let satellite = world.spawn(
        Attractor::point(DVec2::new(radius, 0.0), 1.0).with_velocity(DVec2::new(0.0, speed)),
    );

    for _ in 0..2000 {
        world.step(0.0005).unwrap();
    }

    let distance = world.attractor(satellite).unwrap().position().length();
    assert_relative_eq!(distance, radius, max_relative = 0.05);
}

#[test]
fn test_json_config_drives_world() {
    let config = GravityConfig::from_json_str(r#"{ "gravitational_constant": 1.0 }"#).unwrap();
    let mut world = GravityWorld::with_config(config).unwrap();
    world.spawn(Attractor::point(DVec2::new(2.0, 0.0), 8.0));

    let pull = world.sample_total(DVec2::ZERO, &[]);
    assert_relative_eq!(pull.x, 2.0);
}
