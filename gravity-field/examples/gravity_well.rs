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
//! Gravity well example
//!
//! Bakes a planet and its moon into a field grid, drops a few probes into
//! the well, and prints their trajectories while a one-way barrier shields
//! part of the scene from a wandering dynamic attractor.
//!
//! Run with `RUST_LOG=debug` to see bake timings.

use gravity_field::config::GravityConfig;
use gravity_field::neutralizer::{Neutralizer, NeutralizerShape};
use gravity_field::{Attractor, DVec2, GravityWorld, Region};

const TIMESTEP: f64 = 0.002;
const STEPS: usize = 1500;
const REPORT_INTERVAL: usize = 250;

fn main() -> gravity_field::Result<()> {
    env_logger::init();

    println!("Gravity Field - Gravity Well Example");
    println!("====================================\n");

    let config = GravityConfig::default();
    let g = config.gravitational_constant;
    let mut world = GravityWorld::with_config(config)?;

    // Static scenery: a planet with a surface and a moon on a fixed perch
    let planet_mass = 2000.0;
    let planet_radius = 4.0;
    let planet =
        world.spawn(Attractor::shell(DVec2::ZERO, planet_mass, planet_radius).with_static(true));
    world.spawn(Attractor::point(DVec2::new(25.0, 0.0), 150.0).with_static(true));
    println!(
        "Planet {} surface gravity: {:.2}",
        planet,
        world
            .attractor(planet)
            .and_then(|body| body.surface_gravity(g))
            .unwrap_or_default()
    );

    let grid_id = world.bake_region(Region::new(DVec2::ZERO, 80.0), 161)?;
    if let Some(grid) = world.grid(grid_id) {
        println!(
            "Baked {} covering {:?} to {:?} ({}x{} nodes)\n",
            grid_id,
            grid.bottom_left(),
            grid.top_right(),
            grid.resolution(),
            grid.resolution()
        );
    }

    // A dynamic rogue body west of a one-way wall
    world.spawn(Attractor::point(DVec2::new(-30.0, 10.0), 400.0).with_apply_force_to_self(false));
    world.register_neutralizer(Neutralizer::one_way_barrier(
        NeutralizerShape::Segment {
            start: DVec2::new(-20.0, -40.0),
            end: DVec2::new(-20.0, 40.0),
        },
        DVec2::X,
    ));

    // Probes: one in a circular orbit, one falling, one on the far side of the wall
    let orbit_radius = 12.0;
    let orbit_speed = (g * planet_mass / orbit_radius).sqrt();
    let probes = [
        (
            "orbiter",
            world.spawn(
                Attractor::point(DVec2::new(orbit_radius, 0.0), 1.0)
                    .with_velocity(DVec2::new(0.0, orbit_speed)),
            ),
        ),
        ("faller", world.spawn(Attractor::point(DVec2::new(0.0, 30.0), 1.0))),
        ("shielded", world.spawn(Attractor::point(DVec2::new(-10.0, -20.0), 1.0))),
    ];

    for step in 0..=STEPS {
        if step % REPORT_INTERVAL == 0 {
            println!("=== t = {:.3} ===", step as f64 * TIMESTEP);
            for (name, id) in &probes {
                let Some(body) = world.attractor(*id) else {
                    continue;
                };
                let pull = world.sample_for(*id).unwrap_or_default();
                println!(
                    "  {:<9} pos ({:>8.3}, {:>8.3})  |r| {:>7.3}  |a| {:>10.3}",
                    name,
                    body.position().x,
                    body.position().y,
                    body.position().length(),
                    pull.length()
                );
            }
        }

        if step < STEPS {
            world.step(TIMESTEP)?;
        }
    }

    let probe = DVec2::new(-25.0, 10.0);
    println!("\nField at {:?}", probe);
    println!("  static:  {:?}", world.sample_static(probe));
    println!("  dynamic: {:?}", world.sample_dynamic(probe, &[]));
    println!("  total:   {:?}", world.sample_total(probe, &[]));

    Ok(())
}
