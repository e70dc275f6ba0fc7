//! Car-to-car collision response
//!
//! Every pair of cars is tested (O(n²)), which is fine for a grid of a
//! handful of cars but will not scale to large fields.

use log::debug;

use super::car::CarBody;
use super::types::{Position, VehicleId};

/// Speed multiplier applied to both cars of a colliding pair
pub const COLLISION_SPEED_FACTOR: f32 = 0.5;

/// A pair of cars whose circles overlapped this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub first: VehicleId,
    pub second: VehicleId,
    /// Distance between centres before the push
    pub distance: f32,
}

/// Separate overlapping cars.
///
/// All pairs are measured against the same post-movement snapshot before
/// any correction is applied. Each car of an overlapping pair is pushed
/// away from the other by half the overlap along the line between their
/// centres, and its speed is halved once per overlapping pair.
///
/// Cars with exactly coincident centres have no push direction and are
/// left alone.
pub fn resolve_collisions(cars: &mut [(VehicleId, &mut CarBody)]) -> Vec<Contact> {
    let snapshot: Vec<(Position, f32)> = cars
        .iter()
        .map(|(_, body)| (body.position, body.collision_radius))
        .collect();

    let mut pushes = vec![(0.0_f32, 0.0_f32); cars.len()];
    let mut hits = vec![0_u32; cars.len()];
    let mut contacts = Vec::new();

    for i in 0..snapshot.len() {
        for j in (i + 1)..snapshot.len() {
            let (a, radius_a) = snapshot[i];
            let (b, radius_b) = snapshot[j];
            let distance = a.distance(&b);
            let min_distance = radius_a + radius_b;

            if distance <= 0.0 || distance >= min_distance {
                continue;
            }

            let overlap = (min_distance - distance) / 2.0;
            let nx = (a.x - b.x) / distance;
            let ny = (a.y - b.y) / distance;

            pushes[i].0 += nx * overlap;
            pushes[i].1 += ny * overlap;
            pushes[j].0 -= nx * overlap;
            pushes[j].1 -= ny * overlap;
            hits[i] += 1;
            hits[j] += 1;

            debug!(
                "Collision between car {} and car {} (distance {:.1})",
                cars[i].0 .0, cars[j].0 .0, distance
            );
            contacts.push(Contact {
                first: cars[i].0,
                second: cars[j].0,
                distance,
            });
        }
    }

    for (index, (_, body)) in cars.iter_mut().enumerate() {
        if hits[index] == 0 {
            continue;
        }
        body.position.x += pushes[index].0;
        body.position.y += pushes[index].1;
        body.speed *= COLLISION_SPEED_FACTOR.powi(hits[index] as i32);
    }

    contacts
}
