use std::f64::consts::PI;

use rayon::prelude::*;

use crate::climate::{Climate, MIN_AIR};
use crate::geodesic::{Geodesic, Vector};

/// Planetary rotation rate around +Z, radians per minute (one turn per
/// 24-hour day).
const ROTATION_RATE: f64 = 2.0 * PI / 1440.0;

/// Air density in the momentum equation.
const DENSITY: f64 = 10.0;

/// Kinematic viscosity.
const VISCOSITY: f64 = 0.04;

/// Drag of the air mass against the surface.
const LAND_DRAG: f64 = 0.005;

/// Below this squared wind speed a cell transports no mass.
const MIN_WIND_SQ: f64 = 1e-5;

/// Pressure gradients shorter than this are treated as flat.
const MIN_PRESSURE_GRADIENT: f64 = 1e-4;

/// Discrete gradient of a scalar field at cell `idx`:
/// (2/d) · Σ (s[n] − s[idx]) · ê, with ê the unit chord toward neighbor n.
pub fn gradient(idx: usize, scalars: &[f64], sphere: &Geodesic) -> Vector {
    let center = sphere.centers[idx];
    let here = scalars[idx];
    let neighbors = sphere.neighbors(idx);

    let mut result = Vector::ZERO;
    for &n in neighbors {
        let to_neighbor = (sphere.centers[n] - center).normalize();
        result = result + to_neighbor.scale(scalars[n] - here);
    }
    result.scale(2.0 / neighbors.len() as f64)
}

/// Discrete divergence of a vector field at cell `idx`:
/// (2/d) · Σ u[n] · ê.
pub fn divergence(idx: usize, vectors: &[Vector], sphere: &Geodesic) -> f64 {
    let center = sphere.centers[idx];
    let neighbors = sphere.neighbors(idx);

    let mut result = 0.0;
    for &n in neighbors {
        let to_neighbor = (sphere.centers[n] - center).normalize();
        result += to_neighbor.dot(vectors[n]);
    }
    result * 2.0 / neighbors.len() as f64
}

/// Discrete vector Laplacian at cell `idx`: Σ (u[n] − u[idx]).
pub fn laplacian(idx: usize, vectors: &[Vector], sphere: &Geodesic) -> Vector {
    let here = vectors[idx];
    let mut result = Vector::ZERO;
    for &n in sphere.neighbors(idx) {
        result = result + (vectors[n] - here);
    }
    result
}

/// Acceleration of the air at position `x` moving at `u`, in units of
/// inverse minutes squared: pressure gradient, Coriolis and centrifugal
/// terms on the rotation plane, two viscosity terms, and land drag.
fn acceleration(
    pressure_gradient: Vector,
    u: Vector,
    x: Vector,
    laplacian_u: Vector,
    grad_div_u: Vector,
) -> Vector {
    let mut a = pressure_gradient.scale(-1.0 / DENSITY);

    a.x += 2.0 * ROTATION_RATE * u.y;
    a.y -= 2.0 * ROTATION_RATE * u.x;

    a.x += ROTATION_RATE * ROTATION_RATE * x.x;
    a.y += ROTATION_RATE * ROTATION_RATE * x.y;

    a = a + laplacian_u.scale(VISCOSITY);
    a = a + grad_div_u.scale(VISCOSITY / 3.0);

    a - u.scale(LAND_DRAG)
}

/// Mass and energy leaving one cell, split between its two best-aligned
/// neighbors.
struct Outflow {
    source: usize,
    air: f64,
    energy: f64,
    targets: [(usize, f64, f64); 2],
}

/// One Navier–Stokes step of `minutes` simulated minutes: update every
/// cell's wind from the momentum equation, then advect air mass and energy
/// downwind.
///
/// The momentum update reads pre-step snapshots of pressure, velocity and
/// divergence, so cell order cannot affect the result. Advection computes
/// per-cell outflows in parallel against the frozen post-momentum state and
/// commits them serially.
pub fn flow(climates: &mut [Climate], sphere: &Geodesic, minutes: f64) {
    let velocities: Vec<Vector> = climates.iter().map(|c| c.air_velocity).collect();
    let pressures: Vec<f64> = climates.iter().map(Climate::pressure).collect();
    let divergences: Vec<f64> = (0..climates.len())
        .map(|i| divergence(i, &velocities, sphere))
        .collect();

    for i in 0..climates.len() {
        let center = sphere.centers[i];

        let raw_gradient = gradient(i, &pressures, sphere);
        let magnitude = raw_gradient.length();
        let pressure_gradient = if magnitude > MIN_PRESSURE_GRADIENT {
            // Project onto the tangent plane but keep the full magnitude.
            raw_gradient.reject(center).normalize().scale(magnitude)
        } else {
            Vector::ZERO
        };

        let laplacian_u = laplacian(i, &velocities, sphere);
        let grad_div_u = gradient(i, &divergences, sphere);
        let a = acceleration(
            pressure_gradient,
            velocities[i],
            center,
            laplacian_u,
            grad_div_u,
        );

        let dv = a.scale(minutes).reject(center);
        climates[i].air_velocity = (velocities[i] + dv).reject(center);
    }

    let snapshot: &[Climate] = climates;
    let outflows: Vec<Option<Outflow>> = (0..snapshot.len())
        .into_par_iter()
        .map(|i| compute_outflow(i, snapshot, sphere, minutes))
        .collect();

    for outflow in outflows.into_iter().flatten() {
        let cell = &mut climates[outflow.source];
        cell.air -= outflow.air;
        cell.air_energy -= outflow.energy;
        for (target, air, energy) in outflow.targets {
            climates[target].air += air;
            climates[target].air_energy += energy;
        }
    }
}

fn compute_outflow(
    i: usize,
    climates: &[Climate],
    sphere: &Geodesic,
    minutes: f64,
) -> Option<Outflow> {
    let cell = &climates[i];
    if cell.air_velocity.length_sq() < MIN_WIND_SQ {
        return None;
    }
    let center = sphere.centers[i];
    let direction = cell.air_velocity.normalize();

    let mut aligned: Vec<(f64, usize)> = sphere
        .neighbors(i)
        .iter()
        .map(|&n| {
            let to_neighbor = (sphere.centers[n] - center).normalize();
            let theta = to_neighbor.dot(direction).clamp(-1.0, 1.0).acos();
            (theta, n)
        })
        .collect();
    aligned.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (theta0, n0) = aligned[0];
    let (theta1, n1) = aligned[1];
    if theta0 > PI / 2.0 {
        // Even the best-aligned neighbor is upwind of the flow.
        return None;
    }

    let out_air = (cell.air - MIN_AIR).min(cell.air_velocity.length() * minutes);
    if out_air <= 0.0 {
        return None;
    }
    let out_energy = cell.air_energy * out_air / cell.air;

    // Angular barycentric split: the closer neighbor takes the larger share.
    let inv_sum = 1.0 / (theta0 + theta1);
    Some(Outflow {
        source: i,
        air: out_air,
        energy: out_energy,
        targets: [
            (n0, theta1 * out_air * inv_sum, theta1 * out_energy * inv_sum),
            (n1, theta0 * out_air * inv_sum, theta0 * out_energy * inv_sum),
        ],
    })
}
