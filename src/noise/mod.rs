use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::geodesic::{Angle, Vector};

/// A periodic 3D gradient lattice. Each site holds a direction; the value
/// at a point trilinearly interpolates the dot products between each corner
/// gradient and the offset from that corner, with raw linear weights.
#[derive(Debug, Clone)]
pub struct Perlin {
    dim: usize,
    dim_sq: usize,
    gradients: Vec<Vector>,
}

impl Perlin {
    pub fn new(rng: &mut ChaCha8Rng, dim: usize) -> Self {
        let dim_sq = dim * dim;
        let mut gradients = Vec::with_capacity(dim * dim_sq);
        for _ in 0..dim * dim_sq {
            let angle = Angle::new(
                2.0 * std::f64::consts::PI * rng.r#gen::<f64>(),
                (2.0 * rng.r#gen::<f64>() - 1.0).acos(),
            );
            gradients.push(angle.to_vector());
        }
        Perlin {
            dim,
            dim_sq,
            gradients,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn gradient_at(&self, x: usize, y: usize, z: usize) -> Vector {
        self.gradients[x * self.dim_sq + y * self.dim + z]
    }

    /// Dot product of the corner gradient with the offset (xr, yr, zr) from
    /// the corner to the sampled point.
    fn corner_dot(&self, xr: f64, yr: f64, zr: f64, x: usize, y: usize, z: usize) -> f64 {
        let g = self.gradient_at(x, y, z);
        xr * g.x + yr * g.y + zr * g.z
    }

    pub fn value_at(&self, v: Vector) -> f64 {
        let (x0, xr) = split(v.x, self.dim);
        let (y0, yr) = split(v.y, self.dim);
        let (z0, zr) = split(v.z, self.dim);

        let x1 = (x0 + 1) % self.dim;
        let y1 = (y0 + 1) % self.dim;
        let z1 = (z0 + 1) % self.dim;

        let xc = 1.0 - xr;
        let yc = 1.0 - yr;
        let zc = 1.0 - zr;

        let n000 = self.corner_dot(xr, yr, zr, x0, y0, z0);
        let n001 = self.corner_dot(xr, yr, -zc, x0, y0, z1);
        let n010 = self.corner_dot(xr, -yc, zr, x0, y1, z0);
        let n011 = self.corner_dot(xr, -yc, -zc, x0, y1, z1);
        let n100 = self.corner_dot(-xc, yr, zr, x1, y0, z0);
        let n101 = self.corner_dot(-xc, yr, -zc, x1, y0, z1);
        let n110 = self.corner_dot(-xc, -yc, zr, x1, y1, z0);
        let n111 = self.corner_dot(-xc, -yc, -zc, x1, y1, z1);

        let n00 = lerp(n000, n001, zr, zc);
        let n01 = lerp(n010, n011, zr, zc);
        let n10 = lerp(n100, n101, zr, zc);
        let n11 = lerp(n110, n111, zr, zc);

        let n0 = lerp(n00, n01, yr, yc);
        let n1 = lerp(n10, n11, yr, yc);

        lerp(n0, n1, xr, xc)
    }
}

/// Integer lattice cell and fractional offset for one coordinate, wrapped
/// to [0, dim).
fn split(value: f64, dim: usize) -> (usize, f64) {
    let mut cell = value.trunc() as i64;
    let mut frac = value.fract();
    if frac < 0.0 {
        cell -= 1;
        frac += 1.0;
    }
    (cell.rem_euclid(dim as i64) as usize, frac)
}

fn lerp(a0: f64, a1: f64, w: f64, wc: f64) -> f64 {
    wc * a0 + w * a1
}

/// Fractal noise: a base octave plus `depth` octaves, each translated by
/// the compounding transform "add (2, 2, 2), divide by `scale`" and
/// attenuated by `scale^i`. A seeded offset decorrelates planets generated
/// from different seeds.
#[derive(Debug, Clone)]
pub struct PerlinFractal {
    perlin: Perlin,
    depth: usize,
    scale: f64,
    inv_scale: f64,
    offset: Vector,
}

impl PerlinFractal {
    pub fn new(seed: i64, dim: usize, depth: usize, scale: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let perlin = Perlin::new(&mut rng, dim);
        let offset = Vector::new(
            dim as f64 * rng.r#gen::<f64>(),
            dim as f64 * rng.r#gen::<f64>(),
            dim as f64 * rng.r#gen::<f64>(),
        );
        PerlinFractal {
            perlin,
            depth,
            scale,
            inv_scale: 1.0 / scale,
            offset,
        }
    }

    pub fn value_at(&self, v: Vector) -> f64 {
        let mut p = v + self.offset;
        let mut result = self.perlin.value_at(p);
        p = p.scale(2.0);

        let mut amplitude = 1.0;
        for _ in 0..self.depth {
            amplitude *= self.scale;
            p = (p + Vector::new(2.0, 2.0, 2.0)).scale(self.inv_scale);
            result += self.perlin.value_at(p) * amplitude;
        }

        result
    }
}
