use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space. Face centers are unit vectors from the
/// planet's core; wind velocities are tangent vectors at a face center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector { x, y, z }
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector) -> Vector {
        Vector {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn scale(self, c: f64) -> Vector {
        Vector {
            x: self.x * c,
            y: self.y * c,
            z: self.z * c,
        }
    }

    pub fn length_sq(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn normalize(self) -> Vector {
        self.scale(1.0 / self.length())
    }

    /// The component of `self` orthogonal to `b`: v − b·(v·b)/(b·b).
    ///
    /// With `b` a face center this projects onto the local tangent plane.
    pub fn reject(self, b: Vector) -> Vector {
        self - b.scale(self.dot(b) / b.dot(b))
    }

    /// Squared Euclidean distance between two points.
    pub fn dist_sq(self, other: Vector) -> f64 {
        (self - other).length_sq()
    }

    pub fn angle(self) -> Angle {
        Angle {
            theta: self.z.clamp(-1.0, 1.0).asin(),
            phi: self.y.atan2(self.x),
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.scale(-1.0)
    }
}

/// A direction on the unit sphere in spherical coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Angle {
    /// Angle with the equatorial plane, in radians.
    pub theta: f64,
    /// Angle with the prime meridian, in radians.
    pub phi: f64,
}

impl Angle {
    pub fn new(theta: f64, phi: f64) -> Self {
        Angle { theta, phi }
    }

    pub fn to_vector(self) -> Vector {
        Vector {
            x: self.theta.cos() * self.phi.cos(),
            y: self.theta.cos() * self.phi.sin(),
            z: self.theta.sin(),
        }
    }
}
