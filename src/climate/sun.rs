use std::f64::consts::PI;

use crate::climate::SOLAR_FLUX;
use crate::geodesic::{Angle, Vector};

/// Axial tilt of the planet, degrees.
const AXIAL_TILT_DEGREES: f64 = 23.5;

/// Days in the year; the orbit is circular.
pub const DAYS_PER_YEAR: f64 = 360.0;

/// The sun's position for a given moment, as a direction from the planet's
/// core. Day 0.0 is noon on the prime meridian at the northern spring
/// equinox; the fractional part of the day spins the planet.
#[derive(Debug, Clone, Copy)]
pub struct Sun {
    pub direction: Vector,
    pub angle: Angle,
}

impl Sun {
    pub fn at_day(day: f64) -> Self {
        let ecliptic_latitude = -AXIAL_TILT_DEGREES.to_radians() * (day * PI / 180.0).sin();
        let ecliptic_longitude = (0.5 - (day + 0.5).fract()) * 2.0 * PI;

        let angle = Angle::new(ecliptic_latitude, ecliptic_longitude);
        Sun {
            direction: angle.to_vector(),
            angle,
        }
    }

    /// Solar flux reaching the cell centered at `center`, W/m². Zero on the
    /// night side.
    pub fn flux(&self, center: Vector) -> f64 {
        (SOLAR_FLUX * self.direction.dot(center)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noon_at_equinox_is_over_the_prime_meridian() {
        let sun = Sun::at_day(0.0);
        assert!(
            sun.direction.dist_sq(Vector::new(1.0, 0.0, 0.0)) < 1e-12,
            "sun at day 0 points {:?}",
            sun.direction
        );
        assert!((sun.flux(Vector::new(1.0, 0.0, 0.0)) - SOLAR_FLUX).abs() < 1e-9);
    }

    #[test]
    fn midnight_side_receives_no_flux() {
        let sun = Sun::at_day(0.5);
        assert_eq!(sun.flux(Vector::new(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn planet_spins_one_turn_per_day() {
        let dawn = Sun::at_day(0.25);
        let dusk = Sun::at_day(0.75);
        // A quarter day before and after noon the sun sits on the horizon
        // of the prime meridian.
        assert!(dawn.direction.x.abs() < 1e-9);
        assert!(dusk.direction.x.abs() < 1e-9);
        assert!((dawn.direction.y + dusk.direction.y).abs() < 1e-9);
    }

    #[test]
    fn solstices_tilt_the_sun() {
        let summer = Sun::at_day(3.0 * DAYS_PER_YEAR / 4.0);
        let winter = Sun::at_day(DAYS_PER_YEAR / 4.0);
        let tilt = AXIAL_TILT_DEGREES.to_radians();
        assert!(
            (summer.angle.theta - tilt).abs() < 1e-9,
            "northern summer solstice declination {}",
            summer.angle.theta
        );
        assert!((winter.angle.theta + tilt).abs() < 1e-9);

        let equinox = Sun::at_day(DAYS_PER_YEAR / 2.0);
        assert!(equinox.angle.theta.abs() < 1e-9);
    }

    #[test]
    fn daily_flux_integrates_to_a_sunlit_half() {
        // Sampled hourly over one day at the equator, the mean of
        // max(0, cos) lands near 1/π of the peak.
        let center = Vector::new(1.0, 0.0, 0.0);
        let mut total = 0.0;
        for hour in 0..24 {
            total += Sun::at_day(hour as f64 / 24.0).flux(center);
        }
        let mean = total / 24.0;
        assert!(
            (mean - SOLAR_FLUX / PI).abs() < 2.0,
            "mean daily flux {mean} strays from {}",
            SOLAR_FLUX / PI
        );
    }
}
