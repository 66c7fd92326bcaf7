pub mod diffuse;
pub mod fluid;
pub mod sun;

use serde::{Deserialize, Serialize};

use crate::geodesic::{Geodesic, Vector};

pub use diffuse::diffuse;
pub use fluid::flow;
pub use sun::Sun;

/// Solar flux at the equator at noon, W/m².
pub const SOLAR_FLUX: f64 = 400.0;

/// Stefan–Boltzmann constant.
pub const STEFAN_BOLTZMANN: f64 = 5.670374419e-8;

/// Reference temperature for the dimensionless pressure.
pub const ZERO_CELSIUS: f64 = 273.15;

/// Heat capacity of a cell's air column at reference mass, J/(K·unit area).
pub const AIR_SPECIFIC_HEAT: f64 = 1.0e5;

/// Land heat capacity tiers, J/(K·unit area). Dry land swings hard between
/// day and night; open ocean barely moves.
pub const DESERT_SPECIFIC_HEAT: f64 = 1.0e5;
pub const COAST_SPECIFIC_HEAT: f64 = 4.0e5;
pub const OCEAN_SPECIFIC_HEAT: f64 = 14.0e5;

/// Air mass never drops below this; advection leaves the floor in place.
pub const MIN_AIR: f64 = 0.01;

/// Fraction of the distance to land/air thermal equilibrium closed per
/// radiative step.
const EQUILIBRATION_RATE: f64 = 0.2;

/// Thermal state of a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    /// Heat capacity of the land column, one of the three tiers.
    pub land_specific_heat: f64,
    /// Energy stored in the land column, J/unit area.
    pub land_energy: f64,
    /// Air mass relative to the planetary mean of 1.
    pub air: f64,
    /// Energy stored in the air column, J/unit area.
    pub air_energy: f64,
    /// Wind, tangent to the sphere at the cell center.
    pub air_velocity: Vector,
}

impl Climate {
    /// A calm cell with land and air both at the reference temperature.
    pub fn new(land_specific_heat: f64) -> Self {
        Climate {
            land_specific_heat,
            land_energy: land_specific_heat * ZERO_CELSIUS,
            air: 1.0,
            air_energy: AIR_SPECIFIC_HEAT * ZERO_CELSIUS,
            air_velocity: Vector::ZERO,
        }
    }

    pub fn land_temperature(&self) -> f64 {
        self.land_energy / self.land_specific_heat
    }

    pub fn air_temperature(&self) -> f64 {
        self.air_energy / (self.air * AIR_SPECIFIC_HEAT)
    }

    /// Dimensionless pressure: air mass times temperature, normalized to
    /// the reference.
    pub fn pressure(&self) -> f64 {
        self.air * self.air_temperature() / ZERO_CELSIUS
    }

    pub fn set_air_temperature(&mut self, temperature: f64) {
        self.air_energy = temperature * self.air * AIR_SPECIFIC_HEAT;
    }

    pub fn set_land_temperature(&mut self, temperature: f64) {
        self.land_energy = temperature * self.land_specific_heat;
    }

    /// One radiative step of `dt` seconds: absorb `flux` into the land,
    /// radiate through the atmosphere, then pull land and air 20% of the
    /// way toward their shared equilibrium.
    pub fn simulate(&mut self, flux: f64, latitude: f64, altitude: f64, dt: f64) {
        let incoming = flux * dt;
        let outgoing = dt
            * self.land_temperature().powi(4)
            * opacity(latitude, altitude)
            * STEFAN_BOLTZMANN;
        self.land_energy += incoming - outgoing;

        let total = self.air_energy + self.land_energy;
        let air_capacity = self.air * AIR_SPECIFIC_HEAT;
        let equilibrium_air = total * air_capacity / (air_capacity + self.land_specific_heat);
        let transfer = EQUILIBRATION_RATE * (equilibrium_air - self.air_energy);
        self.air_energy += transfer;
        self.land_energy -= transfer;
    }

    pub fn is_finite(&self) -> bool {
        self.land_energy.is_finite()
            && self.air.is_finite()
            && self.air_energy.is_finite()
            && self.air_velocity.is_finite()
    }
}

/// How opaque the atmosphere is to outgoing radiation: thinner over high
/// terrain, thicker toward the equator.
pub fn opacity(latitude: f64, altitude: f64) -> f64 {
    (0.5 + altitude / 3.0 - 0.23 * latitude.cos()).clamp(0.0, 1.0)
}

/// Assign land heat-capacity tiers from water presence: cells holding
/// water are ocean, dry cells touching water are coast, the rest desert.
pub fn seed_climates(waters: &[f64], sphere: &Geodesic) -> Vec<Climate> {
    let wet = |i: usize| waters[i] > 0.0;
    (0..waters.len())
        .map(|i| {
            let tier = if wet(i) {
                OCEAN_SPECIFIC_HEAT
            } else if sphere.neighbors(i).iter().any(|&n| wet(n)) {
                COAST_SPECIFIC_HEAT
            } else {
                DESERT_SPECIFIC_HEAT
            };
            Climate::new(tier)
        })
        .collect()
}
