pub mod statistics;

use tracing::info;

use crate::climate::{Sun, diffuse, flow};
use crate::config::SimulationConfig;
use crate::geodesic::Geodesic;
use crate::planet::Planet;

pub use statistics::ClimateStatistics;

/// Spin-up runs at hourly steps with extra conduction, fast-forwarding the
/// climate to its periodic limit cycle before the first rendered step.
const SPIN_UP_STEP_SECONDS: f64 = 3600.0;
const SPIN_UP_DIFFUSION_SUBSTEPS: u32 = 6;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Advances a planet's climate through simulated time. Owns nothing but
/// the calendar; the planet is borrowed per call and the mesh and config
/// are shared read-only.
pub struct Simulation<'a> {
    sphere: &'a Geodesic,
    config: &'a SimulationConfig,
    /// Days since noon at the spring equinox of year zero.
    pub day: f64,
}

impl<'a> Simulation<'a> {
    pub fn new(sphere: &'a Geodesic, config: &'a SimulationConfig) -> Self {
        Simulation {
            sphere,
            config,
            day: 0.0,
        }
    }

    /// Run the configured spin-up: a year of radiative steps and
    /// conduction, no wind. The atmosphere settles into its diurnal and
    /// seasonal cycle long before the year is out.
    pub fn spin_up(&mut self, planet: &mut Planet) {
        let days = self.config.spin_up_days;
        let steps_per_day = (SECONDS_PER_DAY / SPIN_UP_STEP_SECONDS) as u32;
        info!(days, "spinning up climate");

        for day in 0..days {
            for _ in 0..steps_per_day {
                self.heat_step(planet, SPIN_UP_STEP_SECONDS);
                for _ in 0..SPIN_UP_DIFFUSION_SUBSTEPS {
                    diffuse(
                        &mut planet.climates,
                        self.sphere,
                        SPIN_UP_STEP_SECONDS / SPIN_UP_DIFFUSION_SUBSTEPS as f64,
                    );
                }
                self.day += SPIN_UP_STEP_SECONDS / SECONDS_PER_DAY;
                self.check_climates(planet);
            }
            if (day + 1) % 60 == 0 {
                let stats = ClimateStatistics::compute(&planet.climates);
                info!(
                    day = day + 1,
                    mean_land_temperature = stats.mean_land_temperature,
                    "spin-up progress"
                );
            }
        }
    }

    /// One outer simulation step: radiative heating, the configured number
    /// of wind sub-steps, then conduction.
    pub fn step(&mut self, planet: &mut Planet) {
        let dt = self.config.step_seconds();

        self.heat_step(planet, dt);

        let minutes_per_substep = self.config.step_minutes / self.config.flow_substeps as f64;
        for _ in 0..self.config.flow_substeps {
            flow(&mut planet.climates, self.sphere, minutes_per_substep);
        }

        for _ in 0..self.config.diffusion_substeps {
            diffuse(
                &mut planet.climates,
                self.sphere,
                dt / self.config.diffusion_substeps as f64,
            );
        }

        self.day += dt / SECONDS_PER_DAY;
        self.check_climates(planet);
    }

    /// Absorb sunlight and radiate to space in every cell.
    fn heat_step(&self, planet: &mut Planet, dt: f64) {
        let sun = Sun::at_day(self.day);
        for (i, climate) in planet.climates.iter_mut().enumerate() {
            let center = self.sphere.centers[i];
            let latitude = center.z.clamp(-1.0, 1.0).asin();
            let altitude = planet.heights[i] + planet.waters[i];
            climate.simulate(sun.flux(center), latitude, altitude, dt);
        }
    }

    /// The solver never produces NaN from valid state; if a cell diverges
    /// anyway, stop immediately with enough context to reproduce it.
    fn check_climates(&self, planet: &Planet) {
        let sun = Sun::at_day(self.day);
        for (i, climate) in planet.climates.iter().enumerate() {
            if !climate.is_finite() {
                panic!(
                    "climate diverged at cell {}: day {}, sun {:?}, flux {}, \
                     land temperature {}, air {}, air energy {}, wind {:?}",
                    i,
                    self.day,
                    sun.direction,
                    sun.flux(self.sphere.centers[i]),
                    climate.land_temperature(),
                    climate.air,
                    climate.air_energy,
                    climate.air_velocity,
                );
            }
        }
    }
}
