use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::climate::{self, Climate};
use crate::config::generation::GenerationConfig;
use crate::geodesic::{Geodesic, face_count_at};
use crate::noise::PerlinFractal;
use crate::water;

/// The full state of one simulated planet: the refinement level it was
/// generated at and four parallel per-cell arrays. Optional arrays are
/// empty until the generator fills them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub size: usize,
    #[serde(default)]
    pub heights: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waters: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub climates: Vec<Climate>,
}

impl Planet {
    pub fn new(size: usize) -> Self {
        Planet {
            size,
            ..Planet::default()
        }
    }

    pub fn face_count(&self) -> usize {
        face_count_at(self.size)
    }

    /// Drop any state beyond the face count of `size`. A planet saved at a
    /// finer level can be reopened coarser; the leading cells line up
    /// because refinement preserves parent indices.
    pub fn truncate_to(&mut self, size: usize) {
        self.size = size;
        let n = face_count_at(size);
        self.heights.truncate(n);
        self.waters.truncate(n);
        self.flows.truncate(n);
        self.climates.truncate(n);
    }

    /// Every non-empty array must cover exactly one value per face.
    pub fn check_lengths(&self) {
        let n = self.face_count();
        for (name, len) in [
            ("heights", self.heights.len()),
            ("waters", self.waters.len()),
            ("flows", self.flows.len()),
            ("climates", self.climates.len()),
        ] {
            assert!(
                len == 0 || len == n,
                "planet of size {} expects {} cells but {} has {}",
                self.size,
                n,
                name,
                len
            );
        }
    }

    /// Fill any missing arrays in dependency order: heights from fractal
    /// noise, waters and flows by raining down the implied sea volume,
    /// climates from water presence. Returns whether anything was built.
    pub fn generate_missing(
        &mut self,
        seed: i64,
        sphere: &Geodesic,
        config: &GenerationConfig,
    ) -> bool {
        let mut mutated = false;
        if self.heights.is_empty() {
            info!(seed, "generating terrain");
            let fractal = PerlinFractal::new(
                seed,
                config.noise_dim,
                config.noise_depth,
                config.noise_scale,
            );
            add_terrain(self, sphere, &fractal);
            mutated = true;
        }
        if self.waters.is_empty() {
            info!(coverage = config.coverage, "raining oceans");
            add_water(
                self,
                config.coverage,
                config.water_quanta,
                config.min_lake_cells,
                sphere,
            );
            mutated = true;
        }
        if self.climates.is_empty() {
            info!("seeding climates");
            self.climates = climate::seed_climates(&self.waters, sphere);
            mutated = true;
        }
        self.check_lengths();
        mutated
    }
}

/// Sample the fractal field at every cell center.
pub fn add_terrain(planet: &mut Planet, sphere: &Geodesic, fractal: &PerlinFractal) {
    planet.heights = sphere
        .centers
        .iter()
        .map(|&center| fractal.value_at(center))
        .collect();
}

/// Fill oceans to roughly `coverage` of the surface: take the coverage
/// quantile of terrain height as sea level, work out how much water that
/// implies, then deliver it as repeated rain rounds followed by one
/// equalization so basins level out.
pub fn add_water(
    planet: &mut Planet,
    coverage: f64,
    quanta: f64,
    min_lake_cells: usize,
    sphere: &Geodesic,
) {
    let n = planet.heights.len();
    planet.waters = vec![0.0; n];
    planet.flows = vec![0.0; n];

    let mut sorted = planet.heights.clone();
    sorted.sort_by(f64::total_cmp);

    let sea_index = (n as f64 * coverage) as usize;
    let sea_level = sorted[sea_index];
    let sea_water: f64 = sorted
        .iter()
        .take_while(|&&h| h < sea_level)
        .map(|&h| sea_level - h)
        .sum();
    let average_water = sea_water / sea_index as f64;

    let rounds = (average_water / quanta) as usize;
    for round in 0..rounds {
        debug!(round, rounds, "raining");
        water::rain(
            quanta,
            &mut planet.waters,
            &planet.heights,
            &mut planet.flows,
            sphere,
        );
    }
    water::equalize(&mut planet.waters, &planet.heights, sphere, min_lake_cells);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::generation::GenerationConfig;
    use crate::geodesic::build_hierarchy;

    fn test_config() -> GenerationConfig {
        GenerationConfig {
            noise_depth: 8,
            min_lake_cells: 0,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn face_counts_by_size() {
        assert_eq!(Planet::new(0).face_count(), 12);
        assert_eq!(Planet::new(1).face_count(), 42);
        assert_eq!(Planet::new(9).face_count(), 2_621_442);
    }

    #[test]
    fn generate_fills_all_arrays() {
        let spheres = build_hierarchy(3);
        let sphere = spheres.last().unwrap();
        let mut planet = Planet::new(3);
        let mutated = planet.generate_missing(5, sphere, &test_config());

        assert!(mutated);
        assert_eq!(planet.heights.len(), 642);
        assert_eq!(planet.waters.len(), 642);
        assert_eq!(planet.flows.len(), 642);
        assert_eq!(planet.climates.len(), 642);
        assert!(planet.waters.iter().all(|&w| w >= 0.0));
        assert!(planet.flows.iter().all(|&f| f >= 0.0));
    }

    #[test]
    fn generation_is_deterministic_in_the_seed() {
        let spheres = build_hierarchy(2);
        let sphere = spheres.last().unwrap();

        let mut a = Planet::new(2);
        a.generate_missing(99, sphere, &test_config());
        let mut b = Planet::new(2);
        b.generate_missing(99, sphere, &test_config());
        assert_eq!(a, b, "two planets from seed 99 differ");

        let mut c = Planet::new(2);
        c.generate_missing(100, sphere, &test_config());
        assert_ne!(a.heights, c.heights, "different seeds produced equal terrain");
    }

    #[test]
    fn generate_is_a_noop_when_complete() {
        let spheres = build_hierarchy(2);
        let sphere = spheres.last().unwrap();
        let mut planet = Planet::new(2);
        planet.generate_missing(1, sphere, &test_config());

        let snapshot = planet.clone();
        let mutated = planet.generate_missing(1, sphere, &test_config());
        assert!(!mutated);
        assert_eq!(planet, snapshot);
    }

    #[test]
    fn water_covers_roughly_the_requested_fraction() {
        let spheres = build_hierarchy(3);
        let sphere = spheres.last().unwrap();
        let mut planet = Planet::new(3);
        planet.generate_missing(21, sphere, &test_config());

        let wet = planet.waters.iter().filter(|&&w| w > 1e-9).count();
        let fraction = wet as f64 / planet.waters.len() as f64;
        assert!(
            (0.2..=0.8).contains(&fraction),
            "wet fraction {fraction} is far from the 0.5 target"
        );
    }

    #[test]
    fn truncate_reopens_a_finer_planet_coarser() {
        let spheres = build_hierarchy(2);
        let sphere = spheres.last().unwrap();
        let mut fine = Planet::new(2);
        fine.generate_missing(7, sphere, &test_config());

        let mut coarse = fine.clone();
        coarse.truncate_to(1);
        coarse.check_lengths();
        assert_eq!(coarse.heights.len(), 42);
        assert_eq!(&fine.heights[..42], &coarse.heights[..]);
    }

    #[test]
    #[should_panic(expected = "expects")]
    fn mismatched_array_lengths_fail_fast() {
        let mut planet = Planet::new(1);
        planet.heights = vec![0.0; 10];
        planet.check_lengths();
    }
}
