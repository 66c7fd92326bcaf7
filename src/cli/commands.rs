use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::{GenerationConfig, SimulationConfig};
use crate::geodesic::Geodesic;
use crate::persistence;
use crate::planet::Planet;
use crate::simulation::{ClimateStatistics, Simulation};

/// Generate a planet from a seed (or open the existing one and fill in
/// whatever arrays it is missing), then save it.
pub fn generate(
    config: &SimulationConfig,
    generation: &GenerationConfig,
    seed: i64,
) -> Result<(), String> {
    let spheres = load_spheres(config, generation.size)?;
    let sphere = &spheres[generation.size];

    let planet_dir = Path::new(&config.planet_directory);
    let mut planet = persistence::load_planet(planet_dir, seed, generation.size)
        .map_err(|e| e.to_string())?
        .unwrap_or_else(|| Planet::new(generation.size));

    let mutated = planet.generate_missing(seed, sphere, generation);
    if mutated {
        let path =
            persistence::save_planet(planet_dir, seed, &planet).map_err(|e| e.to_string())?;
        println!("Planet saved to {}", path.display());
    } else {
        println!("Planet {} is already complete", seed);
    }

    print_planet_summary(seed, &planet);
    Ok(())
}

/// Run up to `steps` outer simulation steps against a planet, spinning the
/// climate up first if it has never been simulated. Raising `stop` from
/// another thread ends the run at the next step boundary. Returns the
/// number of steps actually executed.
pub fn simulate(
    config: &SimulationConfig,
    generation: &GenerationConfig,
    seed: i64,
    steps: u64,
    stop: &AtomicBool,
) -> Result<u64, String> {
    let spheres = load_spheres(config, generation.size)?;
    let sphere = &spheres[generation.size];
    let planet_dir = Path::new(&config.planet_directory);

    let mut planet = persistence::load_planet(planet_dir, seed, generation.size)
        .map_err(|e| e.to_string())?
        .unwrap_or_else(|| Planet::new(generation.size));
    let fresh_climate = planet.climates.is_empty();
    if planet.generate_missing(seed, sphere, generation) {
        persistence::save_planet(planet_dir, seed, &planet).map_err(|e| e.to_string())?;
    }

    let mut simulation = Simulation::new(sphere, config);
    if fresh_climate {
        simulation.spin_up(&mut planet);
        persistence::save_planet(planet_dir, seed, &planet).map_err(|e| e.to_string())?;
        info!("spin-up complete");
    }

    let mut executed = 0u64;
    let mut since_snapshot = 0u32;
    for step in 0..steps {
        if stop.load(Ordering::Relaxed) {
            warn!(step, "stop requested, ending simulation early");
            break;
        }

        simulation.step(&mut planet);
        executed += 1;

        since_snapshot += 1;
        if since_snapshot >= config.snapshot_interval {
            since_snapshot = 0;
            match persistence::save_planet(planet_dir, seed, &planet) {
                Ok(path) => info!(step, path = %path.display(), "snapshot saved"),
                Err(e) => warn!(step, error = %e, "snapshot save failed"),
            }
        }

        if (step + 1) % 100 == 0 {
            let stats = ClimateStatistics::compute(&planet.climates);
            info!(
                step = step + 1,
                day = simulation.day,
                mean_land_temperature = stats.mean_land_temperature,
                max_wind_speed = stats.max_wind_speed,
                "simulated"
            );
        }
    }

    persistence::save_planet(planet_dir, seed, &planet).map_err(|e| e.to_string())?;
    println!("Simulation stopped at day {:.2}", simulation.day);
    print_planet_summary(seed, &planet);
    Ok(executed)
}

/// Inspect a single cell or the whole planet.
pub fn inspect(
    config: &SimulationConfig,
    generation: &GenerationConfig,
    seed: i64,
    cell: Option<usize>,
) -> Result<(), String> {
    let planet_dir = Path::new(&config.planet_directory);
    let planet = persistence::load_planet(planet_dir, seed, generation.size)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            format!("No planet for seed {}. Generate one with: tellus generate", seed)
        })?;

    match cell {
        Some(index) => {
            let spheres = load_spheres(config, generation.size)?;
            inspect_cell(&planet, &spheres[generation.size], index)
        }
        None => {
            print_planet_summary(seed, &planet);
            Ok(())
        }
    }
}

/// Build (or verify) the tiling cache up to `size`.
pub fn build_spheres(config: &SimulationConfig, size: usize) -> Result<(), String> {
    let spheres = load_spheres(config, size)?;
    for (level, sphere) in spheres.iter().enumerate() {
        println!(
            "level {:2}: {:>9} faces, {:>9} edges",
            level,
            sphere.face_count(),
            sphere.edge_count()
        );
    }
    Ok(())
}

fn load_spheres(config: &SimulationConfig, size: usize) -> Result<Vec<Geodesic>, String> {
    persistence::load_or_build_spheres(Path::new(&config.sphere_directory), size)
        .map_err(|e| e.to_string())
}

fn inspect_cell(planet: &Planet, sphere: &Geodesic, index: usize) -> Result<(), String> {
    if index >= planet.face_count() {
        return Err(format!(
            "Cell {} out of range (planet has {} cells)",
            index,
            planet.face_count()
        ));
    }

    let center = sphere.centers[index];
    let angle = center.angle();
    println!("=== Cell {} ===", index);
    println!("Center: ({:.4}, {:.4}, {:.4})", center.x, center.y, center.z);
    println!(
        "Latitude: {:.2}°  Longitude: {:.2}°",
        angle.theta.to_degrees(),
        angle.phi.to_degrees()
    );
    println!("Neighbors: {:?}", sphere.neighbors(index));
    println!("Height: {:.4}", planet.heights[index]);
    if !planet.waters.is_empty() {
        println!("Water: {:.4}", planet.waters[index]);
        println!("Flow: {:.4}", planet.flows[index]);
    }
    if let Some(climate) = planet.climates.get(index) {
        println!();
        println!("--- Climate ---");
        println!(
            "  Land: {:.2} K ({:.2} °C), capacity {:.0}",
            climate.land_temperature(),
            climate.land_temperature() - crate::climate::ZERO_CELSIUS,
            climate.land_specific_heat
        );
        println!(
            "  Air: {:.2} K, mass {:.4}, pressure {:.4}",
            climate.air_temperature(),
            climate.air,
            climate.pressure()
        );
        println!(
            "  Wind: {:.5} ({:.5}, {:.5}, {:.5})",
            climate.air_velocity.length(),
            climate.air_velocity.x,
            climate.air_velocity.y,
            climate.air_velocity.z
        );
    }
    Ok(())
}

fn print_planet_summary(seed: i64, planet: &Planet) {
    println!("=== Planet {} ===", seed);
    println!("Size: {} ({} cells)", planet.size, planet.face_count());

    let n = planet.heights.len();
    if n == 0 {
        println!("(no terrain yet)");
        return;
    }

    let min = planet.heights.iter().copied().fold(f64::MAX, f64::min);
    let max = planet.heights.iter().copied().fold(f64::MIN, f64::max);
    let mean: f64 = planet.heights.iter().sum::<f64>() / n as f64;
    println!("Height: min {:.3}, mean {:.3}, max {:.3}", min, mean, max);

    if !planet.waters.is_empty() {
        let wet = planet.waters.iter().filter(|&&w| w > 1e-9).count();
        let total: f64 = planet.waters.iter().sum();
        println!(
            "Water: {:.1}% of cells wet, {:.1} total volume",
            wet as f64 / n as f64 * 100.0,
            total
        );
    }

    if !planet.climates.is_empty() {
        let stats = ClimateStatistics::compute(&planet.climates);
        println!(
            "Land temperature: min {:.1} K, mean {:.1} K, max {:.1} K",
            stats.min_land_temperature, stats.mean_land_temperature, stats.max_land_temperature
        );
        println!(
            "Air: {:.1} total mass, max wind {:.4}",
            stats.total_air, stats.max_wind_speed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    /// A 12-cell planet and short spin-up, so tests spend their time in
    /// the stepped loop rather than in generation.
    fn test_configs(dir: &TempDir) -> (SimulationConfig, GenerationConfig) {
        let config = SimulationConfig {
            sphere_directory: dir.path().join("spheres").to_str().unwrap().to_string(),
            planet_directory: dir.path().join("planets").to_str().unwrap().to_string(),
            spin_up_days: 1,
            snapshot_interval: 1_000_000,
            ..SimulationConfig::default()
        };
        let generation = GenerationConfig {
            size: 0,
            noise_depth: 8,
            min_lake_cells: 0,
            ..GenerationConfig::default()
        };
        (config, generation)
    }

    #[test]
    fn simulate_runs_the_requested_steps_when_not_stopped() {
        let dir = TempDir::new().unwrap();
        let (config, generation) = test_configs(&dir);
        let stop = AtomicBool::new(false);

        let executed = simulate(&config, &generation, 61, 20, &stop).unwrap();
        assert_eq!(executed, 20);
    }

    #[test]
    fn simulate_stops_before_the_first_step_when_already_flagged() {
        let dir = TempDir::new().unwrap();
        let (config, generation) = test_configs(&dir);
        let stop = AtomicBool::new(true);

        let executed = simulate(&config, &generation, 62, 100, &stop).unwrap();
        assert_eq!(executed, 0, "a raised flag must stop the loop at step 0");
    }

    #[test]
    fn simulate_ends_early_when_flagged_mid_run() {
        let dir = TempDir::new().unwrap();
        let (config, generation) = test_configs(&dir);
        let stop = Arc::new(AtomicBool::new(false));

        let flipper = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(200));
                stop.store(true, Ordering::Relaxed);
            })
        };

        // Far more steps than 200ms of a 12-cell planet can cover; the run
        // only finishes promptly because the flag cuts it short.
        let steps = 1_000_000;
        let executed = simulate(&config, &generation, 63, steps, &stop).unwrap();
        flipper.join().unwrap();

        assert!(
            executed < steps,
            "simulate ran all {steps} steps despite the stop flag"
        );
    }
}
