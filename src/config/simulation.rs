use serde::Deserialize;
use std::path::Path;

/// Parameters for running the climate simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Directory holding the per-level tiling cache.
    #[serde(default = "default_sphere_directory")]
    pub sphere_directory: String,
    /// Directory holding planet state files, one per seed.
    #[serde(default = "default_planet_directory")]
    pub planet_directory: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Length of the climate spin-up before the first rendered step.
    #[serde(default = "default_spin_up_days")]
    pub spin_up_days: u32,
    /// Simulated minutes per outer step once spun up.
    #[serde(default = "default_step_minutes")]
    pub step_minutes: f64,
    /// Wind sub-steps per outer step.
    #[serde(default = "default_flow_substeps")]
    pub flow_substeps: u32,
    /// Conduction sub-steps per outer step.
    #[serde(default = "default_diffusion_substeps")]
    pub diffusion_substeps: u32,
    /// Outer steps between planet snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u32,
}

fn default_sphere_directory() -> String {
    "spheres".to_string()
}
fn default_planet_directory() -> String {
    "planets".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_spin_up_days() -> u32 {
    360
}
fn default_step_minutes() -> f64 {
    10.0
}
fn default_flow_substeps() -> u32 {
    5
}
fn default_diffusion_substeps() -> u32 {
    1
}
fn default_snapshot_interval() -> u32 {
    100
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            sphere_directory: default_sphere_directory(),
            planet_directory: default_planet_directory(),
            log_level: default_log_level(),
            spin_up_days: default_spin_up_days(),
            step_minutes: default_step_minutes(),
            flow_substeps: default_flow_substeps(),
            diffusion_substeps: default_diffusion_substeps(),
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.step_minutes <= 0.0 {
            errors.push(format!(
                "step_minutes must be > 0.0, got {}. Example: step_minutes = 10.0",
                self.step_minutes
            ));
        }
        if self.flow_substeps == 0 {
            errors.push(format!(
                "flow_substeps must be > 0, got {}. Example: flow_substeps = 5",
                self.flow_substeps
            ));
        }
        if self.diffusion_substeps == 0 {
            errors.push(format!(
                "diffusion_substeps must be > 0, got {}. Example: diffusion_substeps = 1",
                self.diffusion_substeps
            ));
        }
        if self.snapshot_interval == 0 {
            errors.push(format!(
                "snapshot_interval must be > 0, got {}. Example: snapshot_interval = 100",
                self.snapshot_interval
            ));
        }
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    /// Seconds advanced by one outer step.
    pub fn step_seconds(&self) -> f64 {
        self.step_minutes * 60.0
    }
}
