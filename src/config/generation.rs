use serde::Deserialize;
use std::path::Path;

/// Parameters for generating a planet from a seed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationConfig {
    /// Refinement depth of the tiling the planet lives on.
    #[serde(default = "default_size")]
    pub size: usize,
    /// Target fraction of the surface covered by water.
    #[serde(default = "default_coverage")]
    pub coverage: f64,
    /// Side length of the periodic gradient lattice.
    #[serde(default = "default_noise_dim")]
    pub noise_dim: usize,
    /// Number of fractal octaves beyond the base.
    #[serde(default = "default_noise_depth")]
    pub noise_depth: usize,
    /// Per-octave attenuation and coordinate scale, in (0, 1).
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,
    /// Water dropped per cell per rain round while filling oceans.
    #[serde(default = "default_water_quanta")]
    pub water_quanta: f64,
    /// Lakes smaller than this many cells are left unleveled.
    #[serde(default = "default_min_lake_cells")]
    pub min_lake_cells: usize,
}

fn default_size() -> usize {
    6
}
fn default_coverage() -> f64 {
    0.5
}
fn default_noise_dim() -> usize {
    10
}
fn default_noise_depth() -> usize {
    30
}
fn default_noise_scale() -> f64 {
    0.6
}
fn default_water_quanta() -> f64 {
    0.01
}
fn default_min_lake_cells() -> usize {
    100
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            size: default_size(),
            coverage: default_coverage(),
            noise_dim: default_noise_dim(),
            noise_depth: default_noise_depth(),
            noise_scale: default_noise_scale(),
            water_quanta: default_water_quanta(),
            min_lake_cells: default_min_lake_cells(),
        }
    }
}

impl GenerationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: GenerationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.size > 12 {
            errors.push(format!(
                "size must be at most 12, got {}. A size-12 tiling already has 167 million cells",
                self.size
            ));
        }
        if !(self.coverage > 0.0 && self.coverage < 1.0) {
            errors.push(format!(
                "coverage must be in (0.0, 1.0), got {}. Example: coverage = 0.5",
                self.coverage
            ));
        }
        if self.noise_dim < 2 {
            errors.push(format!(
                "noise_dim must be at least 2, got {}. Example: noise_dim = 10",
                self.noise_dim
            ));
        }
        if !(self.noise_scale > 0.0 && self.noise_scale < 1.0) {
            errors.push(format!(
                "noise_scale must be in (0.0, 1.0), got {}. Example: noise_scale = 0.6",
                self.noise_scale
            ));
        }
        if self.water_quanta <= 0.0 {
            errors.push(format!(
                "water_quanta must be > 0.0, got {}. Example: water_quanta = 0.01",
                self.water_quanta
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
