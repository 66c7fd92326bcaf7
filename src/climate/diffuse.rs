use crate::climate::Climate;
use crate::geodesic::Geodesic;

/// Energy moved per second per kelvin of temperature difference across an
/// edge.
const DIFFUSION_COEFFICIENT: f64 = 3.0;

/// One explicit conduction step of `dt` seconds: each cell's land and air
/// reservoirs move energy along the local temperature Laplacian.
///
/// Rates are computed from a pre-step temperature snapshot, so traversal
/// order cannot leak into the result. Stability requires
/// `dt · 3 · degree` to stay well under the smallest heat capacity.
pub fn diffuse(climates: &mut [Climate], sphere: &Geodesic, dt: f64) {
    let land_temps: Vec<f64> = climates.iter().map(Climate::land_temperature).collect();
    let air_temps: Vec<f64> = climates.iter().map(Climate::air_temperature).collect();

    let mut land_rates = vec![0.0; climates.len()];
    let mut air_rates = vec![0.0; climates.len()];
    for i in 0..climates.len() {
        for &n in sphere.neighbors(i) {
            land_rates[i] += land_temps[n] - land_temps[i];
            air_rates[i] += air_temps[n] - air_temps[i];
        }
    }

    for (i, climate) in climates.iter_mut().enumerate() {
        climate.land_energy += land_rates[i] * DIFFUSION_COEFFICIENT * dt;
        climate.air_energy += air_rates[i] * DIFFUSION_COEFFICIENT * dt;
    }
}
