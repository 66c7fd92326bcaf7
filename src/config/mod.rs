pub mod generation;
pub mod simulation;

pub use generation::GenerationConfig;
pub use simulation::SimulationConfig;
