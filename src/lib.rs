pub mod cli;
pub mod climate;
pub mod config;
pub mod diffeq;
pub mod geodesic;
pub mod noise;
pub mod persistence;
pub mod planet;
pub mod simulation;
pub mod water;
