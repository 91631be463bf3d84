pub mod active;
pub mod config;
pub mod fov;
pub mod locus;
pub mod ray;
pub mod regression;
pub mod scenario;
pub mod sector;
pub mod vector;

pub use config::{Config, ConfigSource};
pub use fov::{calculate_hex_fov, FovError, HexTile, Sweep, SweepStep, TileCover, ViewCone};
pub use scenario::{Scenario, ScenarioError};
