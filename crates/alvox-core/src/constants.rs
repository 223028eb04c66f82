//! Shared constants for the alvox selection engine.

/// alvox version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tolerance used when comparing labeled ratios.
pub const LABEL_RATIO_TOLERANCE: f64 = 1e-6;

/// Relative slack subtracted before taking the ceiling of a selection budget,
/// so that products like 0.2 * 15 stay at 3 instead of rounding up to 4.
pub const BUDGET_EPSILON: f64 = 1e-9;

/// Default percentage of eligible units selected per round.
pub const DEFAULT_PERCENTAGE: f64 = 1.0;

/// Default cumulative labeled percentage at which selection stops.
pub const DEFAULT_TARGET_PERCENTAGE: f64 = 100.0;

/// Default seed for the random criterion.
pub const DEFAULT_SEED: u64 = 0;

/// Default number of points per model forward call.
pub const DEFAULT_BATCH_SIZE: usize = 65_536;

/// Default diversity strength (exponent for `product`, mix weight for `additive`).
pub const DEFAULT_DIVERSITY_STRENGTH: f64 = 1.0;

/// Default grid cell edge for the inverse-density diversity term, in cloud units.
pub const DEFAULT_DENSITY_CELL_SIZE: f64 = 1.0;

/// Default on-disk database file name, relative to the config root.
pub const DEFAULT_DATABASE_FILE: &str = "alvox.db";

/// Project config file name.
pub const CONFIG_FILE_NAME: &str = "alvox.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "ALVOX_LOG";

/// Voxel index marking a point that projects onto no voxel.
pub const IGNORED_VOXEL: i64 = -1;
