/// Decimal digits kept when orientations are rounded before comparisons.
pub const ROUND_DIGITS: i32 = 12;
/// Coarser rounding used for phi on the poles of the unique-orbit boundary table.
pub const POLE_ROUND_DIGITS: i32 = 6;
/// Offset subtracted from a default upper phi bound to exclude the right border of the unit.
pub const PHI_BORDER_EPSILON: f64 = 1.0e-7;
/// Default angular step of the sampler, in degrees.
pub const DEFAULT_DELTA: f64 = 15.0;
/// Numerator of the Saff spiral point-count factor (`N = (3.6 / delta_rad)^2 * wedge`).
pub const SAFF_FACTOR: f64 = 3.6;
/// Multiple of the half-step chord beyond which k-nearest candidates are discarded.
pub const KNN_GUARD_FACTOR: f64 = 3.0;
/// Tolerance for treating two reduced orientations as the same neighbor.
pub const NEIGHBOR_MERGE_TOLERANCE: f64 = 1.0e-8;
/// Shifts in degrees tried in turn to move a border orbit member into the asymmetric unit.
pub const BORDER_TOLERANCES: [f64; 3] = [1.0e-10, 1.0e-8, 1.0e-6];
