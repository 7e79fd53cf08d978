//! Conversions between spider Euler triplets and rotation matrices.
//!
//! The matrix convention is fixed: the symmetry operator tables in
//! [`crate::family`] are defined relative to it. Batch functions run
//! element-wise in parallel and preserve input order.

use nalgebra::Matrix3;
use rayon::prelude::*;

use crate::config::ROUND_DIGITS;
use crate::orientation::{round_to, wrap360, Euler};

/// A 3x3 rotation matrix in the spider convention.
pub type Rotation = Matrix3<f64>;

impl Euler {
    /// Rotation matrix of this orientation.
    pub fn to_matrix(&self) -> Rotation {
        let (sin_phi, cos_phi) = self.phi.to_radians().sin_cos();
        let (sin_theta, cos_theta) = self.theta.to_radians().sin_cos();
        let (sin_psi, cos_psi) = self.psi.to_radians().sin_cos();

        Matrix3::new(
            cos_psi * cos_theta * cos_phi - sin_psi * sin_phi,
            cos_psi * cos_theta * sin_phi + sin_psi * cos_phi,
            -cos_psi * sin_theta,
            -sin_psi * cos_theta * cos_phi - cos_psi * sin_phi,
            -sin_psi * cos_theta * sin_phi + cos_psi * cos_phi,
            sin_psi * sin_theta,
            sin_theta * cos_phi,
            sin_theta * sin_phi,
            cos_theta,
        )
    }

    /// Recovers the Euler triplet of a rotation matrix.
    ///
    /// On the poles (`R22 == ±1`) phi carries the whole in-plane rotation and
    /// theta, psi collapse to their pole values. Angles are rounded to
    /// [`ROUND_DIGITS`] decimals and wrapped into `[0, 360)`.
    pub fn from_matrix(matrix: &Rotation) -> Euler {
        let m = matrix.map(|v| v.clamp(-1.0, 1.0));

        let (phi, theta, psi) = if m[(2, 2)] == 1.0 {
            let phi = if m[(0, 0)] == 0.0 {
                m[(0, 1)].asin()
            } else {
                m[(0, 1)].atan2(m[(0, 0)])
            };
            (phi.to_degrees(), 0.0, 0.0)
        } else if m[(2, 2)] == -1.0 {
            let phi = if m[(0, 0)] == 0.0 {
                (-m[(0, 1)]).asin()
            } else {
                (-m[(0, 1)]).atan2(-m[(0, 0)])
            };
            (phi.to_degrees(), 180.0, 0.0)
        } else {
            // theta = acos(R22) is never negative, so sin(theta) >= 0 and the
            // quadrant follows the signs of the third row and column directly.
            let phi = if m[(2, 0)] == 0.0 {
                quarter_turn(m[(2, 1)])
            } else {
                m[(2, 1)].atan2(m[(2, 0)]).to_degrees()
            };
            let psi = if m[(0, 2)] == 0.0 {
                quarter_turn(m[(1, 2)])
            } else {
                m[(1, 2)].atan2(-m[(0, 2)]).to_degrees()
            };
            (phi, m[(2, 2)].acos().to_degrees(), psi)
        };

        Euler::new(
            wrap360(round_to(phi, ROUND_DIGITS)),
            wrap360(round_to(theta, ROUND_DIGITS)),
            wrap360(round_to(psi, ROUND_DIGITS)),
        )
    }
}

/// 90 or 270 degrees for an entry whose partner in `atan2` vanished.
fn quarter_turn(entry: f64) -> f64 {
    if entry < 0.0 {
        270.0
    } else {
        90.0
    }
}

/// Rotation matrices of a batch of orientations.
pub fn rotmatrix(angles: &[Euler]) -> Vec<Rotation> {
    angles.par_iter().map(Euler::to_matrix).collect()
}

/// Euler triplets of a batch of rotation matrices.
pub fn recmat(matrices: &[Rotation]) -> Vec<Euler> {
    matrices.par_iter().map(Euler::from_matrix).collect()
}

/// Element-wise matrix products `lhs[i] * rhs[i]`.
///
/// Both operands must have the same length, or one of them a single matrix
/// which is then broadcast against the other.
pub fn mulmat(lhs: &[Rotation], rhs: &[Rotation]) -> Vec<Rotation> {
    assert!(
        lhs.len() == rhs.len() || lhs.len() == 1 || rhs.len() == 1,
        "cannot multiply {} matrices with {} matrices",
        lhs.len(),
        rhs.len()
    );
    let n = lhs.len().max(rhs.len());
    (0..n)
        .into_par_iter()
        .map(|i| lhs[i.min(lhs.len() - 1)] * rhs[i.min(rhs.len() - 1)])
        .collect()
}

/// Applies the inverse of the rotation `transform` to each orientation.
pub fn rotate_params(params: &[Euler], transform: &Euler) -> Vec<Euler> {
    let inverse = Euler::new(-transform.psi, -transform.theta, -transform.phi).to_matrix();
    params
        .par_iter()
        .map(|p| Euler::from_matrix(&(p.to_matrix() * inverse)))
        .collect()
}
