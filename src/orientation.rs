use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// An orientation as a spider-convention Euler triplet in degrees.
///
/// `phi` and `psi` live in `[0, 360)`, `theta` in `[0, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Euler {
    pub phi: f64,
    pub theta: f64,
    pub psi: f64,
}

impl Euler {
    pub fn new(phi: f64, theta: f64, psi: f64) -> Self {
        Self { phi, theta, psi }
    }

    /// A projection direction, i.e. an orientation with zero in-plane rotation.
    pub fn direction(phi: f64, theta: f64) -> Self {
        Self::new(phi, theta, 0.0)
    }

    /// True if the orientation sits exactly on one of the poles.
    pub fn on_pole(&self) -> bool {
        self.theta == 0.0 || self.theta == 180.0
    }

    /// Unit vector of the projection direction.
    pub fn to_cartesian(&self) -> Vector3<f64> {
        let phi = self.phi.to_radians();
        let theta = self.theta.to_radians();
        let sin_theta = theta.sin();
        Vector3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, theta.cos())
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.phi, self.theta, self.psi]
    }

    /// True if both orientations agree to within `tol` degrees on every angle,
    /// treating 0 and 360 as the same value.
    pub fn approx_eq(&self, other: &Euler, tol: f64) -> bool {
        let close = |a: f64, b: f64| {
            let d = (a - b).abs();
            d <= tol || (d - 360.0).abs() <= tol
        };
        close(self.phi, other.phi)
            && (self.theta - other.theta).abs() <= tol
            && close(self.psi, other.psi)
    }
}

impl From<[f64; 3]> for Euler {
    fn from(a: [f64; 3]) -> Self {
        Euler::new(a[0], a[1], a[2])
    }
}

impl From<(f64, f64, f64)> for Euler {
    fn from((phi, theta, psi): (f64, f64, f64)) -> Self {
        Euler::new(phi, theta, psi)
    }
}

impl fmt::Display for Euler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>12.6} {:>12.6} {:>12.6}", self.phi, self.theta, self.psi)
    }
}

/// Parse a string of Euler angles in the format "phi,theta,psi".
impl FromStr for Euler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let angles: Vec<&str> = s.split(',').map(str::trim).collect();
        if angles.len() != 3 {
            return Err(format!(
                "Invalid Euler angle format: '{}'. Expected 'phi,theta,psi'",
                s
            ));
        }

        let parse = |name: &str, value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| format!("Failed to parse {} angle: {}", name, value))
        };

        Ok(Euler::new(
            parse("phi", angles[0])?,
            parse("theta", angles[1])?,
            parse("psi", angles[2])?,
        ))
    }
}

/// Cartesian unit vectors of a batch of orientations.
pub fn to_cartesian(angles: &[Euler]) -> Vec<[f64; 3]> {
    angles
        .iter()
        .map(|a| {
            let v = a.to_cartesian();
            [v.x, v.y, v.z]
        })
        .collect()
}

/// Rounds like numpy: scale, round half to even, unscale.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

/// Wraps an angle into `[0, 360)`, mapping `-0.0` to `0.0`.
pub fn wrap360(value: f64) -> f64 {
    value.rem_euclid(360.0) + 0.0
}

/// A discrete set of orientations.
#[derive(Debug, Clone, PartialEq)]
pub struct Orientations {
    pub num_orientations: usize,
    pub eulers: Vec<Euler>,
}

impl Orientations {
    /// Orientations drawn uniformly over the rotation group, in degrees.
    /// A seed makes the draw reproducible.
    pub fn random_uniform(num_orient: usize, seed: Option<u64>) -> Orientations {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let eulers = (0..num_orient)
            .map(|_| {
                let phi = rng.random_range(0.0..360.0);
                let theta = (1.0 - rng.random_range(0.0..1.0) * 2.0_f64).acos().to_degrees();
                let psi = rng.random_range(0.0..360.0);
                Euler::new(phi, theta, psi)
            })
            .collect();

        Orientations {
            num_orientations: num_orient,
            eulers,
        }
    }
}
