//! Quasi-uniform angular sampling of an asymmetric unit.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DELTA, PHI_BORDER_EPSILON, SAFF_FACTOR};
use crate::error::{Result, SymmetryError};
use crate::family::{Brackets, SymmetryFamily};
use crate::neighbors::NeighborIndex;
use crate::orientation::Euler;
use crate::symmetry::Symmetry;

/// Point placement strategy of the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Method {
    /// Saff spiral: one low discrepancy spiral from `theta1` towards `theta2`.
    #[default]
    #[serde(rename = "S")]
    Spiral,
    /// Parallels of constant theta, from `theta1` up.
    #[serde(rename = "P")]
    Parallels,
    /// Parallels walked outwards from the equator.
    #[serde(rename = "M")]
    ParallelsFromEquator,
}

impl FromStr for Method {
    type Err = SymmetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "S" | "s" => Ok(Method::Spiral),
            "P" | "p" => Ok(Method::Parallels),
            "M" | "m" => Ok(Method::ParallelsFromEquator),
            other => Err(SymmetryError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Method::Spiral => "S",
            Method::Parallels => "P",
            Method::ParallelsFromEquator => "M",
        };
        write!(f, "{}", code)
    }
}

/// How psi of the sampled orientations is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PhiEqPsi {
    /// psi = 0
    #[default]
    Zero,
    /// psi = -phi
    Minus,
}

impl FromStr for PhiEqPsi {
    type Err = SymmetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zero" => Ok(PhiEqPsi::Zero),
            "minus" => Ok(PhiEqPsi::Minus),
            _ => Err(SymmetryError::UnknownPhiEqPsi(s.to_string())),
        }
    }
}

/// Parameters of one sampling.
///
/// Angles are in degrees. A bound that is `None` or negative is replaced by a
/// default derived from the brackets of the symmetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub delta: f64,
    pub theta1: Option<f64>,
    pub theta2: Option<f64>,
    pub phi1: Option<f64>,
    pub phi2: Option<f64>,
    pub method: Method,
    pub phi_eq_psi: PhiEqPsi,
    pub inc_mirror: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DELTA)
    }
}

impl SamplingConfig {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            theta1: None,
            theta2: None,
            phi1: None,
            phi2: None,
            method: Method::default(),
            phi_eq_psi: PhiEqPsi::default(),
            inc_mirror: true,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_theta(mut self, theta1: Option<f64>, theta2: Option<f64>) -> Self {
        self.theta1 = theta1;
        self.theta2 = theta2;
        self
    }

    pub fn with_phi(mut self, phi1: Option<f64>, phi2: Option<f64>) -> Self {
        self.phi1 = phi1;
        self.phi2 = phi2;
        self
    }

    pub fn with_phi_eq_psi(mut self, phi_eq_psi: PhiEqPsi) -> Self {
        self.phi_eq_psi = phi_eq_psi;
        self
    }

    pub fn with_inc_mirror(mut self, inc_mirror: bool) -> Self {
        self.inc_mirror = inc_mirror;
        self
    }
}

fn given(bound: Option<f64>) -> Option<f64> {
    bound.filter(|v| *v >= 0.0)
}

/// Sampling bounds after defaults were applied.
struct Bounds {
    theta1: f64,
    theta2: f64,
    phi1: f64,
    phi2: f64,
    /// Upper theta of the with-mirror unit, used for the spiral point budget.
    spiral_theta2: f64,
    /// Upper phi of the with-mirror unit, used as the spiral's phi span.
    spiral_phi2: f64,
}

impl Bounds {
    fn resolve(brackets: &Brackets, config: &SamplingConfig) -> Result<Self> {
        let unit = brackets[config.inc_mirror as usize];
        let (theta1, theta2) = (given(config.theta1), given(config.theta2));
        let (phi1, phi2) = (given(config.phi1), given(config.phi2));

        let bounds = Bounds {
            theta1: theta1.unwrap_or(0.0),
            theta2: theta2.unwrap_or(unit.alpha),
            phi1: phi1.unwrap_or(0.0),
            phi2: phi2.unwrap_or(unit.phi - PHI_BORDER_EPSILON),
            spiral_theta2: theta2.unwrap_or(brackets[1].alpha),
            spiral_phi2: phi2.unwrap_or(brackets[1].phi - PHI_BORDER_EPSILON),
        };

        if bounds.phi2 < bounds.phi1
            || bounds.theta2 < bounds.theta1
            || bounds.theta2 > 180.0
            || config.delta.is_nan()
            || config.delta <= 0.0
        {
            return Err(SymmetryError::InvalidRange {
                phi1: bounds.phi1,
                phi2: bounds.phi2,
                theta1: bounds.theta1,
                theta2: bounds.theta2,
                delta: config.delta,
            });
        }
        Ok(bounds)
    }
}

/// Generates the sampling described by `config` for one symmetry family.
pub fn even_angles(
    family: SymmetryFamily,
    brackets: &Brackets,
    config: &SamplingConfig,
) -> Result<Vec<Euler>> {
    let mut bounds = Bounds::resolve(brackets, config)?;
    let delta = config.delta;
    let inside = |phi: f64, theta: f64| family.contains(brackets, phi, theta, config.inc_mirror);

    let mut angles = Vec::new();
    match config.method {
        Method::Parallels => {
            let mut theta = bounds.theta1;
            while theta <= bounds.theta2 {
                parallel(&bounds, delta, theta, None, &mut angles);
                theta += delta;
            }
        }
        Method::ParallelsFromEquator => {
            bounds.theta2 = bounds.theta2.max(90.0);
            let filter = family
                .is_platonic()
                .then_some(&inside as &dyn Fn(f64, f64) -> bool);

            let mut theta = 90.0;
            while theta >= bounds.theta1 {
                parallel(&bounds, delta, theta, filter, &mut angles);
                theta -= delta;
            }
            angles.reverse();

            theta = 90.0 + delta;
            while theta <= bounds.theta2 {
                parallel(&bounds, delta, theta, filter, &mut angles);
                theta += delta;
            }
        }
        Method::Spiral => spiral(&bounds, delta, &inside, &mut angles),
    }

    if config.phi_eq_psi == PhiEqPsi::Minus {
        for angle in angles.iter_mut() {
            angle.psi = (720.0 - angle.phi) % 360.0;
        }
    }

    let axial = matches!(family, SymmetryFamily::Cyclic(_) | SymmetryFamily::Dihedral(_));
    if axial && bounds.theta2 == 180.0 {
        angles.push(Euler::new(0.0, 180.0, 0.0));
    }

    Ok(angles)
}

/// Points along the parallel at `theta`, roughly `delta` apart.
fn parallel(
    bounds: &Bounds,
    delta: f64,
    theta: f64,
    filter: Option<&dyn Fn(f64, f64) -> bool>,
    out: &mut Vec<Euler>,
) {
    let step = if theta == 0.0 || theta == 180.0 {
        2.0 * bounds.phi2
    } else {
        delta / theta.to_radians().sin()
    };
    let mut phi = bounds.phi1;
    while phi < bounds.phi2 {
        if filter.is_none_or(|inside| inside(phi, theta)) {
            out.push(Euler::direction(phi, theta));
        }
        phi += step;
    }
}

/// Saff spiral from `theta1` to the upper theta of the with-mirror unit.
fn spiral<F>(bounds: &Bounds, delta: f64, inside: &F, out: &mut Vec<Euler>)
where
    F: Fn(f64, f64) -> bool,
{
    let z1 = bounds.theta1.to_radians().cos();
    let dz = bounds.spiral_theta2.to_radians().cos() - z1;
    let span = bounds.spiral_phi2 - bounds.phi1;
    let factor = SAFF_FACTOR / delta.to_radians();
    let count = (factor * factor * (dz * span / 720.0).abs()) as usize;

    out.push(Euler::direction(bounds.phi1, bounds.theta1));

    let mut phi = bounds.phi1;
    for k in 1..count.saturating_sub(1) {
        let z = z1 + dz * k as f64 / (count - 1) as f64;
        let r = (1.0 - z * z).sqrt();
        phi = bounds.phi1 + (phi + delta / r - bounds.phi1).rem_euclid(span);
        let theta = z.acos().to_degrees();
        if theta > 180.0 {
            break;
        }
        if inside(phi, theta) {
            out.push(Euler::direction(phi, theta));
        }
    }
}

/// One cached sampling and its lazily built neighbor index.
pub struct Sampling {
    config: Option<SamplingConfig>,
    angles: Arc<[Euler]>,
    delta: f64,
    index: OnceLock<NeighborIndex>,
}

impl Sampling {
    pub(crate) fn generated(config: SamplingConfig, angles: Vec<Euler>) -> Self {
        Self {
            delta: config.delta,
            config: Some(config),
            angles: angles.into(),
            index: OnceLock::new(),
        }
    }

    pub(crate) fn supplied(angles: Vec<Euler>, delta: f64) -> Self {
        Self {
            config: None,
            angles: angles.into(),
            delta,
            index: OnceLock::new(),
        }
    }

    /// Configuration that produced the angles, `None` for caller supplied sets.
    pub fn config(&self) -> Option<&SamplingConfig> {
        self.config.as_ref()
    }

    pub fn angles(&self) -> Arc<[Euler]> {
        Arc::clone(&self.angles)
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// The neighbor index of this sampling, built on first use.
    pub(crate) fn neighbor_index(&self, symmetry: &Symmetry) -> Result<&NeighborIndex> {
        if self.is_empty() {
            return Err(SymmetryError::EmptySampling);
        }
        Ok(self
            .index
            .get_or_init(|| NeighborIndex::build(symmetry, &self.angles, self.delta)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tag: &str, config: &SamplingConfig) -> Vec<Euler> {
        let family = SymmetryFamily::parse(tag).unwrap();
        even_angles(family, &family.brackets(), config).unwrap()
    }

    #[test]
    fn parse_options() {
        assert_eq!("S".parse::<Method>().unwrap(), Method::Spiral);
        assert_eq!("P".parse::<Method>().unwrap(), Method::Parallels);
        assert_eq!("M".parse::<Method>().unwrap(), Method::ParallelsFromEquator);
        assert_eq!(
            "X".parse::<Method>(),
            Err(SymmetryError::UnknownMethod("X".to_string()))
        );
        assert_eq!("Minus".parse::<PhiEqPsi>().unwrap(), PhiEqPsi::Minus);
        assert!("Plus".parse::<PhiEqPsi>().is_err());
        assert_eq!(Method::ParallelsFromEquator.to_string(), "M");
    }

    #[test]
    fn spiral_density_c1() {
        let angles = sample("c1", &SamplingConfig::new(15.0));
        let expected = 4.0 * std::f64::consts::PI / 15f64.to_radians().sin().powi(2);
        let count = angles.len() as f64;
        assert!(
            (count - expected).abs() < 0.2 * expected,
            "{} points, expected about {}",
            count,
            expected
        );
    }

    #[test]
    fn spiral_starts_at_lower_corner() {
        let angles = sample("c4", &SamplingConfig::new(10.0));
        assert_eq!(angles[0], Euler::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn cyclic_pole_is_appended() {
        let angles = sample("c3", &SamplingConfig::new(15.0));
        assert_eq!(angles.last(), Some(&Euler::new(0.0, 180.0, 0.0)));

        // the half sphere without mirror never reaches the south pole
        let angles = sample("c3", &SamplingConfig::new(15.0).with_inc_mirror(false));
        assert!(angles.iter().all(|a| a.theta <= 90.0));
    }

    #[test]
    fn dihedral_pole_only_with_full_range() {
        let angles = sample("d3", &SamplingConfig::new(15.0).with_theta(None, Some(180.0)));
        assert_eq!(angles.last(), Some(&Euler::new(0.0, 180.0, 0.0)));
        let angles = sample("d3", &SamplingConfig::new(15.0));
        assert!(angles.iter().all(|a| a.theta <= 90.0));
    }

    #[test]
    fn parallels_are_not_filtered() {
        let config = SamplingConfig::new(30.0).with_method(Method::Parallels);
        let angles = sample("c2", &config);
        // theta = 0, 30, ..., 180
        assert_eq!(angles[0], Euler::new(0.0, 0.0, 0.0));
        assert_eq!(angles.iter().filter(|a| a.theta == 0.0).count(), 1);
        assert!(angles.iter().any(|a| a.theta == 90.0));
        assert!(angles.iter().all(|a| a.phi < 180.0));
    }

    #[test]
    fn parallels_from_equator_cover_both_hemispheres() {
        let config = SamplingConfig::new(30.0).with_method(Method::ParallelsFromEquator);
        let angles = sample("c1", &config);
        // lower thetas come first after reversing the northern half
        assert_eq!(angles[0].theta, 0.0);
        assert!(angles.iter().any(|a| a.theta == 150.0));
        let thetas: Vec<f64> = angles.iter().map(|a| a.theta).collect();
        let mut sorted = thetas.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(thetas, sorted);
    }

    #[test]
    fn platonic_equator_walk_is_filtered() {
        let config = SamplingConfig::new(5.0).with_method(Method::ParallelsFromEquator);
        let family = SymmetryFamily::Octahedral;
        let brackets = family.brackets();
        let angles = even_angles(family, &brackets, &config).unwrap();
        assert!(!angles.is_empty());
        assert!(angles
            .iter()
            .all(|a| family.contains(&brackets, a.phi, a.theta, true)));
    }

    #[test]
    fn minus_sets_psi() {
        let config = SamplingConfig::new(15.0).with_phi_eq_psi(PhiEqPsi::Minus);
        for angle in sample("c5", &config) {
            assert_eq!(angle.psi, (720.0 - angle.phi) % 360.0);
        }
    }

    #[test]
    fn rejects_invalid_ranges() {
        let family = SymmetryFamily::Cyclic(1);
        let brackets = family.brackets();
        for config in [
            SamplingConfig::new(0.0),
            SamplingConfig::new(-5.0),
            SamplingConfig::new(15.0).with_theta(Some(60.0), Some(30.0)),
            SamplingConfig::new(15.0).with_phi(Some(100.0), Some(50.0)),
            SamplingConfig::new(15.0).with_theta(None, Some(200.0)),
        ] {
            let err = even_angles(family, &brackets, &config).unwrap_err();
            assert!(matches!(err, SymmetryError::InvalidRange { .. }), "{:?}", config);
        }
    }

    #[test]
    fn one_sided_range_uses_default() {
        // theta2 defaults to 180 for c1 with mirror, so only theta1 is needed
        let config = SamplingConfig::new(15.0).with_theta(Some(100.0), None);
        let angles = sample("c1", &config);
        assert_eq!(angles[0], Euler::new(0.0, 100.0, 0.0));
        assert!(angles.iter().all(|a| a.theta >= 100.0));
    }

    #[test]
    fn negative_bounds_mean_default() {
        let a = sample("d4", &SamplingConfig::new(10.0));
        let b = sample("d4", &SamplingConfig::new(10.0).with_theta(Some(-1.0), Some(-1.0)));
        assert_eq!(a, b);
    }

    #[test]
    fn settings_round_trip_through_serde() {
        let config = SamplingConfig::new(7.5).with_method(Method::Parallels);
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("method = \"P\""));
        let back: SamplingConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
