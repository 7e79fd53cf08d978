//! Point-group symmetry families and their fundamental domains.
//!
//! Every supported group is one variant of [`SymmetryFamily`]. A variant
//! knows everything that differs between groups:
//! - the group order and the hard-coded operator tables
//! - the analytic bracket constants of its asymmetric unit
//! - the boundary lines on which orbit members are redundant
//! - the subset of operators whose images can land next to a sampled point
//! - the membership test of its asymmetric unit
//!
//! The family is selected once when a [`crate::symmetry::Symmetry`] is built,
//! so none of the per-orientation code has to dispatch on tag strings.

use std::fmt;

use itertools::iproduct;

use crate::config::{POLE_ROUND_DIGITS, ROUND_DIGITS};
use crate::error::{Result, SymmetryError};
use crate::orientation::{round_to, Euler};

/// Bounds of the asymmetric unit for one mirror mode.
///
/// `phi` is the azimuthal extent of the unit, `theta` the polar angle of the
/// first symmetry-related cap boundary, `psi` the azimuthal period of the caps
/// and `alpha` the largest polar angle reached by the unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub phi: f64,
    pub theta: f64,
    pub psi: f64,
    pub alpha: f64,
}

impl Bracket {
    fn new(phi: f64, theta: f64, psi: f64, alpha: f64) -> Self {
        Self {
            phi,
            theta,
            psi,
            alpha,
        }
    }
}

/// Brackets indexed by `inc_mirror`: `[without mirror, with mirror]`.
pub type Brackets = [Bracket; 2];

/// A line of the sphere on which two orbit members can coincide in direction.
///
/// Members whose direction falls on the line are only kept when their psi is
/// below `psi`. `period` is the phi spacing of the line (none for lines that
/// run along a parallel) and `offset` shifts phi before the period test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundaryLine {
    period: Option<f64>,
    theta: f64,
    psi: f64,
    offset: f64,
}

impl BoundaryLine {
    fn new(period: f64, theta: f64, psi: f64, offset: f64) -> Self {
        Self {
            period: Some(period),
            theta,
            psi,
            offset,
        }
    }

    fn parallel(theta: f64, psi: f64) -> Self {
        Self {
            period: None,
            theta,
            psi,
            offset: 0.0,
        }
    }

    /// Returns `(wanted, redundant)` for an orbit member.
    fn classify(&self, e: &Euler) -> (bool, bool) {
        let on_pole = e.on_pole();
        let (phi_wanted, phi_redundant) = match self.period {
            Some(period) => {
                let shifted = e.phi - self.offset;
                let on_line = round_to(shifted, ROUND_DIGITS)
                    .rem_euclid(round_to(period, ROUND_DIGITS))
                    == 0.0;
                if on_pole {
                    (
                        round_to(shifted, POLE_ROUND_DIGITS) < round_to(period, POLE_ROUND_DIGITS),
                        round_to(shifted, ROUND_DIGITS) >= round_to(period, ROUND_DIGITS),
                    )
                } else {
                    (on_line, on_line)
                }
            }
            None => (true, true),
        };

        let theta_on_line = round_to(e.theta, ROUND_DIGITS) == round_to(self.theta, ROUND_DIGITS);
        let psi_below = round_to(e.psi, ROUND_DIGITS) < round_to(self.psi, ROUND_DIGITS);
        let psi_redundant = if on_pole { psi_below } else { !psi_below };

        (
            phi_wanted && theta_on_line && psi_below,
            phi_redundant && theta_on_line && psi_redundant,
        )
    }
}

/// Decides whether an orbit member survives unique filtering.
pub(crate) fn keep_on_boundary(lines: &[BoundaryLine], e: &Euler) -> bool {
    let (wanted, redundant) = lines.iter().fold((false, false), |(w, r), line| {
        let (lw, lr) = line.classify(e);
        (w || lw, r || lr)
    });
    wanted || !redundant
}

/// The supported point groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetryFamily {
    /// `cn`: n-fold rotation about the polar axis.
    Cyclic(usize),
    /// `dn`: `cn` plus n two-fold axes in the equatorial plane.
    Dihedral(usize),
    Tetrahedral,
    Octahedral,
    Icosahedral,
}

impl SymmetryFamily {
    /// Parses a symmetry tag such as `c3`, `d7`, `tet`, `oct` or `icos`.
    pub fn parse(tag: &str) -> Result<Self> {
        let tag = tag.trim().to_lowercase();
        match tag.as_str() {
            "tet" => return Ok(SymmetryFamily::Tetrahedral),
            "oct" => return Ok(SymmetryFamily::Octahedral),
            "icos" => return Ok(SymmetryFamily::Icosahedral),
            _ => {}
        }

        let (family, order) = match tag.split_at_checked(1) {
            Some((family @ ("c" | "d"), order)) => (family, order),
            _ => return Err(SymmetryError::UnknownSymmetry(tag)),
        };
        if order.is_empty() {
            return Err(SymmetryError::InvalidOrder { tag });
        }
        if !order.chars().all(|c| c.is_ascii_digit()) {
            return Err(SymmetryError::UnknownSymmetry(tag));
        }
        let n = match order.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => return Err(SymmetryError::InvalidOrder { tag }),
        };

        Ok(if family == "c" {
            SymmetryFamily::Cyclic(n)
        } else {
            SymmetryFamily::Dihedral(n)
        })
    }

    /// Number of operators in the group, identity included.
    pub fn nsym(&self) -> usize {
        match *self {
            SymmetryFamily::Cyclic(n) => n,
            SymmetryFamily::Dihedral(n) => 2 * n,
            SymmetryFamily::Tetrahedral => 12,
            SymmetryFamily::Octahedral => 24,
            SymmetryFamily::Icosahedral => 60,
        }
    }

    /// True for the tetrahedral, octahedral and icosahedral groups.
    pub fn is_platonic(&self) -> bool {
        !matches!(self, SymmetryFamily::Cyclic(_) | SymmetryFamily::Dihedral(_))
    }

    pub fn brackets(&self) -> Brackets {
        match *self {
            SymmetryFamily::Cyclic(n) => {
                let step = 360.0 / n as f64;
                [
                    Bracket::new(step, 90.0, step, 90.0),
                    Bracket::new(step, 180.0, step, 180.0),
                ]
            }
            SymmetryFamily::Dihedral(_) => {
                let step = 360.0 / self.nsym() as f64;
                [
                    Bracket::new(step, 90.0, step, 90.0),
                    Bracket::new(step * 2.0, 90.0, step * 2.0, 90.0),
                ]
            }
            SymmetryFamily::Tetrahedral => platonic_brackets(3, 120.0, 120.0),
            SymmetryFamily::Octahedral => platonic_brackets(4, 45.0, 90.0),
            SymmetryFamily::Icosahedral => platonic_brackets(5, 36.0, 72.0),
        }
    }

    /// Euler triplets of every operator of the group, identity first.
    pub fn operator_angles(&self) -> Vec<Euler> {
        match *self {
            SymmetryFamily::Cyclic(n) => {
                let step = 360.0 / n as f64;
                (0..n)
                    .map(|i| Euler::new(0.0, 0.0, i as f64 * step))
                    .collect()
            }
            SymmetryFamily::Dihedral(n) => {
                let step = 360.0 / self.nsym() as f64;
                let flip_phase = 180.0 * (n % 2) as f64;
                let rotations = (0..n).map(|i| Euler::new(0.0, 0.0, 2.0 * i as f64 * step));
                let flips = (0..n)
                    .rev()
                    .map(|i| Euler::new(0.0, 180.0, (i as f64 * step * 2.0 + flip_phase) % 360.0));
                rotations.chain(flips).collect()
            }
            SymmetryFamily::Tetrahedral => {
                // three faces sit at this polar angle around the top one
                let level = (-1.0_f64 / 3.0).acos().to_degrees();
                let top = [0.0, 120.0, 240.0].map(|psi| Euler::new(0.0, 0.0, psi));
                let faces = iproduct!([0.0, 120.0, 240.0], [60.0, 180.0, 300.0])
                    .map(|(phi, psi)| Euler::new(phi, level, psi));
                top.into_iter().chain(faces).collect()
            }
            SymmetryFamily::Octahedral => {
                let quarters = [0.0, 90.0, 180.0, 270.0];
                let top = quarters.map(|psi| Euler::new(0.0, 0.0, psi));
                let equator = iproduct!(quarters, quarters)
                    .map(|(psi, phi)| Euler::new(phi, 90.0, psi));
                let bottom = quarters.map(|psi| Euler::new(0.0, 180.0, psi));
                top.into_iter().chain(equator).chain(bottom).collect()
            }
            SymmetryFamily::Icosahedral => {
                // five pentagons are centred at each of these polar angles
                let upper = 2.0_f64.atan().to_degrees();
                let lower = 180.0 - upper;
                let even = [0.0, 72.0, 144.0, 216.0, 288.0];
                let odd = [36.0, 108.0, 180.0, 252.0, 324.0];
                let top = even.map(|psi| Euler::new(0.0, 0.0, psi));
                let upper_ring = iproduct!(even, odd).map(|(phi, psi)| Euler::new(phi, upper, psi));
                let lower_ring = iproduct!(odd, even).map(|(phi, psi)| Euler::new(phi, lower, psi));
                let bottom = even.map(|psi| Euler::new(0.0, 180.0, psi));
                top.into_iter()
                    .chain(upper_ring)
                    .chain(lower_ring)
                    .chain(bottom)
                    .collect()
            }
        }
    }

    /// Operators whose images of a sampled direction can fall within one
    /// sampling step of another sampled direction.
    pub fn neighbor_operators(&self) -> Vec<usize> {
        let nsym = self.nsym();
        match *self {
            SymmetryFamily::Cyclic(1) => vec![0],
            SymmetryFamily::Cyclic(2) => vec![0, 1],
            SymmetryFamily::Cyclic(_) => vec![0, 1, nsym - 1],
            SymmetryFamily::Dihedral(1) => vec![0, 1],
            SymmetryFamily::Dihedral(2) => vec![0, 1, 2],
            SymmetryFamily::Dihedral(n) if n % 2 == 1 => {
                vec![0, 1, nsym / 2 - 1, nsym / 2, nsym - 2, nsym - 1]
            }
            SymmetryFamily::Dihedral(_) => {
                let half = nsym / 2;
                let offset = (half - 4) / 2;
                vec![0, 1, half - 1, half + offset + 1, half + offset + 2, half + offset + 3]
            }
            SymmetryFamily::Tetrahedral => vec![0, 1, 2, 3, 4, 6, 7],
            SymmetryFamily::Octahedral => vec![0, 1, 2, 3, 8, 9, 12, 13],
            SymmetryFamily::Icosahedral => vec![0, 1, 2, 3, 4, 6, 7, 11, 12],
        }
    }

    /// Boundary lines used to drop redundant orbit members.
    pub(crate) fn boundary_lines(&self, brackets: &Brackets) -> Vec<BoundaryLine> {
        let b = brackets[0];
        match *self {
            SymmetryFamily::Cyclic(_) => vec![
                BoundaryLine::new(b.phi, 0.0, 360.0, 0.0),
                BoundaryLine::new(b.phi, 180.0, 360.0, 0.0),
            ],
            SymmetryFamily::Dihedral(_) => vec![
                BoundaryLine::new(b.phi, 0.0, 360.0, 0.0),
                BoundaryLine::new(b.phi, 180.0, 360.0, 0.0),
                BoundaryLine::new(b.phi, 0.0, 360.0, b.phi),
                BoundaryLine::new(b.phi, 180.0, 360.0, b.phi),
                BoundaryLine::parallel(90.0, 180.0),
            ],
            SymmetryFamily::Tetrahedral => vec![
                BoundaryLine::new(b.phi, b.theta, 180.0, 0.0),
                BoundaryLine::new(b.phi, 180.0 - b.theta, 180.0, 60.0),
                BoundaryLine::new(b.phi, 0.0, b.phi, 0.0),
                BoundaryLine::new(b.phi, 180.0 - b.alpha, b.phi, 0.0),
                BoundaryLine::new(b.phi, 180.0, b.phi, 0.0),
                BoundaryLine::new(b.phi, b.alpha, b.phi, 60.0),
            ],
            SymmetryFamily::Octahedral => vec![
                BoundaryLine::new(b.psi, 180.0, b.psi, 0.0),
                BoundaryLine::new(b.psi, 0.0, b.psi, 0.0),
                BoundaryLine::new(b.psi, 2.0 * b.theta, b.psi, 0.0),
                BoundaryLine::new(b.psi, 2.0 * b.theta, 180.0, 45.0),
                BoundaryLine::new(b.psi, 3.0 * b.theta, 180.0, 0.0),
                BoundaryLine::new(b.psi, b.theta, 180.0, 0.0),
                BoundaryLine::new(b.psi, b.alpha, 120.0, 45.0),
                BoundaryLine::new(b.psi, 180.0 - b.alpha, 120.0, 45.0),
            ],
            SymmetryFamily::Icosahedral => vec![
                BoundaryLine::new(b.psi, 180.0, b.psi, 0.0),
                BoundaryLine::new(b.psi, 0.0, b.psi, 0.0),
                BoundaryLine::new(b.psi, 2.0 * b.theta, b.psi, 0.0),
                BoundaryLine::new(b.psi, 180.0 - 2.0 * b.theta, b.psi, b.phi),
                BoundaryLine::new(b.psi, b.alpha, 60.0, b.phi),
                BoundaryLine::new(b.psi, b.alpha + 2.0 * b.theta, 120.0, 0.0),
                BoundaryLine::new(b.psi, 180.0 - b.alpha - 2.0 * b.theta, 120.0, b.phi),
                BoundaryLine::new(b.psi, 180.0 - b.alpha, 120.0, 0.0),
                BoundaryLine::new(b.psi, b.theta, 180.0, 0.0),
                BoundaryLine::new(b.psi, 90.0 - b.theta, 180.0, b.phi),
                BoundaryLine::new(b.phi, 90.0, 180.0, b.phi / 2.0),
                BoundaryLine::new(b.psi, 180.0 - b.theta, 180.0, b.phi),
                BoundaryLine::new(b.psi, 90.0 + b.theta, 180.0, 0.0),
            ],
        }
    }

    /// Tests whether the direction `(phi, theta)` lies in the asymmetric unit.
    ///
    /// Points exactly on the unit's border follow each family's own policy:
    /// the comparisons are deliberately not unified across families.
    pub fn contains(&self, brackets: &Brackets, phi: f64, theta: f64, inc_mirror: bool) -> bool {
        let theta = round_to(theta, ROUND_DIGITS);
        match *self {
            SymmetryFamily::Cyclic(n) => cyclic_contains(brackets, n, phi, theta, inc_mirror),
            SymmetryFamily::Dihedral(n) if n % 2 == 0 => {
                let b = brackets[inc_mirror as usize];
                // without mirror the two edges of the wedge belong to different orbits
                let below_edge = if inc_mirror { phi < b.phi } else { phi <= b.phi };
                (phi >= 0.0 && below_edge && theta <= b.theta) || theta == 0.0
            }
            SymmetryFamily::Dihedral(n) => {
                dihedral_odd_contains(brackets, n, phi, theta, inc_mirror)
            }
            SymmetryFamily::Tetrahedral => tetrahedral_contains(brackets, phi, theta, inc_mirror),
            SymmetryFamily::Octahedral | SymmetryFamily::Icosahedral => {
                platonic_contains(brackets, phi, theta, inc_mirror)
            }
        }
    }
}

impl fmt::Display for SymmetryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymmetryFamily::Cyclic(n) => write!(f, "c{}", n),
            SymmetryFamily::Dihedral(n) => write!(f, "d{}", n),
            SymmetryFamily::Tetrahedral => write!(f, "tet"),
            SymmetryFamily::Octahedral => write!(f, "oct"),
            SymmetryFamily::Icosahedral => write!(f, "icos"),
        }
    }
}

/// Brackets of a platonic group with `ncap` caps around the polar axis.
fn platonic_brackets(ncap: usize, phi_without_mirror: f64, phi_with_mirror: f64) -> Brackets {
    let cap_sig = 360.0 / ncap as f64;
    let alpha = (1.0 / (3.0_f64.sqrt() * (std::f64::consts::PI / ncap as f64).tan()))
        .acos()
        .to_degrees();
    let cos_cap = cap_sig.to_radians().cos();
    let theta = (0.5 * (cos_cap / (1.0 - cos_cap)).acos()).to_degrees();
    [
        Bracket::new(phi_without_mirror, theta, cap_sig, alpha),
        Bracket::new(phi_with_mirror, theta, cap_sig, alpha),
    ]
}

fn cyclic_contains(brackets: &Brackets, n: usize, phi: f64, theta: f64, inc_mirror: bool) -> bool {
    let b = brackets[inc_mirror as usize];
    let mut inside = (phi >= 0.0 && phi < b.phi && theta <= b.theta)
        || (inc_mirror && theta == 180.0)
        || theta == 0.0;
    // c1 without mirror: only half of the equator is unique
    if n == 1 && !inc_mirror && theta == 90.0 && phi >= 180.0 {
        inside = false;
    }
    inside
}

/// Odd dihedral groups use a phase-shifted unit centred on a two-fold axis.
fn dihedral_odd_contains(
    brackets: &Brackets,
    n: usize,
    phi: f64,
    theta: f64,
    inc_mirror: bool,
) -> bool {
    let b = brackets[inc_mirror as usize];
    let period = 360.0 / (2 * n) as f64;
    let in_wedge = theta <= b.theta && phi >= 0.0 && phi < brackets[1].phi;
    let in_shifted_half = phi >= period / 2.0 && phi <= period + period / 2.0;
    theta == 0.0 || (in_wedge && (inc_mirror || in_shifted_half))
}

/// Denominator of Baldwin's altitude bound for the azimuth `tmphi`.
fn baldwin_denominator(b: &Bracket, tmphi: f64, alpha: f64) -> f64 {
    let half_cap = b.psi / 2.0;
    ((half_cap - tmphi).to_radians().sin() / b.theta.to_radians().tan()
        + tmphi.to_radians().sin() / alpha.to_radians().tan())
        / half_cap.to_radians().sin()
}

fn platonic_contains(brackets: &Brackets, phi: f64, theta: f64, inc_mirror: bool) -> bool {
    let b = brackets[inc_mirror as usize];
    let tmphi = phi.min(b.psi - phi);
    let lower_bound = round_to(
        (1.0 / baldwin_denominator(&b, tmphi, b.alpha)).atan().to_degrees(),
        ROUND_DIGITS,
    );

    let mut inside = false;
    if phi >= 0.0 && phi < b.phi && theta <= b.alpha {
        inside = lower_bound >= theta;
    }
    if theta == 0.0 {
        inside = true;
    }
    // corner on the right edge of the unit
    if theta <= round_to(b.alpha, ROUND_DIGITS) && phi == round_to(b.phi, ROUND_DIGITS) {
        inside = true;
    }
    if theta == lower_bound && phi > brackets[0].phi {
        inside = false;
    }
    if phi == round_to(b.psi, ROUND_DIGITS) {
        inside = false;
    }
    if theta == 0.0 && phi == round_to(b.alpha, POLE_ROUND_DIGITS) {
        inside = false;
    }
    inside
}

fn tetrahedral_contains(brackets: &Brackets, phi: f64, theta: f64, inc_mirror: bool) -> bool {
    let b = brackets[inc_mirror as usize];
    let tmphi = phi.min(b.psi - phi);
    let denominator = baldwin_denominator(&b, tmphi, b.alpha);
    let lower_bound = if denominator == 0.0 {
        b.alpha
    } else {
        (1.0 / denominator).atan().to_degrees()
    };
    let upper_bound = (1.0 / baldwin_denominator(&b, tmphi, b.alpha / 2.0))
        .atan()
        .to_degrees();

    let mut inside = false;
    if phi >= 0.0 && phi < b.phi && theta <= b.alpha {
        inside = if lower_bound > theta {
            // without mirror the unit is cut again at the upper bound
            inc_mirror || round_to(upper_bound, ROUND_DIGITS) > theta
        } else {
            theta == 0.0
        };
    }
    if theta == 0.0 {
        inside = true;
    }
    if theta == round_to(lower_bound, ROUND_DIGITS) && phi > brackets[0].phi / 2.0 {
        inside = false;
    }
    if theta == round_to(upper_bound, ROUND_DIGITS) && theta < b.alpha {
        inside = true;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parse_tags() {
        assert_eq!(SymmetryFamily::parse("c3").unwrap(), SymmetryFamily::Cyclic(3));
        assert_eq!(SymmetryFamily::parse("D7").unwrap(), SymmetryFamily::Dihedral(7));
        assert_eq!(SymmetryFamily::parse("c12").unwrap(), SymmetryFamily::Cyclic(12));
        assert_eq!(SymmetryFamily::parse("tet").unwrap(), SymmetryFamily::Tetrahedral);
        assert_eq!(SymmetryFamily::parse("oct").unwrap(), SymmetryFamily::Octahedral);
        assert_eq!(SymmetryFamily::parse("icos").unwrap(), SymmetryFamily::Icosahedral);

        assert_eq!(
            SymmetryFamily::parse("x5"),
            Err(SymmetryError::UnknownSymmetry("x5".to_string()))
        );
        assert_eq!(
            SymmetryFamily::parse("cube"),
            Err(SymmetryError::UnknownSymmetry("cube".to_string()))
        );
        assert_eq!(
            SymmetryFamily::parse("c0"),
            Err(SymmetryError::InvalidOrder {
                tag: "c0".to_string()
            })
        );
        assert!(SymmetryFamily::parse("d").is_err());
        assert!(SymmetryFamily::parse("").is_err());
    }

    #[test]
    fn display_round_trips() {
        for tag in ["c1", "c5", "d2", "d9", "tet", "oct", "icos"] {
            assert_eq!(SymmetryFamily::parse(tag).unwrap().to_string(), tag);
        }
    }

    #[test]
    fn operator_counts() {
        for tag in ["c1", "c2", "c7", "d1", "d2", "d5", "d6", "tet", "oct", "icos"] {
            let family = SymmetryFamily::parse(tag).unwrap();
            let ops = family.operator_angles();
            assert_eq!(ops.len(), family.nsym(), "{}", tag);
            assert_eq!(ops[0], Euler::new(0.0, 0.0, 0.0), "{}", tag);
            for &k in &family.neighbor_operators() {
                assert!(k < family.nsym(), "{}: {}", tag, k);
            }
        }
    }

    #[test]
    fn dihedral_flips() {
        let ops = SymmetryFamily::Dihedral(3).operator_angles();
        assert_eq!(ops[1], Euler::new(0.0, 0.0, 120.0));
        assert_eq!(ops[3], Euler::new(0.0, 180.0, (240.0 + 180.0) % 360.0));
        assert_eq!(ops[5], Euler::new(0.0, 180.0, 180.0));
    }

    #[test]
    fn neighbor_lists() {
        assert_eq!(SymmetryFamily::Cyclic(5).neighbor_operators(), vec![0, 1, 4]);
        assert_eq!(SymmetryFamily::Dihedral(5).neighbor_operators(), vec![0, 1, 4, 5, 8, 9]);
        assert_eq!(SymmetryFamily::Dihedral(6).neighbor_operators(), vec![0, 1, 5, 8, 9, 10]);
    }

    #[test]
    fn cyclic_and_dihedral_brackets() {
        let c3 = SymmetryFamily::Cyclic(3).brackets();
        assert_eq!(c3[0], Bracket::new(120.0, 90.0, 120.0, 90.0));
        assert_eq!(c3[1], Bracket::new(120.0, 180.0, 120.0, 180.0));

        let d4 = SymmetryFamily::Dihedral(4).brackets();
        assert_eq!(d4[0], Bracket::new(45.0, 90.0, 45.0, 90.0));
        assert_eq!(d4[1], Bracket::new(90.0, 90.0, 90.0, 90.0));
    }

    #[test]
    fn platonic_brackets_values() {
        let tet = SymmetryFamily::Tetrahedral.brackets();
        assert_abs_diff_eq!(tet[0].theta, 54.735610317245346, epsilon = 1e-9);
        assert_abs_diff_eq!(tet[0].alpha, 70.52877936550931, epsilon = 1e-9);
        assert_eq!(tet[0].phi, 120.0);
        assert_eq!(tet[1].phi, 120.0);

        let oct = SymmetryFamily::Octahedral.brackets();
        assert_abs_diff_eq!(oct[0].theta, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(oct[0].alpha, 54.735610317245346, epsilon = 1e-9);
        assert_eq!((oct[0].phi, oct[1].phi, oct[0].psi), (45.0, 90.0, 90.0));

        let icos = SymmetryFamily::Icosahedral.brackets();
        assert_abs_diff_eq!(icos[0].theta, 31.717474411461005, epsilon = 1e-9);
        assert_abs_diff_eq!(icos[0].alpha, 37.37736814064969, epsilon = 1e-9);
        assert_eq!((icos[0].phi, icos[1].phi, icos[0].psi), (36.0, 72.0, 72.0));
    }

    fn inside(tag: &str, phi: f64, theta: f64, inc_mirror: bool) -> bool {
        let family = SymmetryFamily::parse(tag).unwrap();
        family.contains(&family.brackets(), phi, theta, inc_mirror)
    }

    #[test]
    fn cyclic_boundaries() {
        assert!(inside("c3", 59.9, 45.0, false));
        assert!(!inside("c3", 120.1, 45.0, false));
        // right edge is open, poles always belong
        assert!(!inside("c3", 120.0, 45.0, false));
        assert!(inside("c3", 300.0, 0.0, false));
        assert!(inside("c3", 10.0, 90.0, false));
        assert!(!inside("c3", 10.0, 90.5, false));
        assert!(inside("c3", 10.0, 135.0, true));
        assert!(inside("c3", 250.0, 180.0, true));
        assert!(!inside("c3", 250.0, 180.0, false));
        // c1 without mirror keeps only half of the equator
        assert!(inside("c1", 179.9, 90.0, false));
        assert!(!inside("c1", 180.0, 90.0, false));
        assert!(inside("c1", 180.0, 90.0, true));
    }

    #[test]
    fn dihedral_boundaries() {
        // even order: plain wedge, closed on the right without mirror
        assert!(inside("d4", 44.9, 90.0, false));
        assert!(inside("d4", 45.0, 90.0, false));
        assert!(inside("d2", 90.0, 3.0, false));
        assert!(!inside("d4", 45.1, 30.0, false));
        assert!(inside("d4", 89.9, 30.0, true));
        assert!(!inside("d4", 90.0, 30.0, true));
        assert!(!inside("d4", 10.0, 91.0, true));
        // odd order: wedge shifted by half a period
        assert!(!inside("d3", 29.9, 45.0, false));
        assert!(inside("d3", 30.0, 45.0, false));
        assert!(inside("d3", 90.0, 45.0, false));
        assert!(!inside("d3", 90.1, 45.0, false));
        assert!(inside("d3", 10.0, 45.0, true));
        assert!(!inside("d3", 120.0, 45.0, true));
        assert!(inside("d3", 200.0, 0.0, false));
    }

    #[test]
    fn tetrahedral_boundaries() {
        let b = SymmetryFamily::Tetrahedral.brackets()[0];
        for inc in [false, true] {
            assert!(inside("tet", 5.0, 30.0, inc));
            assert!(inside("tet", 40.0, 20.0, inc));
            assert!(inside("tet", 119.99, 10.0, inc));
            assert!(!inside("tet", 120.0, 10.0, inc));
            assert!(!inside("tet", 0.0, b.theta + 0.01, inc));
            assert!(!inside("tet", 60.0, b.alpha + 0.01, inc));
        }
        // the mirror half below the upper bound
        assert!(!inside("tet", 60.0, b.alpha - 0.01, false));
        assert!(inside("tet", 60.0, b.alpha - 0.01, true));
    }

    #[test]
    fn octahedral_boundaries() {
        let b = SymmetryFamily::Octahedral.brackets()[0];
        assert!(inside("oct", 44.99, 10.0, false));
        assert!(!inside("oct", 45.01, 10.0, false));
        assert!(inside("oct", 89.99, 10.0, true));
        assert!(!inside("oct", 90.0, 10.0, true));
        assert!(!inside("oct", 0.0, 45.01, false));
        // the corner at the edge of the unit is inside without mirror only
        assert!(inside("oct", 45.0, b.alpha, false));
        assert!(!inside("oct", 45.0, b.alpha + 0.01, false));
        assert!(inside("oct", 5.0, 0.0, true));
    }

    #[test]
    fn icosahedral_boundaries() {
        let b = SymmetryFamily::Icosahedral.brackets()[0];
        assert!(inside("icos", 5.0, 30.0, false));
        assert!(!inside("icos", 20.0, 40.0, false));
        assert!(!inside("icos", 40.0, 20.0, false));
        assert!(inside("icos", 40.0, 20.0, true));
        assert!(inside("icos", 35.99, 10.0, false));
        assert!(!inside("icos", 36.01, 10.0, false));
        assert!(!inside("icos", 72.0, 10.0, true));
        assert!(inside("icos", 36.0, b.alpha, false));
        assert!(!inside("icos", 36.0, b.alpha + 0.01, false));
    }
}
