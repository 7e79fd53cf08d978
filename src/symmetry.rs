//! Point-group symmetry of a particle and its asymmetric unit.
//!
//! A [`Symmetry`] is built once from a tag (`c5`, `d7`, `icos`, ...) and is
//! immutable afterwards, apart from the angular sampling it caches. It answers
//! three kinds of question:
//! - which orientations are equivalent to a given one ([`Symmetry::symmetry_related`])
//! - whether a direction lies in the asymmetric unit ([`Symmetry::is_in_subunit`])
//! - which orientation of an orbit represents it ([`Symmetry::reduce_anglesets`])
//!
//! The sampling and neighbor queries live in [`crate::sampling`] and
//! [`crate::neighbors`]; their cached state is owned by the `Symmetry`.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use itertools::iproduct;
use log::{debug, warn};
use rayon::prelude::*;

use crate::config::{BORDER_TOLERANCES, DEFAULT_DELTA};
use crate::error::{Result, SymmetryError};
use crate::family::{keep_on_boundary, BoundaryLine, Brackets, SymmetryFamily};
use crate::neighbors::NeighborIndex;
use crate::orientation::Euler;
use crate::rotation::{rotmatrix, Rotation};
use crate::sampling::{self, Sampling, SamplingConfig};

/// Which parities of an orbit to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirror {
    /// Proper rotations only.
    #[default]
    Without,
    /// Mirrored copies only.
    Only,
    /// All proper copies followed by all mirrored copies.
    Both,
}

impl Mirror {
    /// Orbit mode used to reduce orientations for the given mirror policy.
    pub fn for_reduction(inc_mirror: bool) -> Self {
        if inc_mirror {
            Mirror::Without
        } else {
            Mirror::Both
        }
    }
}

impl TryFrom<u8> for Mirror {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Mirror::Without),
            1 => Ok(Mirror::Only),
            2 => Ok(Mirror::Both),
            other => Err(format!("invalid mirror mode {}, expected 0, 1 or 2", other)),
        }
    }
}

pub struct Symmetry {
    tag: String,
    family: SymmetryFamily,
    brackets: Brackets,
    symangles: Vec<Euler>,
    symatrix: Vec<Rotation>,
    operators: Vec<usize>,
    neighbors: Vec<usize>,
    boundary: Vec<BoundaryLine>,
    sampling: RwLock<Option<Arc<Sampling>>>,
}

impl Symmetry {
    /// Builds the symmetry group for a tag, e.g. `c1`, `d3`, `tet`, `oct`, `icos`.
    pub fn new(tag: &str) -> Result<Self> {
        let family = SymmetryFamily::parse(tag)?;
        let brackets = family.brackets();
        let symangles = family.operator_angles();
        let symatrix = rotmatrix(&symangles);
        let boundary = family.boundary_lines(&brackets);

        Ok(Self {
            tag: family.to_string(),
            family,
            brackets,
            operators: (0..symangles.len()).collect(),
            symangles,
            symatrix,
            neighbors: family.neighbor_operators(),
            boundary,
            sampling: RwLock::new(None),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn family(&self) -> SymmetryFamily {
        self.family
    }

    pub fn nsym(&self) -> usize {
        self.symangles.len()
    }

    pub fn brackets(&self) -> &Brackets {
        &self.brackets
    }

    /// Euler triplets of the symmetry operators, identity first.
    pub fn symangles(&self) -> &[Euler] {
        &self.symangles
    }

    pub fn symatrix(&self) -> &[Rotation] {
        &self.symatrix
    }

    /// Indices of the operators used to build the neighbor index.
    pub fn neighbor_operators(&self) -> &[usize] {
        &self.neighbors
    }

    /// Orbits of every input orientation, concatenated in input order.
    ///
    /// With `unique` set, orbit members lying on a boundary of the asymmetric
    /// unit with a redundant psi are dropped.
    pub fn symmetry_related(&self, angles: &[Euler], mirror: Mirror, unique: bool) -> Vec<Euler> {
        angles
            .par_iter()
            .flat_map_iter(|angle| self.orbit(angle, mirror, &self.operators, unique))
            .collect()
    }

    /// Like [`Symmetry::symmetry_related`] without mirror, restricted to the
    /// operators in [`Symmetry::neighbor_operators`].
    ///
    /// Without `unique` every input yields exactly `neighbor_operators().len()`
    /// consecutive outputs.
    pub fn symmetry_neighbors(&self, angles: &[Euler], unique: bool) -> Vec<Euler> {
        angles
            .par_iter()
            .flat_map_iter(|angle| self.orbit(angle, Mirror::Without, &self.neighbors, unique))
            .collect()
    }

    fn orbit(
        &self,
        angle: &Euler,
        mirror: Mirror,
        operators: &[usize],
        unique: bool,
    ) -> Vec<Euler> {
        let parities: &[f64] = match mirror {
            Mirror::Without => &[1.0],
            Mirror::Only => &[-1.0],
            Mirror::Both => &[1.0, -1.0],
        };
        let rotation = angle.to_matrix();
        let mut seen: Vec<(f64, f64)> = Vec::new();
        let mut orbit = Vec::with_capacity(operators.len() * parities.len());

        for &parity in parities {
            let mirrored_block = mirror == Mirror::Both && parity < 0.0;
            if mirrored_block && self.mirror_is_redundant(angle) {
                continue;
            }
            for &k in operators {
                let mut related = Euler::from_matrix(&(rotation * (self.symatrix[k] * parity)));
                if mirrored_block
                    && !matches!(self.family, SymmetryFamily::Cyclic(_))
                    && !related.on_pole()
                {
                    related.psi = (related.psi + 180.0) % 360.0;
                }
                let keep = !unique || keep_on_boundary(&self.boundary, &related);

                if mirror == Mirror::Both {
                    let key = (related.phi, related.theta);
                    if seen.contains(&key) {
                        continue;
                    }
                    seen.push(key);
                }
                if keep {
                    orbit.push(related);
                }
            }
        }
        orbit
    }

    /// Mirror copies add nothing for inputs on an axis the group already flips.
    fn mirror_is_redundant(&self, angle: &Euler) -> bool {
        match self.family {
            SymmetryFamily::Dihedral(_) => angle.on_pole(),
            SymmetryFamily::Icosahedral => angle.theta == 0.0,
            _ => false,
        }
    }

    /// Tests whether the direction `(phi, theta)` lies in the asymmetric unit.
    ///
    /// `inc_mirror` selects the unit that treats mirrored directions as
    /// distinct (the larger one).
    pub fn is_in_subunit(&self, phi: f64, theta: f64, inc_mirror: bool) -> bool {
        self.family.contains(&self.brackets, phi, theta, inc_mirror)
    }

    /// [`Symmetry::is_in_subunit`] over a batch of orientations.
    pub fn subunit_mask(&self, angles: &[Euler], inc_mirror: bool) -> Vec<bool> {
        angles
            .par_iter()
            .map(|a| self.is_in_subunit(a.phi, a.theta, inc_mirror))
            .collect()
    }

    /// Maps an orientation to its representative in the asymmetric unit.
    ///
    /// Orbits touching the border of the unit can lose every member to the
    /// unique filter, or have their only candidate miss the border by rounding
    /// noise. Those fall back to the unfiltered orbit, then to the member that
    /// enters the unit under the smallest shift of [`BORDER_TOLERANCES`], which
    /// is returned shifted.
    pub fn reduce(&self, angle: &Euler, inc_mirror: bool) -> Euler {
        let mirror = Mirror::for_reduction(inc_mirror);
        let inside = |e: &&Euler| self.is_in_subunit(e.phi, e.theta, inc_mirror);

        if let Some(reduced) = self
            .orbit(angle, mirror, &self.operators, true)
            .iter()
            .find(inside)
        {
            return *reduced;
        }

        let orbit = self.orbit(angle, mirror, &self.operators, false);
        if let Some(reduced) = orbit.iter().find(inside) {
            return *reduced;
        }
        if let Some(reduced) = self.shift_into_subunit(&orbit, inc_mirror) {
            debug!(
                "{}: {:?} reduced to {:?} on the border of the asymmetric unit",
                self.tag, angle, reduced
            );
            return reduced;
        }

        warn!(
            "{}: no orbit member of {:?} near the asymmetric unit, keeping the first one",
            self.tag, angle
        );
        orbit.first().copied().unwrap_or(*angle)
    }

    /// First orbit member that lies in the unit once shifted by the smallest
    /// possible tolerance, returned at its shifted position.
    fn shift_into_subunit(&self, orbit: &[Euler], inc_mirror: bool) -> Option<Euler> {
        const DIRECTIONS: [(f64, f64); 8] = [
            (1.0, 0.0),
            (-1.0, 0.0),
            (0.0, 1.0),
            (0.0, -1.0),
            (1.0, 1.0),
            (1.0, -1.0),
            (-1.0, 1.0),
            (-1.0, -1.0),
        ];

        BORDER_TOLERANCES.iter().find_map(|tol| {
            iproduct!(orbit, DIRECTIONS).find_map(|(e, (dphi, dtheta))| {
                let phi = e.phi + dphi * tol;
                let theta = e.theta + dtheta * tol;
                let valid = (0.0..360.0).contains(&phi) && (0.0..=180.0).contains(&theta);
                (valid && self.is_in_subunit(phi, theta, inc_mirror))
                    .then(|| Euler::new(phi, theta, e.psi))
            })
        })
    }

    /// Reduces every orientation, one representative per input.
    pub fn reduce_anglesets(&self, angles: &[Euler], inc_mirror: bool) -> Vec<Euler> {
        angles
            .par_iter()
            .map(|a| self.reduce(a, inc_mirror))
            .collect()
    }

    /// Quasi-uniform sampling of the asymmetric unit.
    ///
    /// The last configuration and its result are cached; asking again with an
    /// equal configuration returns the same shared slice.
    pub fn even_angles(&self, config: &SamplingConfig) -> Result<Arc<[Euler]>> {
        if let Some(current) = self.current() {
            if current.config() == Some(config) {
                debug!("{}: serving cached sampling ({} angles)", self.tag, current.len());
                return Ok(current.angles());
            }
        }

        let angles = sampling::even_angles(self.family, &self.brackets, config)?;
        debug!(
            "{}: computed sampling with delta {} ({} angles)",
            self.tag,
            config.delta,
            angles.len()
        );
        let sampling = Arc::new(Sampling::generated(config.clone(), angles));
        let angles = sampling.angles();
        self.replace(sampling);
        Ok(angles)
    }

    /// Installs a caller supplied sampling. Without `delta` the step of the
    /// previous sampling is kept.
    pub fn set_angles(&self, angles: Vec<Euler>, delta: Option<f64>) {
        let delta = delta
            .or_else(|| self.current().map(|s| s.delta()))
            .unwrap_or(DEFAULT_DELTA);
        self.replace(Arc::new(Sampling::supplied(angles, delta)));
    }

    /// The current sampling.
    pub fn angles(&self) -> Result<Arc<[Euler]>> {
        self.current()
            .map(|s| s.angles())
            .ok_or(SymmetryError::MissingSampling)
    }

    /// Indices into the current sampling of every sample within
    /// `angular_distance` degrees of each query, symmetry mates included.
    ///
    /// Queries may lie anywhere on the sphere; they are reduced into the
    /// asymmetric unit before the lookup.
    pub fn find_nearest_neighbors(
        &self,
        angles: &[Euler],
        angular_distance: f64,
    ) -> Result<Vec<Vec<usize>>> {
        let sampling = self.current_sampling()?;
        let index = sampling.neighbor_index(self)?;
        let queries = self.reduce_anglesets(angles, true);
        Ok(index.within(self, &queries, angular_distance, |hit| hit.index))
    }

    /// Reduced orientations of the hits of [`Symmetry::find_nearest_neighbors`].
    pub fn find_nearest_neighbor_angles(
        &self,
        angles: &[Euler],
        angular_distance: f64,
    ) -> Result<Vec<Vec<Euler>>> {
        let sampling = self.current_sampling()?;
        let index = sampling.neighbor_index(self)?;
        let queries = self.reduce_anglesets(angles, true);
        Ok(index.within(self, &queries, angular_distance, |hit| hit.angle))
    }

    /// Indices of the `k` samples closest to each query, symmetry mates included.
    ///
    /// Fewer than `k` indices are returned when the sampling is smaller or
    /// when candidates fall outside the precision guard of the sampling step.
    pub fn find_k_nearest_neighbors(&self, angles: &[Euler], k: usize) -> Result<Vec<Vec<usize>>> {
        let sampling = self.current_sampling()?;
        let index = sampling.neighbor_index(self)?;
        let queries = self.reduce_anglesets(angles, true);
        Ok(index.nearest_k(self, &queries, k, |hit| hit.index))
    }

    pub fn find_k_nearest_neighbor_angles(
        &self,
        angles: &[Euler],
        k: usize,
    ) -> Result<Vec<Vec<Euler>>> {
        let sampling = self.current_sampling()?;
        let index = sampling.neighbor_index(self)?;
        let queries = self.reduce_anglesets(angles, true);
        Ok(index.nearest_k(self, &queries, k, |hit| hit.angle))
    }

    /// Index of the closest sampled direction, ignoring symmetry.
    pub fn nearest_sample(&self, angles: &[Euler]) -> Result<Vec<usize>> {
        let sampling = self.current_sampling()?;
        let index: &NeighborIndex = sampling.neighbor_index(self)?;
        Ok(index.nearest_sample(angles))
    }

    fn current_sampling(&self) -> Result<Arc<Sampling>> {
        self.current().ok_or(SymmetryError::MissingSampling)
    }

    fn current(&self) -> Option<Arc<Sampling>> {
        self.sampling
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, sampling: Arc<Sampling>) {
        *self
            .sampling
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(sampling);
    }
}

impl fmt::Debug for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symmetry")
            .field("tag", &self.tag)
            .field("nsym", &self.nsym())
            .field("brackets", &self.brackets)
            .finish_non_exhaustive()
    }
}
