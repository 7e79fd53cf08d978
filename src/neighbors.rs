//! Symmetry aware neighbor queries over a sampling.
//!
//! The sampled directions and their images under the neighbor operators of
//! the group are projected onto the unit sphere and stored in static k-d
//! trees. A query is answered on the expanded set, every hit is reduced back
//! into the asymmetric unit and the hits are mapped to indices of the
//! sampling.

use std::fmt;
use std::num::NonZero;

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use log::debug;
use rayon::prelude::*;

use crate::config::{KNN_GUARD_FACTOR, NEIGHBOR_MERGE_TOLERANCE};
use crate::orientation::{to_cartesian, Euler};
use crate::symmetry::Symmetry;

type Tree = ImmutableKdTree<f64, u32, 3, 32>;

/// A neighbor of a query: the sample it belongs to and its reduced orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub angle: Euler,
}

pub struct NeighborIndex {
    samples: Tree,
    expanded: Tree,
    neighbor_set: Vec<Euler>,
    multiplicity: usize,
    num_samples: usize,
    /// Squared chord length beyond which k-nearest candidates are dropped.
    guard: f64,
}

impl NeighborIndex {
    /// Builds the index of `angles`, sampled with step `delta` degrees.
    pub fn build(symmetry: &Symmetry, angles: &[Euler], delta: f64) -> Self {
        let neighbor_set = symmetry.symmetry_neighbors(angles, false);
        let multiplicity = symmetry.neighbor_operators().len();
        let guard = KNN_GUARD_FACTOR * (delta.to_radians() / 2.0).sin();

        debug!(
            "{}: building neighbor index for {} samples ({} images each)",
            symmetry.tag(),
            angles.len(),
            multiplicity
        );

        Self {
            samples: Tree::new_from_slice(&to_cartesian(angles)),
            expanded: Tree::new_from_slice(&to_cartesian(&neighbor_set)),
            neighbor_set,
            multiplicity,
            num_samples: angles.len(),
            guard: guard * guard,
        }
    }

    /// Hits within `angular_distance` degrees of each query, closest first.
    ///
    /// Queries must lie in the asymmetric unit, the expanded set only holds
    /// the images that can land next to it.
    pub fn within<T, F>(
        &self,
        symmetry: &Symmetry,
        queries: &[Euler],
        angular_distance: f64,
        project: F,
    ) -> Vec<Vec<T>>
    where
        T: Send,
        F: Fn(&Hit) -> T + Sync,
    {
        let chord = 2.0 * (angular_distance.to_radians() / 2.0).sin();
        let radius = chord * chord;

        to_cartesian(queries)
            .par_iter()
            .map(|q| {
                let found = self.expanded.within::<SquaredEuclidean>(q, radius);
                self.merge(symmetry, found.iter().map(|nn| nn.item as usize), usize::MAX)
                    .iter()
                    .map(&project)
                    .collect()
            })
            .collect()
    }

    /// The `k` closest hits of each query, closest first.
    pub fn nearest_k<T, F>(
        &self,
        symmetry: &Symmetry,
        queries: &[Euler],
        k: usize,
        project: F,
    ) -> Vec<Vec<T>>
    where
        T: Send,
        F: Fn(&Hit) -> T + Sync,
    {
        let k = k.min(self.num_samples);
        let Some(candidates) = NonZero::new(k * self.multiplicity) else {
            return queries.iter().map(|_| Vec::new()).collect();
        };

        to_cartesian(queries)
            .par_iter()
            .map(|q| {
                let found = self.expanded.nearest_n::<SquaredEuclidean>(q, candidates);
                let close = found
                    .iter()
                    .filter(|nn| nn.distance < self.guard)
                    .map(|nn| nn.item as usize);
                self.merge(symmetry, close, k).iter().map(&project).collect()
            })
            .collect()
    }

    /// Index of the closest sample of each query, ignoring symmetry.
    pub fn nearest_sample(&self, queries: &[Euler]) -> Vec<usize> {
        to_cartesian(queries)
            .par_iter()
            .map(|q| self.samples.nearest_one::<SquaredEuclidean>(q).item as usize)
            .collect()
    }

    /// Reduces candidate images and keeps the first hit per sample and per
    /// reduced orientation.
    fn merge(
        &self,
        symmetry: &Symmetry,
        items: impl Iterator<Item = usize>,
        limit: usize,
    ) -> Vec<Hit> {
        let mut hits: Vec<Hit> = Vec::new();
        for item in items {
            if hits.len() >= limit {
                break;
            }
            let index = item / self.multiplicity;
            if hits.iter().any(|h| h.index == index) {
                continue;
            }
            let angle = symmetry.reduce(&self.neighbor_set[item], true);
            if hits
                .iter()
                .any(|h| h.angle.approx_eq(&angle, NEIGHBOR_MERGE_TOLERANCE))
            {
                continue;
            }
            hits.push(Hit { index, angle });
        }
        hits
    }
}

impl fmt::Debug for NeighborIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeighborIndex")
            .field("num_samples", &self.num_samples)
            .field("multiplicity", &self.multiplicity)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientations;
    use crate::sampling::SamplingConfig;
    use crate::symmetry::Mirror;

    /// Smallest angle in degrees between the direction of `a` and any
    /// symmetry image of the direction of `b`.
    fn distance_modulo_symmetry(sym: &Symmetry, a: &Euler, b: &Euler) -> f64 {
        let va = a.to_cartesian();
        sym.symmetry_related(&[*b], Mirror::Without, false)
            .iter()
            .map(|m| va.dot(&m.to_cartesian()).clamp(-1.0, 1.0).acos().to_degrees())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn nearest_includes_self_and_stays_in_radius() {
        let sym = Symmetry::new("c5").unwrap();
        let samples = sym.even_angles(&SamplingConfig::new(10.0)).unwrap();
        let hits = sym.find_nearest_neighbors(&samples, 10.0).unwrap();
        assert_eq!(hits.len(), samples.len());

        for (i, row) in hits.iter().enumerate() {
            assert!(row.contains(&i), "sample {} missing from its own neighbors", i);
            for &j in row {
                let d = distance_modulo_symmetry(&sym, &samples[i], &samples[j]);
                assert!(d <= 10.0 + 1e-6, "{} -> {}: {} degrees", i, j, d);
            }
        }
    }

    #[test]
    fn nearest_angles_are_reduced() {
        let sym = Symmetry::new("d3").unwrap();
        sym.even_angles(&SamplingConfig::new(10.0)).unwrap();
        let queries = Orientations::random_uniform(20, Some(8)).eulers;
        for row in sym.find_nearest_neighbor_angles(&queries, 12.0).unwrap() {
            for angle in row {
                assert!(sym.is_in_subunit(angle.phi, angle.theta, true), "{:?}", angle);
            }
        }
    }

    #[test]
    fn queries_anywhere_on_the_sphere_find_every_neighbor() {
        let queries = Orientations::random_uniform(40, Some(5)).eulers;
        for tag in ["c5", "d4", "oct"] {
            let sym = Symmetry::new(tag).unwrap();
            let samples = sym.even_angles(&SamplingConfig::new(10.0)).unwrap();
            let rows = sym.find_nearest_neighbors(&queries, 10.0).unwrap();

            for (query, row) in queries.iter().zip(rows.iter()) {
                for (j, sample) in samples.iter().enumerate() {
                    let d = distance_modulo_symmetry(&sym, query, sample);
                    if d < 10.0 - 1e-6 {
                        assert!(row.contains(&j), "{}: {:?} misses {} at {}", tag, query, j, d);
                    }
                    if row.contains(&j) {
                        assert!(d <= 10.0 + 1e-6, "{}: {:?} -> {} at {}", tag, query, j, d);
                    }
                }
            }
        }
    }

    #[test]
    fn k_nearest_is_bounded_and_unique() {
        let sym = Symmetry::new("oct").unwrap();
        let samples = sym.even_angles(&SamplingConfig::new(5.0)).unwrap();
        let rows = sym.find_k_nearest_neighbors(&samples, 4).unwrap();
        for (i, row) in rows.iter().enumerate() {
            assert!(row.len() <= 4);
            assert!(row.contains(&i));
            let mut sorted = row.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), row.len());
        }
    }

    #[test]
    fn k_larger_than_sampling() {
        let sym = Symmetry::new("icos").unwrap();
        let samples = sym.even_angles(&SamplingConfig::new(15.0)).unwrap();
        let rows = sym.find_k_nearest_neighbors(&samples[..1], 100).unwrap();
        assert!(rows[0].len() <= samples.len());
        assert!(rows[0].contains(&0));
    }

    #[test]
    fn nearest_sample_ignores_symmetry() {
        let sym = Symmetry::new("c1").unwrap();
        sym.set_angles(
            vec![
                Euler::direction(0.0, 0.0),
                Euler::direction(0.0, 90.0),
                Euler::direction(90.0, 90.0),
            ],
            Some(90.0),
        );
        let queries = [Euler::direction(80.0, 85.0), Euler::direction(5.0, 5.0)];
        assert_eq!(sym.nearest_sample(&queries).unwrap(), vec![2, 0]);
    }

    #[test]
    fn index_follows_sampling() {
        let sym = Symmetry::new("c2").unwrap();
        sym.set_angles(vec![Euler::direction(10.0, 30.0)], Some(15.0));
        let query = [Euler::direction(10.0, 30.0)];
        assert_eq!(sym.find_nearest_neighbors(&query, 1.0).unwrap(), vec![vec![0]]);

        sym.set_angles(vec![Euler::direction(60.0, 60.0), query[0]], None);
        assert_eq!(sym.find_nearest_neighbors(&query, 1.0).unwrap(), vec![vec![1]]);
    }

    #[test]
    fn empty_sampling_is_an_error() {
        let sym = Symmetry::new("c2").unwrap();
        sym.set_angles(Vec::new(), None);
        assert_eq!(
            sym.find_k_nearest_neighbors(&[Euler::default()], 1).unwrap_err(),
            crate::error::SymmetryError::EmptySampling
        );
    }
}
