//! Point-group symmetry of particle orientations.
//!
//! Orientations are spider Euler triplets in degrees. The crate converts them
//! to and from rotation matrices, reduces them into the asymmetric unit of a
//! cyclic, dihedral or platonic point group, samples that unit evenly and
//! answers symmetry aware neighbor queries on a sampling.
//!
//! ```no_run
//! use symorient::sampling::SamplingConfig;
//! use symorient::symmetry::Symmetry;
//!
//! let sym = Symmetry::new("d7")?;
//! let samples = sym.even_angles(&SamplingConfig::new(5.0))?;
//! let neighbors = sym.find_nearest_neighbors(&samples[..1], 10.0)?;
//! # Ok::<(), symorient::error::SymmetryError>(())
//! ```

pub mod config;
pub mod error;
pub mod family;
pub mod neighbors;
pub mod orientation;
pub mod rotation;
pub mod sampling;
pub mod settings;
pub mod symmetry;

pub use error::{Result, SymmetryError};
pub use orientation::Euler;
pub use symmetry::{Mirror, Symmetry};
