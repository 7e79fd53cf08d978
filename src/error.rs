use thiserror::Error;

/// Errors raised by the symmetry core.
///
/// The first group are configuration errors (a symmetry or sampling option
/// that does not exist), the second group are invalid inputs to the sampler
/// and the neighbor queries. None of them are transient.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SymmetryError {
    #[error("unknown symmetry '{0}', expected cn, dn, tet, oct or icos")]
    UnknownSymmetry(String),

    #[error("symmetry '{tag}' needs an order n > 0")]
    InvalidOrder { tag: String },

    #[error("unknown sampling method '{0}', expected S, P or M")]
    UnknownMethod(String),

    #[error("unknown phiEqpsi mode '{0}', expected Zero or Minus")]
    UnknownPhiEqPsi(String),

    #[error(
        "incorrect parameters (phi1,phi2,theta1,theta2,delta): {phi1} {phi2} {theta1} {theta2} {delta}"
    )]
    InvalidRange {
        phi1: f64,
        phi2: f64,
        theta1: f64,
        theta2: f64,
        delta: f64,
    },

    #[error("no angular sampling available, run even_angles or set_angles first")]
    MissingSampling,

    #[error("the angular sampling is empty")]
    EmptySampling,
}

impl SymmetryError {
    /// True for errors caused by an unknown symmetry tag or sampling option.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SymmetryError::UnknownSymmetry(_)
                | SymmetryError::InvalidOrder { .. }
                | SymmetryError::UnknownMethod(_)
                | SymmetryError::UnknownPhiEqPsi(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SymmetryError>;
