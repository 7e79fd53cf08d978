use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::IntoPyObjectExt;
use symorient::{
    orientation::Euler,
    rotation,
    sampling::{Method, PhiEqPsi, SamplingConfig},
    symmetry::{Mirror, Symmetry},
    SymmetryError,
};

type Triplet = [f64; 3];
type Matrix = [[f64; 3]; 3];

fn to_py_err(err: SymmetryError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn eulers(angles: &[Triplet]) -> Vec<Euler> {
    angles.iter().copied().map(Euler::from).collect()
}

fn triplets(angles: &[Euler]) -> Vec<Triplet> {
    angles.iter().map(Euler::to_array).collect()
}

/// A number or a list of numbers.
#[derive(FromPyObject)]
enum Scalars {
    One(f64),
    Many(Vec<f64>),
}

/// Negative bounds select the default of the symmetry.
fn bound(value: f64) -> Option<f64> {
    (value >= 0.0).then_some(value)
}

/// Point-group symmetry with its cached angular sampling.
#[pyclass(name = "Symmetry", frozen)]
struct PySymmetry {
    inner: Symmetry,
}

#[pymethods]
impl PySymmetry {
    #[new]
    fn py_new(sym: &str) -> PyResult<Self> {
        let inner = Symmetry::new(sym).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn sym(&self) -> String {
        self.inner.tag().to_string()
    }

    #[getter]
    fn nsym(&self) -> usize {
        self.inner.nsym()
    }

    /// Brackets as `[[phi, theta, psi, alpha]; 2]`, indexed by inc_mirror.
    #[getter]
    fn brackets(&self) -> Vec<[f64; 4]> {
        self.inner
            .brackets()
            .iter()
            .map(|b| [b.phi, b.theta, b.psi, b.alpha])
            .collect()
    }

    #[getter]
    fn symangles(&self) -> Vec<Triplet> {
        triplets(self.inner.symangles())
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (delta=15.0, theta1=-1.0, theta2=-1.0, phi1=-1.0, phi2=-1.0, method="S", phi_eq_psi="Zero", inc_mirror=1))]
    fn even_angles(
        &self,
        py: Python<'_>,
        delta: f64,
        theta1: f64,
        theta2: f64,
        phi1: f64,
        phi2: f64,
        method: &str,
        phi_eq_psi: &str,
        inc_mirror: u8,
    ) -> PyResult<Vec<Triplet>> {
        let config = SamplingConfig::new(delta)
            .with_theta(bound(theta1), bound(theta2))
            .with_phi(bound(phi1), bound(phi2))
            .with_method(method.parse::<Method>().map_err(to_py_err)?)
            .with_phi_eq_psi(phi_eq_psi.parse::<PhiEqPsi>().map_err(to_py_err)?)
            .with_inc_mirror(inc_mirror != 0);
        let angles = py
            .allow_threads(|| self.inner.even_angles(&config))
            .map_err(to_py_err)?;
        Ok(triplets(&angles))
    }

    #[pyo3(signature = (angles, delta=None))]
    fn set_angles(&self, angles: Vec<Triplet>, delta: Option<f64>) {
        self.inner.set_angles(eulers(&angles), delta);
    }

    fn get_angles(&self) -> PyResult<Vec<Triplet>> {
        let angles = self.inner.angles().map_err(to_py_err)?;
        Ok(triplets(&angles))
    }

    /// Domain test for one direction or for lists of equal length.
    #[pyo3(signature = (phi, theta, inc_mirror=1))]
    fn is_in_subunit(
        &self,
        py: Python<'_>,
        phi: Scalars,
        theta: Scalars,
        inc_mirror: u8,
    ) -> PyResult<PyObject> {
        let inc_mirror = inc_mirror != 0;
        match (phi, theta) {
            (Scalars::One(phi), Scalars::One(theta)) => self
                .inner
                .is_in_subunit(phi, theta, inc_mirror)
                .into_py_any(py),
            (Scalars::Many(phi), Scalars::Many(theta)) if phi.len() == theta.len() => {
                let directions: Vec<Euler> = phi
                    .iter()
                    .zip(theta.iter())
                    .map(|(&phi, &theta)| Euler::direction(phi, theta))
                    .collect();
                let mask = py.allow_threads(|| self.inner.subunit_mask(&directions, inc_mirror));
                mask.into_py_any(py)
            }
            _ => Err(PyValueError::new_err(
                "phi and theta must both be numbers or lists of the same length",
            )),
        }
    }

    #[pyo3(signature = (angles, inc_mirror=1))]
    fn reduce_anglesets(&self, py: Python<'_>, angles: Vec<Triplet>, inc_mirror: u8) -> Vec<Triplet> {
        let angles = eulers(&angles);
        let reduced = py.allow_threads(|| self.inner.reduce_anglesets(&angles, inc_mirror != 0));
        triplets(&reduced)
    }

    #[pyo3(signature = (angles, return_mirror=0, return_unique=true))]
    fn symmetry_related(
        &self,
        angles: Vec<Triplet>,
        return_mirror: u8,
        return_unique: bool,
    ) -> PyResult<Vec<Triplet>> {
        let mirror = Mirror::try_from(return_mirror).map_err(PyValueError::new_err)?;
        let related = self
            .inner
            .symmetry_related(&eulers(&angles), mirror, return_unique);
        Ok(triplets(&related))
    }

    #[pyo3(signature = (angles, return_unique=true))]
    fn symmetry_neighbors(&self, angles: Vec<Triplet>, return_unique: bool) -> Vec<Triplet> {
        triplets(&self.inner.symmetry_neighbors(&eulers(&angles), return_unique))
    }

    fn find_nearest_neighbors(
        &self,
        py: Python<'_>,
        angles: Vec<Triplet>,
        angular_distance: f64,
    ) -> PyResult<Vec<Vec<usize>>> {
        let angles = eulers(&angles);
        py.allow_threads(|| self.inner.find_nearest_neighbors(&angles, angular_distance))
            .map_err(to_py_err)
    }

    fn find_k_nearest_neighbors(
        &self,
        py: Python<'_>,
        angles: Vec<Triplet>,
        k: usize,
    ) -> PyResult<Vec<Vec<usize>>> {
        let angles = eulers(&angles);
        py.allow_threads(|| self.inner.find_k_nearest_neighbors(&angles, k))
            .map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!("Symmetry('{}')", self.inner.tag())
    }
}

/// Rotation matrices of a list of Euler triplets.
#[pyfunction]
fn rotmatrix(angles: Vec<Triplet>) -> Vec<Matrix> {
    rotation::rotmatrix(&eulers(&angles))
        .iter()
        .map(|m| [0, 1, 2].map(|i| [0, 1, 2].map(|j| m[(i, j)])))
        .collect()
}

/// Euler triplets of a list of rotation matrices.
#[pyfunction]
fn recmat(matrices: Vec<Matrix>) -> Vec<Triplet> {
    let matrices: Vec<rotation::Rotation> = matrices
        .iter()
        .map(|m| rotation::Rotation::from_fn(|i, j| m[i][j]))
        .collect();
    triplets(&rotation::recmat(&matrices))
}

/// A Python module implemented in Rust.
#[pymodule]
fn symorient_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rotmatrix, m)?)?;
    m.add_function(wrap_pyfunction!(recmat, m)?)?;
    m.add_class::<PySymmetry>()?;
    Ok(())
}
