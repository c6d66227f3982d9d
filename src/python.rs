use std::path::Path;

use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;

use crate::config::SimConfig;
use crate::core::particle::DIM;
use crate::core::Simulation;
use crate::error::Error;
use crate::io::SnapshotWriter;

fn py_err(e: Error) -> PyErr {
    match e {
        Error::Export { .. } | Error::Io(_) => PyOSError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn to_array(rows: &[[f64; DIM]]) -> Array2<f64> {
    let mut arr = Array2::<f64>::zeros((rows.len(), DIM));
    for (i, row) in rows.iter().enumerate() {
        for k in 0..DIM {
            arr[[i, k]] = row[k];
        }
    }
    arr
}

fn read_rows(arr: &PyReadonlyArray2<'_, f64>, n: usize, what: &str) -> PyResult<Vec<[f64; DIM]>> {
    let arr = arr.as_array();
    if arr.shape() != [n, DIM] {
        return Err(PyValueError::new_err(format!(
            "{what} must have shape ({n}, {DIM}), got {:?}",
            arr.shape()
        )));
    }
    let mut out = vec![[0.0; DIM]; n];
    for (i, row) in out.iter_mut().enumerate() {
        for k in 0..DIM {
            let val = arr[[i, k]];
            if !val.is_finite() {
                return Err(PyValueError::new_err(format!("{what} values must be finite")));
            }
            row[k] = val;
        }
    }
    Ok(out)
}

/// Python-facing wrapper around [`Simulation`].
///
/// - `MdSim(config_toml=None, seed=None)`
/// - `step()`, `advance(n)`
/// - `get_positions()`, `get_velocities()` -> np.ndarray, shape (N, 3)
/// - `get_clusters()` -> list of cluster labels
/// - `get_energy_log()` -> np.ndarray, shape (M, 3): kinetic, potential, total
/// - `write_xyz(path, label=None)`
#[pyclass]
pub struct MdSim {
    sim: Simulation,
}

#[pymethods]
impl MdSim {
    /// Build a simulation from a TOML document (defaults when omitted).
    ///
    /// Raises ValueError for invalid configuration or when initial placement fails.
    #[new]
    #[pyo3(signature = (config_toml=None, seed=None))]
    fn new(config_toml: Option<&str>, seed: Option<u64>) -> PyResult<Self> {
        let config = match config_toml {
            Some(text) => SimConfig::from_toml_str(text).map_err(py_err)?,
            None => SimConfig::default(),
        };
        let sim = Simulation::new(config, seed).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Advance one step. Raises ValueError once the step budget is used up.
    fn step(&mut self, py: Python<'_>) -> PyResult<()> {
        py.detach(|| self.sim.step()).map_err(py_err)
    }

    /// Advance up to `n` steps (releases the GIL). Returns the number of steps taken.
    fn advance(&mut self, py: Python<'_>, n: u64) -> PyResult<u64> {
        py.detach(|| self.sim.advance(n)).map_err(py_err)
    }

    fn get_positions(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        Ok(to_array(&self.sim.positions()).into_pyarray(py).unbind())
    }

    fn get_velocities(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        Ok(to_array(&self.sim.velocities()).into_pyarray(py).unbind())
    }

    /// Overwrite all positions from an (N, 3) float64 array.
    /// The caller is responsible for keeping them inside the box and free of overlaps.
    fn set_positions(&mut self, positions: PyReadonlyArray2<'_, f64>) -> PyResult<()> {
        let rows = read_rows(&positions, self.sim.num_particles(), "positions")?;
        for (p, r) in self.sim.particles.iter_mut().zip(rows) {
            p.set_position(r).map_err(py_err)?;
        }
        Ok(())
    }

    /// Overwrite all velocities from an (N, 3) float64 array.
    fn set_velocities(&mut self, velocities: PyReadonlyArray2<'_, f64>) -> PyResult<()> {
        let rows = read_rows(&velocities, self.sim.num_particles(), "velocities")?;
        for (p, v) in self.sim.particles.iter_mut().zip(rows) {
            p.set_velocity(v).map_err(py_err)?;
        }
        Ok(())
    }

    /// Cluster label per particle; equal labels mean stuck together.
    fn get_clusters(&self) -> Vec<usize> {
        let clusters = self.sim.clusters();
        (0..clusters.len()).map(|i| clusters.cluster_of(i)).collect()
    }

    fn get_energy_log(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        let log = self.sim.energy_log();
        let mut arr = Array2::<f64>::zeros((log.len(), 3));
        for (i, e) in log.iter().enumerate() {
            arr[[i, 0]] = e.kinetic;
            arr[[i, 1]] = e.potential;
            arr[[i, 2]] = e.total;
        }
        Ok(arr.into_pyarray(py).unbind())
    }

    /// Write the current positions as an XYZ snapshot. Raises OSError on failure.
    #[pyo3(signature = (path, label=None))]
    fn write_xyz(&self, path: &str, label: Option<&str>) -> PyResult<()> {
        let label = label.unwrap_or(self.sim.config().system.label.as_str());
        let writer = SnapshotWriter::from_config(self.sim.config());
        writer
            .write(
                Path::new(path),
                &self.sim.xyz_records(label),
                &self.sim.snapshot_comment(),
            )
            .map_err(py_err)
    }

    #[getter]
    fn step_count(&self) -> u64 {
        self.sim.step_count()
    }

    #[getter]
    fn num_particles(&self) -> usize {
        self.sim.num_particles()
    }
}

/// The mdsim Python module entry point.
#[pymodule]
fn mdsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<MdSim>()?;
    Ok(())
}
