use crate::Hw2EnvConfig;
use anyhow::{ensure, Result};
use arm_dqn_core::{error::ArmDqnError, record::Record, DiscreteAct, Env, Step, VecObs};
use log::{info, trace};
use pyo3::{
    types::{IntoPyDict, PyAny, PyTuple},
    PyObject, PyResult, Python, ToPyObject,
};

/// Converts an array-like Python object into a flat vector.
fn to_vec_f32(py: Python, obj: &PyAny) -> PyResult<Vec<f32>> {
    py.import("numpy")?
        .getattr("asarray")?
        .call1((obj, "float32"))?
        .call_method0("ravel")?
        .call_method0("tolist")?
        .extract()
}

/// The robotic arm simulation, driven through the Python interpreter.
///
/// An episode is truncated by the simulation itself, typically after 50 steps.
pub struct Hw2Env {
    env: PyObject,
    n_actions: usize,
}

impl Env for Hw2Env {
    type Config = Hw2EnvConfig;
    type Obs = VecObs;
    type Act = DiscreteAct;
    type Info = ();

    /// Instantiates the Python environment class.
    ///
    /// `seed` is not forwarded, the simulation has no seeding interface.
    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Python::with_gil(|py| {
            let sys = py.import("sys")?;
            // Rendering backends read sys.argv, which is empty in an embedded interpreter.
            let locals = [("sys", sys)].into_py_dict(py);
            py.eval("sys.argv.insert(0, 'arm-dqn')", None, Some(locals))?;
            if let Some(path) = config.python_path.as_ref() {
                sys.getattr("path")?
                    .call_method1("insert", (0, path.as_str()))?;
            }
            let ver = py.eval("sys.version", None, Some(locals))?;
            info!("Python version = {}", ver);

            let kwargs = vec![
                ("n_actions", config.n_actions.to_object(py)),
                ("render_mode", config.render_mode.to_object(py)),
            ]
            .into_py_dict(py);
            let env = py
                .import(config.module.as_str())?
                .getattr(config.class.as_str())?
                .call((), Some(kwargs))?;
            info!(
                "Built {}.{} with render_mode={} (seed {} is not used)",
                config.module, config.class, config.render_mode, seed
            );

            Ok(Self {
                env: env.to_object(py),
                n_actions: config.n_actions,
            })
        })
    }

    fn reset(&mut self) -> Result<()> {
        trace!("Hw2Env::reset()");
        Python::with_gil(|py| {
            self.env.call_method0(py, "reset")?;
            Ok(())
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        trace!("Hw2Env::step()");
        if a.0 >= self.n_actions {
            return Err(ArmDqnError::InvalidAction {
                action: a.0,
                n_actions: self.n_actions,
            }
            .into());
        }

        Python::with_gil(|py| {
            let ret = self.env.call_method1(py, "step", (a.0,))?;
            let ret: &PyTuple = ret.extract(py)?;
            ensure!(
                ret.len() >= 4,
                "step() returned {} values, expected 4",
                ret.len()
            );

            let obs = VecObs(to_vec_f32(py, ret.get_item(0))?);
            let reward = ret.get_item(1).extract::<f64>()? as f32;
            let is_terminated = ret.get_item(2).is_true()?;
            let is_truncated = ret.get_item(3).is_true()?;
            let step = Step::new(obs, *a, reward, is_terminated, is_truncated, ());

            Ok((step, Record::empty()))
        })
    }

    fn high_level_state(&self) -> Result<Self::Obs> {
        Python::with_gil(|py| {
            let state = self.env.call_method0(py, "high_level_state")?;
            Ok(VecObs(to_vec_f32(py, state.as_ref(py))?))
        })
    }
}
