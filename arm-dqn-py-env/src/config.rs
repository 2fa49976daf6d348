//! Configuration of [`Hw2Env`](super::Hw2Env).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Hw2Env`](super::Hw2Env).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Hw2EnvConfig {
    /// Python module defining the environment class.
    pub module: String,

    /// Name of the environment class.
    pub class: String,

    /// The number of discrete actions.
    pub n_actions: usize,

    /// Render mode given to the environment, `"offscreen"` or `"gui"`.
    pub render_mode: String,

    /// Directory added to `sys.path` before importing `module`.
    #[serde(default)]
    pub python_path: Option<String>,
}

impl Default for Hw2EnvConfig {
    fn default() -> Self {
        Self {
            module: "homework2".to_string(),
            class: "Hw2Env".to_string(),
            n_actions: 8,
            render_mode: "offscreen".to_string(),
            python_path: None,
        }
    }
}

impl Hw2EnvConfig {
    /// Sets the module defining the environment class.
    pub fn module(mut self, v: impl Into<String>) -> Self {
        self.module = v.into();
        self
    }

    /// Sets the name of the environment class.
    pub fn class(mut self, v: impl Into<String>) -> Self {
        self.class = v.into();
        self
    }

    /// Sets the number of discrete actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the render mode.
    pub fn render_mode(mut self, v: impl Into<String>) -> Self {
        self.render_mode = v.into();
        self
    }

    /// Sets the directory added to `sys.path`.
    pub fn python_path(mut self, v: impl Into<String>) -> Self {
        self.python_path = Some(v.into());
        self
    }

    /// Constructs [`Hw2EnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`Hw2EnvConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_env_config() -> Result<()> {
        let config = Hw2EnvConfig::default()
            .render_mode("gui")
            .python_path("/opt/sim");
        let dir = TempDir::new("hw2_env_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        assert_eq!(Hw2EnvConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_python_path_is_optional() -> Result<()> {
        let yaml = "module: homework2\nclass: Hw2Env\nn_actions: 8\nrender_mode: offscreen\n";
        let config: Hw2EnvConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config, Hw2EnvConfig::default());
        Ok(())
    }
}
