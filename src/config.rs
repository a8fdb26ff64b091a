//! Generator configuration
//!
//! Config is stored in `~/.config/wgen/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags (`--home`, `--definitions`)
//! 2. Environment variable `WGEN_HOME`
//! 3. Config file
//! 4. Defaults

use std::fs;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WgenError};
use crate::node::NodeKind;

pub const HOME_ENV: &str = "WGEN_HOME";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub dag: DagConfig,

    #[serde(default)]
    pub workers: WorkersConfig,
}

/// Where generated code finds its files at run time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Base directory; the user's home when unset
    pub home: Option<Utf8PathBuf>,

    /// Shared-state logs, relative to `home`
    pub state_dir: Utf8PathBuf,

    /// Worker jars, relative to `home`
    pub lib_dir: Utf8PathBuf,

    /// Definitions registry, relative to `home`
    pub definitions_file: Utf8PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            home: None,
            state_dir: "bdre/airflow".into(),
            lib_dir: "bdre/lib".into(),
            definitions_file: "defFile.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistryMode {
    /// Deduplicated in memory, written once after the build
    #[default]
    Buffered,
    /// One append per registration, as it happens
    Append,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistryConfig {
    #[serde(default)]
    pub mode: RegistryMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DagConfig {
    pub owner: String,
    pub schedule_interval: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            owner: "wgen".to_string(),
            schedule_interval: "@once".to_string(),
            start_date: "2024-01-01".to_string(),
        }
    }
}

/// JVM worker launched by an action node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    pub main_class: String,
    /// Entries relative to `lib_dir`
    pub classpath: Vec<String>,
}

impl WorkerConfig {
    fn new(main_class: &str, classpath: &[&str]) -> Self {
        Self {
            main_class: main_class.to_string(),
            classpath: classpath.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkersConfig {
    pub import: WorkerConfig,
    pub lof: WorkerConfig,
    pub data_quality: WorkerConfig,
    pub action: WorkerConfig,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            import: WorkerConfig::new("com.wipro.ats.bdre.im.ImportMain", &["im/*", "*/*"]),
            lof: WorkerConfig::new("com.wipro.ats.bdre.lof.FileListMain", &["lof/*", "*/*"]),
            data_quality: WorkerConfig::new("com.wipro.ats.bdre.dq.DQMain", &["dq/*", "*/*"]),
            action: WorkerConfig::new("com.wipro.ats.bdre.wrapper.ActionMain", &["*/*"]),
        }
    }
}

impl WorkersConfig {
    pub fn get(&self, kind: NodeKind) -> Option<&WorkerConfig> {
        match kind {
            NodeKind::Import => Some(&self.import),
            NodeKind::Lof => Some(&self.lof),
            NodeKind::DataQuality => Some(&self.data_quality),
            NodeKind::Action => Some(&self.action),
            NodeKind::End | NodeKind::Halt => None,
        }
    }
}

impl GeneratorConfig {
    /// Returns `~/.config/wgen/`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wgen")
    }

    /// Returns `~/.config/wgen/config.toml`
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default location
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Returns error if the file exists but is malformed
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| WgenError::Config {
            reason: format!("Failed to read config file: {}", e),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WgenError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Environment variables take precedence over config file values
    pub fn with_env(mut self) -> Self {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.is_empty() {
                self.layout.home = Some(home.into());
            }
        }
        self
    }

    /// Resolve paths into a [`RuntimeLayout`]
    pub fn layout(&self) -> Result<RuntimeLayout> {
        let home = match &self.layout.home {
            Some(home) => home.clone(),
            None => default_home()?,
        };

        Ok(RuntimeLayout {
            state_dir: home.join(&self.layout.state_dir),
            lib_dir: home.join(&self.layout.lib_dir),
            definitions_path: home.join(&self.layout.definitions_file),
            workers: self.workers.clone(),
            home,
        })
    }
}

fn default_home() -> Result<Utf8PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| WgenError::Config {
        reason: format!("Cannot determine home directory; set {}", HOME_ENV),
    })?;
    Utf8PathBuf::from_path_buf(home).map_err(|p| WgenError::Config {
        reason: format!("Home directory is not valid UTF-8: {}", p.display()),
    })
}

/// Resolved file locations used by generated code
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeLayout {
    home: Utf8PathBuf,
    state_dir: Utf8PathBuf,
    lib_dir: Utf8PathBuf,
    definitions_path: Utf8PathBuf,
    workers: WorkersConfig,
}

impl RuntimeLayout {
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    pub fn state_dir(&self) -> &Utf8Path {
        &self.state_dir
    }

    /// Log written by the tasks of one pipeline
    pub fn job_info_path(&self, parent_process_id: u32) -> Utf8PathBuf {
        self.state_dir.join(format!("{}_jobInfo.txt", parent_process_id))
    }

    /// Log shared by every pipeline
    pub fn driver_info_path(&self) -> Utf8PathBuf {
        self.state_dir.join("etldriverInfo.txt")
    }

    pub fn definitions_path(&self) -> &Utf8Path {
        &self.definitions_path
    }

    pub fn set_definitions_path(&mut self, path: Utf8PathBuf) {
        self.definitions_path = path;
    }

    /// `java -cp <classpath> <main class>`; empty for control kinds
    pub fn worker_program(&self, kind: NodeKind) -> Vec<String> {
        let Some(worker) = self.workers.get(kind) else {
            return Vec::new();
        };

        let classpath = worker
            .classpath
            .iter()
            .map(|entry| self.lib_dir.join(entry).into_string())
            .collect::<Vec<_>>()
            .join(":");

        vec![
            "java".to_string(),
            "-cp".to_string(),
            classpath,
            worker.main_class.clone(),
        ]
    }
}
