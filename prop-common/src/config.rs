use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// Memory settings for the coordinate buffer
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MemoryConfig {
    #[serde(default = "default_initial_pages")]
    pub initial_pages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig { initial_pages: default_initial_pages() }
    }
}

// How often the step list is replayed and recorded
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub iterations: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
}

/// A named coordinate placed in memory before the first step.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CoordConfig {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

/// One operation of the step list. The first named coordinate is mutated in place.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Add { target: String, operand: String },
    Subtract { target: String, operand: String },
    Multiply { target: String, operand: String },
    Divide { target: String, operand: String },
    Factor { target: String, scalar: f32 },
    Divisor { target: String, scalar: f32 },
    Set { target: String, x: f32, y: f32 },
    /// Overwrites `target` with the value of `source`, placing a new block if `target` was removed.
    Copy { target: String, source: String },
    Remove { target: String },
}

impl Step {
    pub fn target(&self) -> &str {
        match self {
            Step::Add { target, .. }
            | Step::Subtract { target, .. }
            | Step::Multiply { target, .. }
            | Step::Divide { target, .. }
            | Step::Factor { target, .. }
            | Step::Divisor { target, .. }
            | Step::Set { target, .. }
            | Step::Copy { target, .. }
            | Step::Remove { target } => target,
        }
    }

    pub fn operand(&self) -> Option<&str> {
        match self {
            Step::Add { operand, .. }
            | Step::Subtract { operand, .. }
            | Step::Multiply { operand, .. }
            | Step::Divide { operand, .. }
            | Step::Copy { source: operand, .. } => Some(operand),
            _ => None,
        }
    }
}

/// A pair of coordinates whose distance is written into every snapshot.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TrackDistance {
    pub from: String,
    pub to: String,
}

/// Snapshot file format, parsed from `OutputConfig::format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Bincode,
    Messagepack,
    Raw,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub format: Option<String>, // "json", "bincode", "messagepack" or "raw"
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    #[serde(default = "default_true")]
    pub save_positions: bool,
}

impl OutputConfig {
    /// Parsed output format. `None` means the configured name is unknown.
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self.format.as_deref().unwrap_or("json") {
            "json" => Some(OutputFormat::Json),
            "bincode" => Some(OutputFormat::Bincode),
            "messagepack" => Some(OutputFormat::Messagepack),
            "raw" => Some(OutputFormat::Raw),
            _ => None,
        }
    }
}

// Main stage configuration structure, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StageConfig {
    #[serde(default)]
    pub memory: MemoryConfig,
    pub timing: TimingConfig,
    pub coords: Vec<CoordConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub track_distance: Vec<TrackDistance>,
    pub output: OutputConfig,
}

impl StageConfig {
    /// Loads the stage configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid stage config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: StageConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory.initial_pages == 0 {
            anyhow::bail!("memory.initial_pages must be greater than 0.");
        }
        if self.coords.is_empty() {
            anyhow::bail!("At least one [[coords]] entry is required.");
        }

        let mut names = HashSet::new();
        for coord in &self.coords {
            if coord.name.is_empty() {
                anyhow::bail!("Coordinate names must not be empty.");
            }
            if !names.insert(coord.name.as_str()) {
                anyhow::bail!("Duplicate coordinate name '{}'.", coord.name);
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            for name in std::iter::once(step.target()).chain(step.operand()) {
                if !names.contains(name) {
                    anyhow::bail!("Step {} references unknown coordinate '{}'.", i + 1, name);
                }
            }
        }
        for pair in &self.track_distance {
            for name in [pair.from.as_str(), pair.to.as_str()] {
                if !names.contains(name) {
                    anyhow::bail!("track_distance references unknown coordinate '{}'.", name);
                }
            }
        }
        Ok(())
    }
}

fn default_initial_pages() -> usize {
    1
}

fn default_record_interval() -> u32 {
    1
}

fn default_true() -> bool {
    true
}
