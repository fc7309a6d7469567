//! Experiment configuration parsing.
//!
//! An experiment is described by a YAML file. The configuration is parsed
//! once, validated, and then passed by reference into the pipeline; nothing
//! downstream mutates it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Dataset family the source tasks and target task are drawn from.
///
/// Each mode fixes the number of target classes.
///
/// Deserialization goes through [`FromStr`], so a YAML file accepts exactly
/// the spellings the command line does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DatasetMode {
    /// CIFAR-100 superclass split, binary target task
    #[default]
    Cifar,
    /// Stanford Dogs, 5-way target task
    Dogs,
    /// Tiny ImageNet, 5-way target task
    TinyImagenet,
}

impl DatasetMode {
    /// Number of target classes for this mode.
    pub fn num_classes(self) -> usize {
        match self {
            Self::Cifar => 2,
            Self::Dogs | Self::TinyImagenet => 5,
        }
    }

    /// Tag used in checkpoint file names.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Cifar => "cifar",
            Self::Dogs => "dogs",
            Self::TinyImagenet => "tiny_imagenet",
        }
    }

    /// Recommended source samples per class for this mode.
    pub fn recommended_source_samples(self) -> usize {
        match self {
            Self::Cifar | Self::TinyImagenet => 500,
            Self::Dogs => 50,
        }
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DatasetMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cifar" => Ok(Self::Cifar),
            "dogs" => Ok(Self::Dogs),
            "tiny_imagenet" | "tiny-imagenet" => Ok(Self::TinyImagenet),
            _ => Err(Error::InvalidMode { mode: s.to_string() }),
        }
    }
}

impl TryFrom<String> for DatasetMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Auxiliary classifier trained on the concatenated features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// One-vs-rest linear SVM (squared hinge)
    #[default]
    Svm,
    /// Multinomial logistic regression
    Logistic,
}

/// Complete experiment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Dataset mode; determines the class count
    #[serde(default)]
    pub mode: DatasetMode,
    /// Samples per class in each source task's training split; when absent
    /// from a file, the mode's recommendation
    #[serde(default = "default_source_samples")]
    pub num_source_samples_per_class: usize,
    /// Samples per class in the few-shot target training split
    #[serde(default = "default_target_samples")]
    pub num_target_samples_per_class: usize,
    /// Samples per class in the target test split
    #[serde(default = "default_test_samples")]
    pub num_test_samples_per_class: usize,
    /// Number of source tasks (one frozen extractor each)
    #[serde(default = "default_source_tasks")]
    pub num_source_tasks: usize,
    /// Width of each extractor's embedding
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// Rows per batch when iterating splits
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Seed threaded into data sampling and extractor initialization
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Auxiliary classifier for the concatenated-feature path
    #[serde(default)]
    pub classifier: ClassifierKind,
    /// Where the splits come from
    #[serde(default)]
    pub data: DataConfig,
    /// Frozen extractor checkpoints
    #[serde(default)]
    pub checkpoints: Option<CheckpointConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::for_mode(DatasetMode::default())
    }
}

impl ExperimentConfig {
    /// Default configuration for a dataset mode.
    pub fn for_mode(mode: DatasetMode) -> Self {
        Self {
            mode,
            num_source_samples_per_class: mode.recommended_source_samples(),
            num_target_samples_per_class: default_target_samples(),
            num_test_samples_per_class: default_test_samples(),
            num_source_tasks: default_source_tasks(),
            embedding_dim: default_embedding_dim(),
            batch_size: default_batch_size(),
            seed: default_seed(),
            classifier: ClassifierKind::default(),
            data: DataConfig::default(),
            checkpoints: None,
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading config file: {}", path.display()), e))?;

        Self::from_yaml(&content, path)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An unknown `mode` surfaces as [`Error::InvalidMode`] rather than a
    /// generic parse error.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
            Error::ConfigParsing { path: path.to_path_buf(), message: e.to_string() }
        })?;

        if let Some(mode) = raw.get("mode").and_then(serde_yaml::Value::as_str) {
            mode.parse::<DatasetMode>()?;
        }
        let source_samples_given = raw.get("num_source_samples_per_class").is_some();

        let mut config: Self = serde_yaml::from_value(raw).map_err(|e| Error::ConfigParsing {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if !source_samples_given {
            config.num_source_samples_per_class = config.mode.recommended_source_samples();
        }
        Ok(config)
    }

    /// Number of target classes.
    pub fn num_classes(&self) -> usize {
        self.mode.num_classes()
    }
}

/// Source of the three dataset splits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum DataConfig {
    /// Seeded Gaussian clusters, one label partition per source task
    #[default]
    Synthetic,
    /// Pre-extracted splits stored as SafeTensors files
    Safetensors {
        /// One file per source task
        #[serde(default)]
        source_train: Vec<PathBuf>,
        /// Few-shot target training split
        target_train: PathBuf,
        /// Target test split
        test: PathBuf,
    },
}

/// Frozen extractor checkpoint location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Directory holding `{mode}_net{task}.safetensors`
    #[serde(default = "default_checkpoint_dir")]
    pub dir: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self { dir: default_checkpoint_dir() }
    }
}

fn default_source_samples() -> usize {
    DatasetMode::default().recommended_source_samples()
}

fn default_target_samples() -> usize {
    20
}

fn default_test_samples() -> usize {
    100
}

fn default_source_tasks() -> usize {
    10
}

fn default_embedding_dim() -> usize {
    84
}

fn default_batch_size() -> usize {
    64
}

fn default_seed() -> u64 {
    142
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("saved_models")
}
