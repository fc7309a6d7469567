//! # maxcorr
//!
//! Multi-source transfer learning by maximal-correlation feature fusion.
//!
//! K frozen extractors, each pretrained on its own source task, embed a
//! few-shot target dataset. For every extractor the statistics pass finds
//! how strongly each embedding dimension correlates with the target labels
//! (`sigma`) and in which direction each class lies (`g`). Test examples are
//! scored per extractor as `(f - μ) · diag(sigma) · gᵀ`, the scores are summed
//! across extractors, and the argmax is the prediction. A linear classifier
//! on the concatenated raw embeddings serves as the baseline.
//!
//! ## Modules
//!
//! - [`fusion`]: statistics, scorer and multi-task ensemble
//! - [`extractor`]: frozen feature extractors and their checkpoints
//! - [`data`]: batches, dataset splits and dataset sources
//! - [`eval`]: accuracy, confusion matrix, linear baselines
//! - [`config`]: YAML experiment configuration and validation
//! - [`pipeline`]: end-to-end experiment execution
//!
//! ## Example
//!
//! ```
//! use maxcorr::config::ExperimentConfig;
//! use maxcorr::pipeline::Pipeline;
//!
//! let config = ExperimentConfig {
//!     num_source_tasks: 2,
//!     embedding_dim: 8,
//!     num_test_samples_per_class: 10,
//!     ..ExperimentConfig::default()
//! };
//! let result = Pipeline::new(&config).execute().unwrap();
//! assert_eq!(result.report.num_tasks, 2);
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod extractor;
pub mod fusion;
pub mod io;
pub mod pipeline;

pub use error::{Error, Result};
