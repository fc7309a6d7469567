//! Maximal-correlation transfer
//!
//! For every source task a frozen extractor embeds the few-shot target
//! data. The statistics pass turns that embedding into a per-dimension
//! correlation strength `sigma` and a class-conditional direction `g`;
//! the scorer weights new embeddings by `sigma` and projects them on `g`;
//! the ensemble sums those scores over all tasks and picks the argmax.
//!
//! - [`statistics`]: `(sigma, g)` for one task
//! - [`scorer`]: batch-centered weighted scores
//! - [`FusionEnsemble`]: map over tasks, fold by addition

mod ensemble;
pub mod scorer;
pub mod statistics;

pub use ensemble::{FusionEnsemble, FusionOutput, FusionTask};
pub use scorer::{class_projection, feature_means, score};
pub use statistics::{StatisticsDiagnostics, TaskStatistics};
