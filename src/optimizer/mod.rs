//! # Optimizer Module
//!
//! Il cuore della pipeline, separato in sottomoduli:
//! - `media_optimizer`: Orchestratore e work scheduler
//! - `task_optimizer`: Worker per singoli file (Transcode Task)
//! - `progress_tracker`: Aggregatore thread-safe degli esiti
//! - `path_resolver`: Albero specchio e nomi degli artefatti

pub mod media_optimizer;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task_optimizer;

pub use media_optimizer::MediaOptimizer;
pub use path_resolver::{ArtifactKind, PathResolver};
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::{ArtifactOutcome, FileTask, TaskOptimizer};
