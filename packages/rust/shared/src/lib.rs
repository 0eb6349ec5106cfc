//! Shared types, error model, and configuration for TrainSet.
//!
//! This crate is the foundation depended on by all other TrainSet crates.
//! It provides:
//! - [`TrainSetError`], the unified error type
//! - Domain types ([`Topic`], [`TrainingPair`], [`Dataset`], [`MergedDocument`], [`RunId`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ModelConfig, PipelineConfig, PipelineDefaults, ScrapeConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, TrainSetError};
pub use types::{
    Dataset, MergedDocument, RunId, ScrapedExtract, Topic, TrainingPair, normalize_field,
};
