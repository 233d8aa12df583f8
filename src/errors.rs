use miette::Diagnostic;
use thiserror::Error;

use crate::graph::{AssemblyError, GraphError};
use crate::ingest::IngestError;
use crate::publisher::PublisherError;
use crate::settings::SettingsError;

#[derive(Debug, Error, Diagnostic)]
pub enum OrreryError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(orrery::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(orrery::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(orrery::serde))]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Publish(#[from] PublisherError),
}
