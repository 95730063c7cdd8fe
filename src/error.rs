use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

/// What is wrong with a path the caller pointed us at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceProblem {
    Missing,
    NotADirectory,
    NotAFile,
    EmptyDirectory,
    NotJson,
}

impl fmt::Display for ResourceProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ResourceProblem::Missing => "does not exist",
            ResourceProblem::NotADirectory => "is not a directory",
            ResourceProblem::NotAFile => "is not a file",
            ResourceProblem::EmptyDirectory => "is an empty directory",
            ResourceProblem::NotJson => "is not a JSON file",
        };
        f.write_str(text)
    }
}

/// Project verification stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStage {
    Project,
    Assets,
    Metadata,
    Keypair,
    Configuration,
}

impl fmt::Display for VerifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            VerifyStage::Project => "project",
            VerifyStage::Assets => "assets",
            VerifyStage::Metadata => "metadata",
            VerifyStage::Keypair => "keypair",
            VerifyStage::Configuration => "configuration",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug)]
pub enum HerbsError {
    #[error("{path:?}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("{path:?} {problem}")]
    Resource {
        path: PathBuf,
        problem: ResourceProblem,
    },

    #[error("'{tool} {operation}' failed: {detail}")]
    ExternalTool {
        tool: String,
        operation: String,
        detail: String,
    },

    /// The program could not be launched at all, e.g. not installed.
    #[error("'{tool} {operation}' could not be started: {source}")]
    ToolUnavailable {
        tool: String,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interrupted after {step}")]
    Interrupted { step: String },

    #[error("more transfers required ({requested}) than tokens owned ({owned})")]
    DemandExceedsSupply { requested: u64, owned: usize },

    #[error("environment '{0}' is not supported")]
    UnsupportedEnvironment(String),

    #[error("{stage} verification failed: {source}")]
    Verification {
        stage: VerifyStage,
        #[source]
        source: Box<HerbsError>,
    },

    #[error("transfer list row {row}: {reason}")]
    TransferList { row: usize, reason: String },

    #[error("unexpected output from '{tool}': {reason}")]
    UnexpectedOutput { tool: String, reason: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HerbsError {
    pub fn resource(path: impl Into<PathBuf>, problem: ResourceProblem) -> Self {
        HerbsError::Resource {
            path: path.into(),
            problem,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HerbsError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn at_stage(self, stage: VerifyStage) -> Self {
        HerbsError::Verification {
            stage,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, HerbsError>;
