use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a conversion request is rejected before anything is spawned.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no input file was selected")]
    MissingInput,

    #[error("no destination folder was selected")]
    MissingDestination,

    #[error("input {0:?} does not exist")]
    InputNotFound(PathBuf),

    #[error("input {0:?} is not a regular file")]
    InputNotAFile(PathBuf),

    #[error("destination {0:?} is not a directory")]
    DestinationNotADirectory(PathBuf),

    #[error("invalid frame rate {0:?}")]
    InvalidFrameRate(String),

    #[error("unknown codec profile {0:?}")]
    UnknownCodec(String),

    #[error("unknown aspect class {0:?}")]
    UnknownAspect(String),

    #[error("resolution preset {0} is out of range")]
    InvalidPreset(usize),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {tool:?}: {source}")]
    Launch {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool:?} exited unsuccessfully while probing {path:?}")]
    Unsuccessful { tool: PathBuf, path: PathBuf },

    #[error("unexpected probe output {0:?}")]
    Unparseable(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Reasons `JobController::start` refuses to launch a job.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("a conversion is already in progress")]
    Busy,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to launch encoder {encoder:?}: {source}")]
    Launch {
        encoder: PathBuf,
        #[source]
        source: io::Error,
    },
}
