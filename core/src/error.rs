use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("bundle dataset unavailable: {path}")]
    DatasetUnavailable { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("branch '{name}' is not in the directory")]
    UnknownBranch { name: String },

    #[error("branch name must not be empty")]
    EmptyBranchName,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
