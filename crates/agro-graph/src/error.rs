use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0:?} not found")]
    NodeNotFound(String),

    #[error("node {0:?} is not a parcel")]
    NotAParcel(String),

    #[error("duplicate node id {0:?}")]
    DuplicateNode(String),

    #[error("expected exactly one processing plant, found {0}")]
    PlantCount(usize),

    #[error("unknown ranking criterion {0:?}: expected cost, time, distance, or accessibility")]
    UnknownCriterion(String),

    #[error("graph configuration error: {0}")]
    Config(String),

    #[error("node source parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
