pub type ListResult<T> = Result<T, ListError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("schema mismatch at raw item {raw_index}: expected at most {expected} values, got {actual}")]
    SchemaMismatch {
        raw_index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("duplicate dimension: {0}")]
    DuplicateDimension(String),

    #[error("a dataset needs at least one dimension")]
    EmptySchema,

    #[error("dataset has already been populated")]
    AlreadyInitialized,

    #[error("invalid dataset options: {0}")]
    InvalidOptions(String),
}
