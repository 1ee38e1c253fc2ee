use thiserror::Error;

#[derive(Error, Debug)]
pub enum MerkleTreeError {
    #[error("invalid payout input: {0}")]
    InvalidInput(String),
    #[error("payout amounts overflow u64")]
    Overflow,
    #[error("cannot build a tree from zero leaves")]
    EmptyLeaves,
    #[error("leaf index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("artifact invalid: {0}")]
    ArtifactInvalid(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),
}
