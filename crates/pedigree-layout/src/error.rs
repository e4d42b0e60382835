#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("non-convergent layout (gave up after {iterations} relaxation iterations)")]
    NonConvergent { iterations: usize },
    #[error("pedigree contains a parent cycle through individual {individual_id}")]
    CyclicPedigree { individual_id: String },
    #[error("individual {individual_id} appears more than once")]
    DuplicateIndividual { individual_id: String },
    #[error("invalid pedigree entry on line {line}: {message}")]
    InvalidEntry { line: usize, message: String },
    #[error("pedigree JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
