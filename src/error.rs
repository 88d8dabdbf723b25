use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no incident records were read; check the input file content")]
    EmptyInput,
}
