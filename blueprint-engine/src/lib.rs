pub mod compliance;
pub mod demo;
pub mod migration;
pub mod openings;
pub mod plan;
pub mod topology;

pub mod errors {
    use blueprint_core::errors::ModelError;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    pub enum EngineError {
        #[error("sheet index {index} out of range (blueprint has {count} sheets)")]
        SheetNotFound { index: usize, count: usize },
        #[error(transparent)]
        Model(#[from] ModelError),
    }
}
