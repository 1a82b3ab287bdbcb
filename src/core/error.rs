use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarapaceError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Catalog error: {0}")]
    CatalogError(String),
    #[error("Policy error: {0}")]
    PolicyError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
