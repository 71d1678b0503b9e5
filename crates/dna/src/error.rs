use endo_rope::ParseBaseError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::rewrite::RewriteError;

/// Errors surfaced by the `endo` driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid DNA: {0}")]
    Input(#[from] ParseBaseError),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("program halted: {0}")]
    Halted(#[from] RewriteError),
}
