//! Errors surfaced to users of the crate.

use crate::{
    gen::GenError,
    input::ParseError,
    policy::ConfigError,
    task::ValidationError
};

use std::io;

/// Any error that prevents a simulation from starting.
///
/// Deadline misses are never errors; they are part of a [`RunResult`](`crate::report::RunResult`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gen(#[from] GenError)
}
