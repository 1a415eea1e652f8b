// Copyright 2025 Cornell University
// released under MIT License

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// the input could not be tokenized at all
    #[error("lexing failed: {message}")]
    Lexing { message: String },
    /// a transition refers to a location that was never derived
    #[error("unknown location `{name}`")]
    UnknownLocation { name: String },
    #[error("failed to perform i/o: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
