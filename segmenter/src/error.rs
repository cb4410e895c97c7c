use thiserror::Error;

/// Errors raised when constructing a splitter with inconsistent bounds.
///
/// Splitting itself never fails: any input string, including empty or
/// unpunctuated text, produces a (possibly empty) segment list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target length {target} cannot be greater than max length {max}")]
    TargetAboveMax { target: usize, max: usize },

    #[error("min length {min} cannot be greater than target length {target}")]
    MinAboveTarget { min: usize, target: usize },

    #[error("chunk overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge { overlap: usize, size: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
