use counterparty_core::{KeywordRejection, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid keyword '{keyword}': {reason}")]
    InvalidKeyword {
        keyword: String,
        reason: KeywordRejection,
    },
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}
