use thiserror::Error;

/// Failures surfaced while resolving a listing for display
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Invalid listing data: {0}")]
    InvalidListingData(String),

    #[error("Listing identifier must not be empty")]
    EmptyIdentifier,

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
