use thiserror::Error;

/// Problems caught locally, before anything is sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{file_name}: only jpg, jpeg and png receipts are accepted")]
    UnsupportedExtension { file_name: String },
    #[error("no receipt has been uploaded for this bill")]
    NothingStaged,
    #[error("invalid amount: {raw:?}")]
    InvalidAmount { raw: String },
    #[error("invalid date: {raw:?}")]
    InvalidDate { raw: String },
}

/// Failure of a call to the bill store. `Rejected` carries the store's own
/// message and displays it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Rejected(String),
    #[error("bill store unreachable: {0}")]
    Transport(String),
    #[error("invalid response from bill store: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::InvalidResponse(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("a receipt upload is already in progress")]
    UploadInFlight,
    #[error("this bill is already being sent")]
    FinalizeInFlight,
}
