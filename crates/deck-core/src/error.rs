use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("no authenticated user")]
    Unauthenticated,

    #[error("no access to organization: {0}")]
    Forbidden(String),

    #[error("invalid path '{0}': must look like /a/b/c")]
    InvalidPath(String),

    #[error("invalid folder path '{0}': must be / or end with /")]
    InvalidFolderPath(String),

    #[error("'{0}' cannot be a storage key")]
    ReservedKey(String),

    #[error("invalid storage key '{0}': must be at least 3 characters")]
    InvalidKey(String),

    #[error("organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("event not found: {0}")]
    EventNotFound(String),

    #[error("storage key not found: {0}")]
    StorageKeyNotFound(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("name already taken: {0}")]
    NameTaken(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;
