use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeError {
    #[error("Could not parse {0}")]
    Parse(String),

    #[error("Unexpected AWS config format: {0}")]
    ConfigFormat(String),

    #[error("Account '{0}' already exists")]
    DuplicateAccount(String),

    #[error("Invalid account name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidAccountName(String),

    #[error("Account '{0}' not found")]
    UnknownAccount(String),

    #[error("Already inside a kee session for '{0}'. Type 'exit' to leave it first")]
    SessionAlreadyActive(String),

    #[error("Account '{0}' backs the active session. Exit the session or pass --force")]
    AccountInUse(String),

    #[error("Authentication failed for profile '{0}'. Try 'aws sso login --profile {0}'")]
    Authentication(String),

    #[error("External command failed: {0}")]
    ExternalCommand(String),

    #[error("Confirmation needed but stdin is not a terminal; pass {0} to proceed")]
    ConfirmationRequired(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KeeError>;
