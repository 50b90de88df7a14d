use thiserror::Error;

/// Unified error type for the entire loppiskassan-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / File ──────────────────────────────────────────────
    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Data file is not readable and writable: {0}")]
    AccessDenied(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),
}

impl CoreError {
    /// True for failures of the local ledger file (I/O or permission).
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, CoreError::Storage(_) | CoreError::AccessDenied(_))
    }

    /// True for failures of the remote collaborator; these never touch the till state.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, CoreError::Api { .. } | CoreError::Network(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            CoreError::Storage(e.to_string())
        } else {
            CoreError::Serialization(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; strip the query so api keys never reach a log.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
