use thiserror::Error;

/// Unified error type for the entire finance-tracker-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
///
/// All variants are recoverable: the presentation layer shows the
/// `Display` text as the rejection reason and the in-memory dataset is
/// left exactly as it was before the failed call.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: String, name: String },

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid year '{0}': expected a 4-digit year")]
    InvalidYear(String),

    #[error("Invalid month {0}: expected 1-12")]
    InvalidMonth(u32),

    #[error("Year {0} already exists")]
    DuplicateYear(String),

    #[error("Cannot delete year {0}: it is the only remaining year")]
    LastYearProtected(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Platform '{0}' is in use by an open or sold investment")]
    PlatformInUse(String),

    #[error("Platform '{0}' already exists")]
    DuplicatePlatform(String),

    // ── Lookup ──────────────────────────────────────────────────────
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Base bill not found: {0}")]
    BaseBillNotFound(String),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(String),

    #[error("Year not found: {0}")]
    YearNotFound(String),

    #[error("Platform not found: {0}")]
    PlatformNotFound(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Storage / File ──────────────────────────────────────────────
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: wrong password or corrupted file")]
    Decryption,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Remote store ────────────────────────────────────────────────
    #[error("API error ({store}): {message}")]
    Api { store: String, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl CoreError {
    pub(crate) fn duplicate(kind: &str, name: &str) -> Self {
        CoreError::DuplicateName {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL; never echo query strings back.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<aes_gcm::Error> for CoreError {
    fn from(_: aes_gcm::Error) -> Self {
        CoreError::Decryption
    }
}
