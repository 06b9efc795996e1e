// JobRadar - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation in the library layers.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all JobRadar operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum JobRadarError {
    /// Configuration loading, validation, or saving failed.
    Config(ConfigError),

    /// A scan run was refused or aborted.
    Scan(ScanError),

    /// Export operation failed.
    Export(ExportError),

    /// Persisting the last report failed.
    ReportStore(ReportStoreError),
}

impl fmt::Display for JobRadarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Scan(e) => write!(f, "Scan error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::ReportStore(e) => write!(f, "Report store error: {e}"),
        }
    }
}

impl std::error::Error for JobRadarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Scan(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::ReportStore(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading and persistence.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// TOML serialisation failed while saving.
    TomlSerialize {
        path: PathBuf,
        source: toml::ser::Error,
    },

    /// Some, but not all, transport credentials are filled in.
    PartialCredentials { missing: Vec<&'static str> },

    /// The API id is present but is not a number.
    InvalidApiId { value: String },

    /// I/O error reading or writing the config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::TomlSerialize { path, source } => {
                write!(f, "Config serialise error '{}': {source}", path.display())
            }
            Self::PartialCredentials { missing } => write!(
                f,
                "Telegram credentials are incomplete (missing: {}). \
                 Fill in API id, API hash and phone number for a live scan, \
                 or clear all three for a demo scan.",
                missing.join(", ")
            ),
            Self::InvalidApiId { value } => {
                write!(f, "Telegram API id '{value}' is not a number")
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::TomlSerialize { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for JobRadarError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Message source errors
// ---------------------------------------------------------------------------

/// Errors reported by a message-source transport.
///
/// Resolve and fetch failures are recoverable per source; connection and
/// authorization failures abort the run.
#[derive(Debug)]
pub enum SourceError {
    /// Could not establish or close the transport connection.
    Connection { reason: String },

    /// Authorization request or sign-in was rejected.
    Authorization { reason: String },

    /// The backend demands a second-factor password before sign-in completes.
    PasswordRequired,

    /// A chat reference could not be resolved to an entity.
    Resolve { reference: String, reason: String },

    /// Messages could not be loaded for a resolved chat.
    Fetch { chat: String, reason: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { reason } => write!(f, "connection failed: {reason}"),
            Self::Authorization { reason } => write!(f, "authorization failed: {reason}"),
            Self::PasswordRequired => write!(f, "two-factor password required"),
            Self::Resolve { reference, reason } => {
                write!(f, "cannot resolve '{reference}': {reason}")
            }
            Self::Fetch { chat, reason } => {
                write!(f, "cannot load messages from '{chat}': {reason}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Which secret the scan asked the credential collaborator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// One-time login code delivered by the backend.
    LoginCode,
    /// Second-factor account password.
    Password,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginCode => f.write_str("login code"),
            Self::Password => f.write_str("two-factor password"),
        }
    }
}

/// Fatal errors that refuse or abort a scan run.
#[derive(Debug)]
pub enum ScanError {
    /// The configuration cannot be used for a scan (e.g. partial credentials).
    Config(ConfigError),

    /// No sources are selected.
    NoSources,

    /// None of the keyword categories has any keywords.
    NoCriteria,

    /// Credentials are complete but no live transport was supplied.
    TransportUnavailable,

    /// The session needs a secret but no credential collaborator is available.
    CredentialUnavailable { kind: CredentialKind },

    /// The user declined or left empty a requested secret.
    CredentialDeclined { kind: CredentialKind },

    /// The transport failed while connecting or authorizing.
    Source(SourceError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::NoSources => write!(f, "No chats or links selected to scan"),
            Self::NoCriteria => write!(
                f,
                "No search criteria: add title, profile, or industry keywords"
            ),
            Self::TransportUnavailable => write!(
                f,
                "Credentials are configured for a live scan but no message transport is available"
            ),
            Self::CredentialUnavailable { kind } => write!(
                f,
                "Authorization needs a {kind}, but no way to ask for it is available"
            ),
            Self::CredentialDeclined { kind } => {
                write!(f, "Authorization cancelled: {kind} was not entered")
            }
            Self::Source(e) => write!(f, "Message source error: {e}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ScanError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SourceError> for ScanError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<ScanError> for JobRadarError {
    fn from(e: ScanError) -> Self {
        Self::Scan(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Export would exceed maximum record count.
    TooManyRecords { count: usize, max: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
            Self::TooManyRecords { count, max } => write!(
                f,
                "Export of {count} records exceeds maximum of {max}. \
                 Narrow the sources or the scan depth."
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExportError> for JobRadarError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Report store errors
// ---------------------------------------------------------------------------

/// Errors raised while persisting the last scan report.
#[derive(Debug)]
pub enum ReportStoreError {
    /// The report could not be serialised.
    Serialize { source: serde_json::Error },

    /// I/O error writing the report file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReportStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { source } => write!(f, "failed to serialise report: {source}"),
            Self::Io { path, source } => {
                write!(f, "failed to write report '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize { source } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ReportStoreError> for JobRadarError {
    fn from(e: ReportStoreError) -> Self {
        Self::ReportStore(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_partial_credentials_lists_missing_fields() {
        let err = ConfigError::PartialCredentials {
            missing: vec!["api_hash", "phone_number"],
        };
        let msg = err.to_string();
        assert!(msg.contains("api_hash, phone_number"), "got: {msg}");
    }

    #[test]
    fn test_scan_error_preserves_source_chain() {
        let err: JobRadarError = ScanError::from(SourceError::Connection {
            reason: "timeout".to_string(),
        })
        .into();
        let scan = err.source().expect("scan error in chain");
        let transport = scan.source().expect("source error in chain");
        assert!(transport.to_string().contains("timeout"));
    }

    #[test]
    fn test_credential_declined_message_names_secret() {
        let err = ScanError::CredentialDeclined {
            kind: CredentialKind::Password,
        };
        assert!(err.to_string().contains("two-factor password"));
    }
}
