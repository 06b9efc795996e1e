// JobRadar - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Every bound the scan pipeline enforces is declared here so it is auditable
// in one place.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "JobRadar";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "JobRadar";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Scan limits
// =============================================================================

/// Nominal per-category threshold used for every scan. The effective value is
/// clamped into `[1, max(1, active_criteria_count)]`.
pub const FIXED_MIN_MATCH_SCORE: u8 = 1;

/// Hard cap on messages pulled from one channel history per scan.
pub const MAX_MESSAGES_PER_CHAT: usize = 2_000;

/// Live scans emit a `message_progress` event every this many scanned messages.
pub const LIVE_PROGRESS_INTERVAL: usize = 20;

/// Demo scans emit a `message_progress` event every this many scanned messages.
pub const DEMO_PROGRESS_INTERVAL: usize = 5;

/// Default lookback window in days.
pub const DEFAULT_SCAN_DEPTH_DAYS: u32 = 14;

/// Minimum configurable lookback window in days.
pub const MIN_SCAN_DEPTH_DAYS: u32 = 1;

/// Maximum configurable lookback window in days.
pub const MAX_SCAN_DEPTH_DAYS: u32 = 365;

// =============================================================================
// Job profile
// =============================================================================

/// Default "minimum categories matched" setting stored in the profile.
pub const DEFAULT_MIN_MATCH_SCORE: u8 = 2;

/// Lower bound of the stored match-score setting.
pub const MIN_MATCH_SCORE: u8 = 1;

/// Upper bound of the stored match-score setting (number of keyword categories).
pub const MAX_MATCH_SCORE: u8 = 3;

/// Built-in noise phrases. A message containing every lemma of any of these
/// is excluded regardless of the user's own exclusion list.
pub const SYSTEM_EXCLUSION_PHRASES: &[&str] = &[
    "рекомендую кандидата",
    "рекомендую специалиста",
    "кандидат в поиске работы",
    "ищу работу",
    "открыт к предложениям",
    "open to work",
    "курс для",
    "курсы для",
    "вебинар для",
    "обучение для",
    "мастер-класс для",
];

// =============================================================================
// Sources
// =============================================================================

/// Base URL for public chat and message links.
pub const TELEGRAM_LINK_BASE: &str = "https://t.me";

/// Prefix turning a private-channel internal id into a full chat id.
pub const PRIVATE_CHAT_ID_PREFIX: &str = "-100";

/// Minimum length of a public chat username.
pub const MIN_PUBLIC_CHAT_NAME_LEN: usize = 4;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum number of characters of message text included in log output.
pub const LOG_TEXT_PREVIEW_CHARS: usize = 180;

// =============================================================================
// Export / display
// =============================================================================

/// Maximum number of records that can be exported in a single operation.
pub const MAX_EXPORT_RECORDS: usize = 100_000;

/// Timestamp format used in exports and the CLI report view.
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maximum number of characters of message text shown per row in the CLI report.
pub const REPORT_TEXT_PREVIEW_CHARS: usize = 90;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Last-report persistence file name (stored in the platform data directory).
pub const REPORT_FILE_NAME: &str = "last_report.json";

/// Transport session subdirectory name (stored in the platform data directory).
pub const SESSIONS_DIR_NAME: &str = "sessions";
