//! Tracing/logging setup shared by every host of the ledger.

use core::str::FromStr;

/// Initialize process-wide logging with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}

/// Initialize process-wide logging with the given output format.
pub fn init_with(format: LogFormat) {
    tracing::init(format);
}

/// Log line format.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line (default).
    #[default]
    Json,
    /// Human-readable single-line output.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "compact" | "text" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{other}' (expected json|compact)")),
        }
    }
}

/// Tracing configuration (filters, layers).
pub mod tracing;
