// Rust guideline compliant 2026-10-12

//! Demo adapter for the `ScanLog` port.
//!
//! Emits each scan attempt as a `tracing` event and always returns `Ok(())`.
//! `ScanLogError::Unavailable` is unreachable in this adapter.

use domain::{ScanAttempt, ScanLog, ScanLogError};

/// `ScanLog` adapter that writes audit records to the log stream only.
///
/// Successful redemptions log at `info`, rejections at `warn`.
#[derive(Debug)]
pub struct LogScanLog;

impl LogScanLog {
    /// Create a new log-only scan log.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogScanLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanLog for LogScanLog {
    async fn append(&self, attempt: &ScanAttempt) -> Result<(), ScanLogError> {
        if attempt.is_valid() {
            tracing::info!(
                scan_id = %attempt.id,
                promotion_id = %attempt.promotion_id,
                location = %reported_location(attempt),
                "log_scan_log.redeemed"
            );
        } else {
            tracing::warn!(
                scan_id = %attempt.id,
                promotion_id = %attempt.promotion_id,
                location = %reported_location(attempt),
                status = %attempt.status,
                reason = %attempt.reason,
                "log_scan_log.rejected"
            );
        }
        Ok(())
    }
}

fn reported_location(attempt: &ScanAttempt) -> String {
    attempt.reported_location.map_or_else(|| "none".to_owned(), |c| c.to_string())
}
