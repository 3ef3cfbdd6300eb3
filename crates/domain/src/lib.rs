// Rust guideline compliant 2026-10-12

//! Shared domain types for the coupon redemption engine.
//!
//! Defines `PromotionRecord`, `ScanRequest`, `ScanAttempt`, the redemption
//! status taxonomy (`Status`, `Outcome`, `Validation`) and the hexagonal port
//! traits `PromotionLookup` and `ScanLog`.
//! All other crates depend on this crate; it depends on no workspace crate.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude, range `[-90, 90]`.
    pub latitude: f64,
    /// Longitude, range `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate without range checks; see [`is_usable`](Self::is_usable).
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// `true` when both components are finite and inside their degree ranges.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Promotion record
// ---------------------------------------------------------------------------

/// Stored definition of a coupon promotion.
///
/// Read-only from the engine's point of view; created and edited elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRecord {
    /// Opaque unique identifier, used as the redemption key.
    pub id: String,
    /// Display text.
    pub title: String,
    /// Start of the daily redemption window. `None` means not configured.
    pub start_time: Option<NaiveTime>,
    /// End of the daily redemption window (inclusive). `None` means not configured.
    pub end_time: Option<NaiveTime>,
    /// Last calendar day on which the promotion may be redeemed.
    pub validity_until: Option<NaiveDate>,
    /// Store position the geofence is centred on.
    pub location: Coordinate,
    /// Pointer to the display asset; surfaced only on a valid redemption.
    pub image_reference: String,
}

impl PromotionRecord {
    /// Daily window as `(start, end)`, or `None` if either bound is missing.
    #[must_use]
    pub fn daily_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.start_time.zip(self.end_time)
    }
}

// ---------------------------------------------------------------------------
// Status taxonomy
// ---------------------------------------------------------------------------

/// Wire-level redemption status. Numeric codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 1: redeemable now.
    Valid,
    /// 2: unknown or unparseable id, or lookup failure.
    NotFound,
    /// 3: past calendar validity or outside daily hours.
    Expired,
    /// 4: outside the geofence radius.
    OutOfRange,
    /// 5: no usable device coordinate.
    NoLocation,
}

impl Status {
    /// Numeric status code, `1..=5`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Valid => 1,
            Self::NotFound => 2,
            Self::Expired => 3,
            Self::OutOfRange => 4,
            Self::NoLocation => 5,
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Valid),
            2 => Some(Self::NotFound),
            3 => Some(Self::Expired),
            4 => Some(Self::OutOfRange),
            5 => Some(Self::NoLocation),
            _ => None,
        }
    }

    /// Upper-snake-case name, as used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::NotFound => "NOT_FOUND",
            Self::Expired => "EXPIRED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::NoLocation => "NO_LOCATION",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one validation. Only [`Outcome::Valid`] carries display content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Redeemable now.
    Valid {
        /// Promotion title.
        title: String,
        /// Promotion display asset.
        image_reference: String,
    },
    /// Unknown id, unparseable payload, unconfigured record or lookup failure.
    NotFound,
    /// Past calendar validity, or outside the daily window.
    Expired,
    /// Reported position outside the geofence.
    OutOfRange,
    /// No usable reported position.
    NoLocation,
}

impl Outcome {
    /// Status code for this outcome.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Valid { .. } => Status::Valid,
            Self::NotFound => Status::NotFound,
            Self::Expired => Status::Expired,
            Self::OutOfRange => Status::OutOfRange,
            Self::NoLocation => Status::NoLocation,
        }
    }
}

/// An outcome plus the human-readable message explaining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// The definitive outcome.
    pub outcome: Outcome,
    /// Message shown to the scanner operator and stored as the audit reason.
    pub message: String,
}

impl Validation {
    /// Pair an outcome with its message.
    #[must_use]
    pub fn new(outcome: Outcome, message: impl Into<String>) -> Self {
        Self { outcome, message: message.into() }
    }

    /// Shorthand for `self.outcome.status()`.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.outcome.status()
    }
}

// ---------------------------------------------------------------------------
// Scan request / scan attempt
// ---------------------------------------------------------------------------

/// Everything a single validation call needs from the scanner client.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Raw scanned text, either a URL or a plain code.
    pub payload: String,
    /// Device position, if the client could obtain one.
    pub location: Option<Coordinate>,
    /// Local wall-clock time of the scan.
    pub now: NaiveDateTime,
}

/// Immutable audit entry, one per validation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanAttempt {
    /// Audit row key.
    pub id: uuid::Uuid,
    /// Identifier extracted from the payload; empty when none could be read.
    pub promotion_id: String,
    /// Time supplied with the request.
    pub timestamp: NaiveDateTime,
    /// Device position as reported, unusable values included.
    pub reported_location: Option<Coordinate>,
    /// Status returned to the caller.
    pub status: Status,
    /// Message returned to the caller.
    pub reason: String,
}

impl ScanAttempt {
    /// Build the audit entry for `request` answered with `validation`.
    #[must_use]
    pub fn record(
        promotion_id: impl Into<String>,
        request: &ScanRequest,
        validation: &Validation,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            promotion_id: promotion_id.into(),
            timestamp: request.now,
            reported_location: request.location,
            status: validation.status(),
            reason: validation.message.clone(),
        }
    }

    /// `true` if the scan was a successful redemption.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == Status::Valid
    }
}

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Errors from the `PromotionLookup` port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The store has no promotion with this id.
    #[error("promotion {id:?} not found")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },
    /// The store could not be reached or answered with an error.
    #[error("promotion store unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the `ScanLog` port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanLogError {
    /// The audit record could not be written.
    #[error("scan log unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: resolve an identifier to its promotion record.
///
/// The orchestrator depends exclusively on this trait -- never on a concrete
/// store client.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait PromotionLookup {
    /// Fetch the promotion stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` when no such promotion exists, or
    /// `LookupError::Unavailable` on transport/store failure.
    async fn lookup(&self, id: &str) -> Result<PromotionRecord, LookupError>;
}

/// Hexagonal port: append-only sink for scan audit records.
///
/// Called once per validation (best-effort; failures never alter the outcome).
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait ScanLog {
    /// Append one scan attempt.
    ///
    /// # Errors
    ///
    /// Returns `ScanLogError::Unavailable` when the record cannot be written.
    async fn append(&self, attempt: &ScanAttempt) -> Result<(), ScanLogError>;
}
