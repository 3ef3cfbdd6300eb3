// Rust guideline compliant 2026-10-12

//! Coupon redemption validation engine.
//!
//! [`Validator`] turns one scan (raw payload, optional device position, local
//! time) into exactly one [`Validation`], consulting a `PromotionLookup` port
//! and recording a `ScanAttempt` on a `ScanLog` port.
//!
//! Rules are applied in a fixed order and the first failing rule decides:
//!
//! 1. no identifier, lookup failure, unknown or unconfigured promotion -> `NOT_FOUND`
//! 2. calendar validity passed -> `EXPIRED`
//! 3. outside the daily window -> `EXPIRED`
//! 4. no usable device position -> `NO_LOCATION`
//! 5. outside the geofence -> `OUT_OF_RANGE`
//! 6. otherwise -> `VALID`
//!
//! Entry points: [`Validator::validate`], [`Validator::evaluate`].
//! Configuration via [`ValidatorConfig::builder`].

pub mod geofence;
pub mod identifier;
pub mod schedule;

use chrono::NaiveDateTime;
use domain::{
    Coordinate, LookupError, Outcome, PromotionLookup, PromotionRecord, ScanAttempt, ScanLog,
    ScanLogError, ScanRequest, Validation,
};
use geofence::{DEFAULT_RADIUS_M, FenceStatus};
use schedule::{CalendarStatus, WindowStatus};
use std::time::Duration;

// ---------------------------------------------------------------------------
// RedemptionError
// ---------------------------------------------------------------------------

/// Errors raised while setting up the engine. Validation itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    /// The supplied configuration is invalid.
    #[error("invalid validator configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ValidatorConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Validator`].
///
/// Construct via [`ValidatorConfig::builder`].
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Geofence radius around each store, in metres.
    pub radius_m: f64,
    /// Upper bound on a single lookup. `None` waits as long as the port does.
    pub lookup_timeout: Option<Duration>,
    /// Upper bound on a single scan-log append; an elapsed append is dropped.
    pub scan_log_timeout: Duration,
}

/// Builder for [`ValidatorConfig`].
///
/// Obtain via [`ValidatorConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ValidatorConfigBuilder {
    radius_m: f64,
    lookup_timeout: Option<Duration>,
    scan_log_timeout: Duration,
}

/// Default bound on a scan-log append.
pub const DEFAULT_SCAN_LOG_TIMEOUT: Duration = Duration::from_secs(2);

impl ValidatorConfig {
    /// Create a builder.
    ///
    /// Default values: `radius_m = 1000`, `lookup_timeout = None`,
    /// `scan_log_timeout = 2 s`.
    #[must_use]
    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder {
            radius_m: DEFAULT_RADIUS_M,
            lookup_timeout: None,
            scan_log_timeout: DEFAULT_SCAN_LOG_TIMEOUT,
        }
    }
}

impl ValidatorConfigBuilder {
    /// Override the geofence radius.
    #[must_use]
    pub fn radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Bound every lookup by `timeout`; an expired lookup classifies as `NOT_FOUND`.
    #[must_use]
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Override the bound on a scan-log append.
    #[must_use]
    pub fn scan_log_timeout(mut self, timeout: Duration) -> Self {
        self.scan_log_timeout = timeout;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RedemptionError::InvalidConfig`] when the radius is not a
    /// positive finite number or either timeout is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ValidatorConfig, RedemptionError> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(RedemptionError::InvalidConfig {
                reason: format!("radius_m must be a positive number, got {}", self.radius_m),
            });
        }
        if self.lookup_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RedemptionError::InvalidConfig {
                reason: "lookup_timeout must be > 0".to_owned(),
            });
        }
        if self.scan_log_timeout.is_zero() {
            return Err(RedemptionError::InvalidConfig {
                reason: "scan_log_timeout must be > 0".to_owned(),
            });
        }
        Ok(ValidatorConfig {
            radius_m: self.radius_m,
            lookup_timeout: self.lookup_timeout,
            scan_log_timeout: self.scan_log_timeout,
        })
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Classifies scans into redemption outcomes.
///
/// Holds configuration only; ports are injected per call, so concurrent calls
/// share no mutable state.
#[derive(Debug)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    /// Create a new validator from `config`.
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Classify one scan and append its audit record to `scan_log`.
    ///
    /// Never fails: lookup errors and timeouts classify as `NOT_FOUND`, and a
    /// failed or stalled append is logged and discarded without touching the
    /// result. The append is bounded by `scan_log_timeout`.
    pub async fn validate<L, S>(&self, lookup: &L, scan_log: &S, request: &ScanRequest) -> Validation
    where
        L: PromotionLookup,
        S: ScanLog,
    {
        let key = identifier::canonical_key(&identifier::extract_id(&request.payload));
        let validation = self.classify(lookup, &key, request).await;

        tracing::info!(
            promotion_id = %key,
            status = %validation.status(),
            "validator.scan.classified"
        );

        let attempt = ScanAttempt::record(key, request, &validation);
        if let Err(e) = self.record(scan_log, &attempt).await {
            tracing::warn!(scan_id = %attempt.id, error = %e, "validator.scan_log.failed");
        }

        validation
    }

    /// Apply rules 1 (unconfigured hours) through 6 to an already resolved record.
    ///
    /// Pure: no I/O, no clock reads.
    #[must_use]
    pub fn evaluate(
        &self,
        record: &PromotionRecord,
        location: Option<Coordinate>,
        now: NaiveDateTime,
    ) -> Validation {
        let Some((start, end)) = record.daily_window() else {
            return Validation::new(
                Outcome::NotFound,
                "promotion has no redemption hours configured",
            );
        };

        if let (CalendarStatus::Expired, Some(until)) = (
            schedule::check_calendar(record.validity_until, now.date()),
            record.validity_until,
        ) {
            return Validation::new(Outcome::Expired, format!("promotion expired on {until}"));
        }

        if schedule::check_window(now.time(), start, end) == WindowStatus::OutOfWindow {
            return Validation::new(
                Outcome::Expired,
                format!(
                    "outside redemption hours (valid {} - {})",
                    start.format("%H:%M"),
                    end.format("%H:%M")
                ),
            );
        }

        match geofence::check_fence(location, record.location, self.config.radius_m) {
            FenceStatus::NoLocation => {
                Validation::new(Outcome::NoLocation, "no usable device location")
            }
            FenceStatus::OutOfRange { distance_m } => Validation::new(
                Outcome::OutOfRange,
                format!("too far from the store ({distance_m:.0} m)"),
            ),
            FenceStatus::InRange { .. } => Validation::new(
                Outcome::Valid {
                    title: record.title.clone(),
                    image_reference: record.image_reference.clone(),
                },
                "coupon validated",
            ),
        }
    }

    async fn classify<L: PromotionLookup>(
        &self,
        lookup: &L,
        key: &str,
        request: &ScanRequest,
    ) -> Validation {
        if key.is_empty() {
            return Validation::new(Outcome::NotFound, "invalid QR payload: no promotion id");
        }

        match self.resolve(lookup, key).await {
            Ok(record) => self.evaluate(&record, request.location, request.now),
            Err(LookupError::NotFound { .. }) => {
                Validation::new(Outcome::NotFound, "promotion not found")
            }
            Err(e @ LookupError::Unavailable { .. }) => {
                // Fail closed: a store outage is reported like an unknown coupon.
                tracing::warn!(promotion_id = %key, error = %e, "validator.lookup.failed");
                Validation::new(Outcome::NotFound, "promotion store unreachable")
            }
        }
    }

    async fn record<S: ScanLog>(
        &self,
        scan_log: &S,
        attempt: &ScanAttempt,
    ) -> Result<(), ScanLogError> {
        let limit = self.config.scan_log_timeout;
        tokio::time::timeout(limit, scan_log.append(attempt))
            .await
            .unwrap_or_else(|_elapsed| {
                Err(ScanLogError::Unavailable {
                    reason: format!("append timed out after {} ms", limit.as_millis()),
                })
            })
    }

    async fn resolve<L: PromotionLookup>(
        &self,
        lookup: &L,
        key: &str,
    ) -> Result<PromotionRecord, LookupError> {
        match self.config.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup.lookup(key))
                .await
                .unwrap_or_else(|_elapsed| {
                    Err(LookupError::Unavailable {
                        reason: format!("lookup timed out after {} ms", limit.as_millis()),
                    })
                }),
            None => lookup.lookup(key).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
