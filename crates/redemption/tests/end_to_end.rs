// Rust guideline compliant 2026-10-12

//! End-to-end scans against a single store promotion open 09:00-21:00 with a
//! 1 km geofence.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use domain::{
    Coordinate, LookupError, Outcome, PromotionLookup, PromotionRecord, ScanAttempt, ScanLog,
    ScanLogError, ScanRequest, Status,
};
use redemption::{Validator, ValidatorConfig};
use std::cell::RefCell;

const PROMO_ID: &str = "115a13c3-bb80-4cd3-8a8f-3afcf5fb7584";

struct Catalog(PromotionRecord);

impl PromotionLookup for Catalog {
    async fn lookup(&self, id: &str) -> Result<PromotionRecord, LookupError> {
        if id == self.0.id {
            Ok(self.0.clone())
        } else {
            Err(LookupError::NotFound { id: id.to_owned() })
        }
    }
}

#[derive(Default)]
struct History(RefCell<Vec<ScanAttempt>>);

impl ScanLog for History {
    async fn append(&self, attempt: &ScanAttempt) -> Result<(), ScanLogError> {
        self.0.borrow_mut().push(attempt.clone());
        Ok(())
    }
}

fn catalog() -> Catalog {
    Catalog(PromotionRecord {
        id: PROMO_ID.to_owned(),
        title: "Combo Estudiantil 2x1".to_owned(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0),
        end_time: NaiveTime::from_hms_opt(21, 0, 0),
        validity_until: None,
        location: Coordinate::new(-17.3935, -66.1570),
        image_reference: "https://picsum.photos/seed/cupon1/800/500".to_owned(),
    })
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

fn validator() -> Validator {
    Validator::new(ValidatorConfig::builder().radius_m(1_000.0).build().expect("valid config"))
}

fn scan(payload: &str, location: Option<Coordinate>, now: NaiveDateTime) -> ScanRequest {
    ScanRequest { payload: payload.to_owned(), location, now }
}

#[tokio::test]
async fn scan_near_the_store_during_hours_is_valid() {
    let history = History::default();
    let request = scan(
        &format!("https://cupones.example/validar/{PROMO_ID}"),
        Some(Coordinate::new(-17.3930, -66.1572)),
        at(10, 0),
    );

    let result = validator().validate(&catalog(), &history, &request).await;

    match result.outcome {
        Outcome::Valid { title, image_reference } => {
            assert_eq!(title, "Combo Estudiantil 2x1");
            assert_eq!(image_reference, "https://picsum.photos/seed/cupon1/800/500");
        }
        other => panic!("expected Valid, got {other:?}"),
    }
    assert!(history.0.borrow()[0].is_valid());
}

#[tokio::test]
async fn scan_five_kilometres_away_is_out_of_range() {
    let history = History::default();
    let request = scan(PROMO_ID, Some(Coordinate::new(-17.3485, -66.1570)), at(10, 0));

    let result = validator().validate(&catalog(), &history, &request).await;

    assert_eq!(result.status(), Status::OutOfRange);
}

#[tokio::test]
async fn late_night_scan_is_expired_from_anywhere() {
    let history = History::default();
    for location in [
        None,
        Some(Coordinate::new(-17.3930, -66.1572)),
        Some(Coordinate::new(-17.3485, -66.1570)),
    ] {
        let request = scan(PROMO_ID, location, at(23, 0));
        let result = validator().validate(&catalog(), &history, &request).await;
        assert_eq!(result.status(), Status::Expired, "location {location:?}");
    }
    assert_eq!(history.0.borrow().len(), 3);
}

#[tokio::test]
async fn scan_without_location_is_no_location() {
    let history = History::default();
    let request = scan(&format!("https://cupones.example/v?id={PROMO_ID}"), None, at(12, 30));

    let result = validator().validate(&catalog(), &history, &request).await;

    assert_eq!(result.status(), Status::NoLocation);
    assert_eq!(result.status().code(), 5);
}
