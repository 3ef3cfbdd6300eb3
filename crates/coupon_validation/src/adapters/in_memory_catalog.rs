// Rust guideline compliant 2026-10-12

//! In-memory adapter for the `PromotionLookup` port.
//!
//! Intended for demo runs and tests only. `LookupError::Unavailable` is part
//! of the port contract but is never returned by this adapter.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use domain::{Coordinate, LookupError, PromotionLookup, PromotionRecord};

/// Store position shared by the demo promotions.
pub const DEMO_STORE: Coordinate = Coordinate::new(-17.3935, -66.1570);

/// Promotions served by the demo catalog and written by `seed`.
///
/// One redeemable coupon, one past its calendar validity, and one whose daily
/// hours were never configured.
#[must_use]
pub fn demo_promotions() -> Vec<PromotionRecord> {
    vec![
        PromotionRecord {
            id: "115a13c3-bb80-4cd3-8a8f-3afcf5fb7584".to_owned(),
            title: "Combo Estudiantil 2x1".to_owned(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(21, 0, 0),
            validity_until: NaiveDate::from_ymd_opt(2099, 12, 31),
            location: DEMO_STORE,
            image_reference: "https://picsum.photos/seed/cupon1/800/500".to_owned(),
        },
        PromotionRecord {
            id: "EXPIRED-001".to_owned(),
            title: "Promo Expirada".to_owned(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(21, 0, 0),
            validity_until: NaiveDate::from_ymd_opt(2000, 1, 1),
            location: DEMO_STORE,
            image_reference: "https://picsum.photos/seed/cupon2/800/500".to_owned(),
        },
        PromotionRecord {
            id: "NOHOURS-001".to_owned(),
            title: "Happy Hour (sin horario)".to_owned(),
            start_time: None,
            end_time: None,
            validity_until: None,
            location: DEMO_STORE,
            image_reference: "https://picsum.photos/seed/cupon3/800/500".to_owned(),
        },
    ]
}

/// `PromotionLookup` adapter backed by a `HashMap` keyed on promotion id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: HashMap<String, PromotionRecord>,
}

impl InMemoryCatalog {
    /// Build a catalog from `records`; later duplicates replace earlier ones.
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = PromotionRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Catalog holding [`demo_promotions`].
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo_promotions())
    }

    /// Number of promotions held.
    #[cfg(test)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl PromotionLookup for InMemoryCatalog {
    async fn lookup(&self, id: &str) -> Result<PromotionRecord, LookupError> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound { id: id.to_owned() })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{InMemoryCatalog, demo_promotions};
    use domain::{LookupError, PromotionLookup as _};

    #[tokio::test]
    async fn demo_catalog_serves_known_ids() {
        let catalog = InMemoryCatalog::demo();
        assert_eq!(catalog.len(), 3);
        let record = catalog.lookup("EXPIRED-001").await.unwrap();
        assert_eq!(record.title, "Promo Expirada");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let catalog = InMemoryCatalog::demo();
        let result = catalog.lookup("missing").await;
        assert!(
            matches!(&result, Err(LookupError::NotFound { id }) if id == "missing"),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn duplicate_ids_keep_last_record() {
        let mut records = demo_promotions();
        let mut replacement = records[0].clone();
        replacement.title = "Replaced".to_owned();
        records.push(replacement);

        let catalog = InMemoryCatalog::new(records);

        assert_eq!(catalog.len(), 3);
        let record = catalog.lookup("115a13c3-bb80-4cd3-8a8f-3afcf5fb7584").await.unwrap();
        assert_eq!(record.title, "Replaced");
    }
}
