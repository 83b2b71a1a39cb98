//! Index row model.

use pantry_core::Manifest;
use time::OffsetDateTime;
use uuid::Uuid;

/// One index row per committed basket.
///
/// Every committed, valid basket has exactly one row; a row always refers to
/// a basket that existed and validated at the time of its last refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct BasketRow {
    pub uuid: Uuid,
    pub upload_time: OffsetDateTime,
    pub parent_uuids: Vec<Uuid>,
    pub basket_type: String,
    pub label: Option<String>,
    /// Storage-resident address of the basket; never changes once committed.
    pub address: String,
    /// Identifier of the storage backend the basket lives on.
    pub storage_type: String,
}

impl BasketRow {
    /// Build a row from a parsed manifest plus its discovered location.
    pub fn from_manifest(
        manifest: &Manifest,
        address: impl Into<String>,
        storage_type: impl Into<String>,
    ) -> Self {
        Self {
            uuid: manifest.uuid,
            upload_time: manifest.upload_time,
            parent_uuids: manifest.parent_uuids.clone(),
            basket_type: manifest.basket_type.clone(),
            label: manifest.label.clone(),
            address: address.into(),
            storage_type: storage_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_manifest() {
        let parent = Uuid::new_v4();
        let manifest = Manifest::new(
            Uuid::new_v4(),
            vec![parent],
            "telemetry",
            Some("nightly".to_string()),
        );
        let row = BasketRow::from_manifest(&manifest, "pantry/telemetry/x", "filesystem");

        assert_eq!(row.uuid, manifest.uuid);
        assert_eq!(row.parent_uuids, vec![parent]);
        assert_eq!(row.basket_type, "telemetry");
        assert_eq!(row.label.as_deref(), Some("nightly"));
        assert_eq!(row.address, "pantry/telemetry/x");
        assert_eq!(row.storage_type, "filesystem");
    }
}
