//! Basket manifest schema.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The canonical, minimal descriptor of a basket.
///
/// Exactly one manifest exists per committed basket, co-located with the
/// basket's files as `basket_manifest.json`. A basket whose manifest is
/// missing or malformed is invalid and not indexable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Globally unique basket identifier, fixed at creation.
    pub uuid: Uuid,
    /// Timestamp fixed at commit.
    #[serde(with = "time::serde::rfc3339")]
    pub upload_time: OffsetDateTime,
    /// UUIDs of the baskets this one was derived from; may be empty.
    pub parent_uuids: Vec<Uuid>,
    /// Required, non-empty category string.
    pub basket_type: String,
    /// Optional user-friendly label.
    pub label: Option<String>,
}

impl Manifest {
    /// Create a manifest stamped with the current time.
    pub fn new(
        uuid: Uuid,
        parent_uuids: Vec<Uuid>,
        basket_type: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            uuid,
            upload_time: OffsetDateTime::now_utc(),
            parent_uuids,
            basket_type: basket_type.into(),
            label,
        }
    }

    /// Check required-field constraints not expressible in the schema.
    pub fn validate(&self) -> crate::Result<()> {
        if self.basket_type.is_empty() {
            return Err(crate::Error::InvalidManifest(
                "basket_type must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON, enforcing required-field constraints.
    pub fn from_json(json: &[u8]) -> crate::Result<Self> {
        let manifest: Self =
            serde_json::from_slice(json).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_roundtrip() {
        let manifest = Manifest::new(
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            "telemetry",
            Some("run 42".to_string()),
        );
        let json = manifest.to_json().unwrap();
        let back = Manifest::from_json(json.as_bytes()).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_manifest_rejects_empty_basket_type() {
        let manifest = Manifest::new(Uuid::new_v4(), vec![], "", None);
        assert!(manifest.validate().is_err());

        let json = serde_json::to_string(&manifest).unwrap();
        assert!(Manifest::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_manifest_rejects_missing_fields() {
        let json = br#"{"uuid":"6e0d1bcd-8e21-4c4c-b34d-7f3f6f7e54a1","basket_type":"item"}"#;
        assert!(Manifest::from_json(json).is_err());
    }

    #[test]
    fn test_manifest_rejects_unknown_fields() {
        let manifest = Manifest::new(Uuid::new_v4(), vec![], "item", None);
        let mut value = serde_json::to_value(&manifest).unwrap();
        value["extra"] = serde_json::json!(true);
        let json = serde_json::to_vec(&value).unwrap();
        assert!(Manifest::from_json(&json).is_err());
    }
}
