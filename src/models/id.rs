use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque identifier of a stored document.
///
/// Always holds a well-formed store identifier (24 hex digits). Travels as a
/// plain string over HTTP; only the storage layer sees the native `ObjectId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(ObjectId);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid objectid: {0}")]
pub struct InvalidDocumentId(pub String);

impl DocumentId {
    pub fn parse(raw: &str) -> Result<Self, InvalidDocumentId> {
        ObjectId::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| InvalidDocumentId(raw.to_string()))
    }

    /// Fresh identifier, used for embedded sub-documents and the in-memory store.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub(crate) fn from_object_id(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub(crate) fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for DocumentId {
    type Err = InvalidDocumentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_object_id_hex() {
        let id = DocumentId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DocumentId::parse("not-an-id").is_err());
        assert!(DocumentId::parse("").is_err());
        assert!(DocumentId::parse("65a1f0c2e4b0a1b2c3d4e5f").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = DocumentId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65a1f0c2e4b0a1b2c3d4e5f6\"");

        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_generated_ids_increase() {
        let first = DocumentId::generate();
        let second = DocumentId::generate();
        assert!(second > first);
    }
}
