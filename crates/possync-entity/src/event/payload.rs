//! Typed event payloads.

use serde::{Deserialize, Deserializer, Serialize};

/// Payload of a known event type, tagged by the `type` field.
///
/// Tags this worker does not know deserialize to [`EventPayload::Unknown`]
/// so new event types never break the read loop. A known tag whose fields
/// cannot be read is represented as [`EventPayload::Untyped`] by
/// [`Event::from_value`](super::Event::from_value) and is still routed by its
/// tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    /// A sales/purchase/write-off document was posted.
    #[serde(rename = "DOCUMENT_POSTED")]
    DocumentPosted(DocumentPosted),
    /// The on-hand quantity of a product changed.
    #[serde(rename = "STOCK_CHANGED")]
    StockChanged(StockChanged),
    /// A product card was edited.
    #[serde(rename = "PRODUCT_UPDATED")]
    ProductUpdated(ProductUpdated),
    /// A known tag whose fields do not match the typed shape.
    #[serde(skip)]
    Untyped,
    /// Any other tag.
    #[serde(other)]
    Unknown,
}

impl EventPayload {
    /// Tag value for `DOCUMENT_POSTED`.
    pub const DOCUMENT_POSTED: &'static str = "DOCUMENT_POSTED";
    /// Tag value for `STOCK_CHANGED`.
    pub const STOCK_CHANGED: &'static str = "STOCK_CHANGED";
    /// Tag value for `PRODUCT_UPDATED`.
    pub const PRODUCT_UPDATED: &'static str = "PRODUCT_UPDATED";
}

/// `DOCUMENT_POSTED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPosted {
    /// Posted document identifier.
    #[serde(deserialize_with = "flexible_id")]
    pub document_id: String,
    /// Document kind (`sale`, `purchase`, `writeoff`, ...).
    #[serde(default, deserialize_with = "flexible_optional_id")]
    pub document_type: Option<String>,
}

/// `STOCK_CHANGED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockChanged {
    /// Product whose stock changed.
    #[serde(deserialize_with = "flexible_id")]
    pub product_id: String,
    /// Quantity on hand after the change, when it could be read as a number.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub new_quantity: Option<f64>,
}

/// `PRODUCT_UPDATED` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdated {
    /// Edited product.
    #[serde(deserialize_with = "flexible_id")]
    pub product_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Integer(n) => n.to_string(),
            RawId::Float(n) => n.to_string(),
        }
    }
}

/// The main application writes ids as strings or as plain numbers.
fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Like [`flexible_id`], with `null` read as absent.
fn flexible_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Numbers and numeric strings are read as quantities. Anything else,
/// `null` included, becomes `None`.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_tags() {
        let payload: EventPayload = serde_json::from_value(json!({
            "id": "e1",
            "type": "STOCK_CHANGED",
            "product_id": "p1",
            "new_quantity": 5
        }))
        .unwrap();
        assert_eq!(
            payload,
            EventPayload::StockChanged(StockChanged {
                product_id: "p1".to_string(),
                new_quantity: Some(5.0),
            })
        );
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let payload: EventPayload = serde_json::from_value(json!({
            "type": "DOCUMENT_POSTED",
            "document_id": 42
        }))
        .unwrap();
        match payload {
            EventPayload::DocumentPosted(doc) => {
                assert_eq!(doc.document_id, "42");
                assert_eq!(doc.document_type, None);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag() {
        let payload: EventPayload = serde_json::from_value(json!({
            "type": "TABLE_OPENED",
            "table": 7
        }))
        .unwrap();
        assert_eq!(payload, EventPayload::Unknown);
    }

    #[test]
    fn test_quantity_tolerates_strings_and_nulls() {
        let quantity = |value: serde_json::Value| {
            match serde_json::from_value::<EventPayload>(json!({
                "type": "STOCK_CHANGED",
                "product_id": "p1",
                "new_quantity": value
            }))
            .unwrap()
            {
                EventPayload::StockChanged(change) => change.new_quantity,
                other => panic!("unexpected payload: {other:?}"),
            }
        };

        assert_eq!(quantity(json!("5")), Some(5.0));
        assert_eq!(quantity(json!(" 2.5 ")), Some(2.5));
        assert_eq!(quantity(json!(null)), None);
        assert_eq!(quantity(json!("many")), None);
        assert_eq!(quantity(json!({"value": 5})), None);
    }

    #[test]
    fn test_missing_quantity_is_absent() {
        let payload: EventPayload = serde_json::from_value(json!({
            "type": "STOCK_CHANGED",
            "product_id": "p1"
        }))
        .unwrap();
        assert_eq!(
            payload,
            EventPayload::StockChanged(StockChanged {
                product_id: "p1".to_string(),
                new_quantity: None,
            })
        );
    }

    #[test]
    fn test_numeric_document_type_is_accepted() {
        let payload: EventPayload = serde_json::from_value(json!({
            "type": "DOCUMENT_POSTED",
            "document_id": "d1",
            "document_type": 3
        }))
        .unwrap();
        match payload {
            EventPayload::DocumentPosted(doc) => assert_eq!(doc.document_type.as_deref(), Some("3")),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_known_tag_without_required_id_fails_typed_parse() {
        let result = serde_json::from_value::<EventPayload>(json!({
            "type": "PRODUCT_UPDATED",
            "name": "Cola"
        }));
        assert!(result.is_err());
    }
}
