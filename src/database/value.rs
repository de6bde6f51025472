//! Conversion between plain JSON and Firestore's typed REST value encoding.
//!
//! Strings holding an RFC 3339 timestamp are written as `timestampValue` so
//! that other clients of the same database read native timestamps; timestamps
//! are read back as RFC 3339 strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use super::{Fields, StoreError, StoreResult};

pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(encoded)
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": Value::Null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => json!({
                "timestampValue": ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true)
            }),
            Err(_) => json!({ "stringValue": s }),
        },
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decodes the `fields` object of a Firestore document resource.
pub fn decode_fields(fields: Option<&Value>) -> StoreResult<Fields> {
    let Some(fields) = fields else {
        return Ok(Fields::new());
    };
    let object = fields
        .as_object()
        .ok_or_else(|| StoreError::Decode("expected 'fields' to be an object".into()))?;

    object
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

pub fn decode_value(value: &Value) -> StoreResult<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Decode("expected Firestore value object".into()))?;

    if object.contains_key("nullValue") {
        return Ok(Value::Null);
    }
    if let Some(b) = object.get("booleanValue") {
        return b
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| StoreError::Decode("booleanValue must be bool".into()));
    }
    if let Some(i) = object.get("integerValue") {
        let parsed = match i {
            Value::String(s) => s
                .parse::<i64>()
                .map_err(|e| StoreError::Decode(format!("invalid integerValue: {}", e)))?,
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| StoreError::Decode("integer out of range".into()))?,
            _ => return Err(StoreError::Decode("integerValue must be a string or number".into())),
        };
        return Ok(json!(parsed));
    }
    if let Some(d) = object.get("doubleValue") {
        let parsed = match d {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| StoreError::Decode("invalid doubleValue".into()))?;
        return Ok(json!(parsed));
    }
    if let Some(ts) = object.get("timestampValue") {
        let raw = ts
            .as_str()
            .ok_or_else(|| StoreError::Decode("timestampValue must be a string".into()))?;
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| StoreError::Decode(format!("invalid timestampValue: {}", e)))?;
        return Ok(Value::String(
            parsed
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ));
    }
    for key in ["stringValue", "referenceValue", "bytesValue"] {
        if let Some(s) = object.get(key) {
            return s
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| StoreError::Decode(format!("{} must be a string", key)));
        }
    }
    if let Some(point) = object.get("geoPointValue") {
        return Ok(point.clone());
    }
    if let Some(array) = object.get("arrayValue") {
        let values = match array.get("values").and_then(Value::as_array) {
            Some(values) => values.iter().map(decode_value).collect::<StoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        return Ok(Value::Array(values));
    }
    if let Some(map) = object.get("mapValue") {
        return decode_fields(map.get("fields")).map(Value::Object);
    }

    Err(StoreError::Decode("unknown Firestore value type".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_typed_values() {
        let fields = json!({
            "venue": "Wankhede",
            "startTime": "2026-04-01T14:00:00Z",
            "points": 3,
            "ratio": 0.5,
            "predictionsEnabledByAdmin": true,
            "options": ["a", "b"],
        });
        let encoded = encode_fields(fields.as_object().unwrap());

        assert_eq!(encoded["venue"], json!({ "stringValue": "Wankhede" }));
        assert_eq!(
            encoded["startTime"],
            json!({ "timestampValue": "2026-04-01T14:00:00Z" })
        );
        assert_eq!(encoded["points"], json!({ "integerValue": "3" }));
        assert_eq!(encoded["ratio"], json!({ "doubleValue": 0.5 }));
        assert_eq!(
            encoded["options"]["arrayValue"]["values"][1],
            json!({ "stringValue": "b" })
        );
    }

    #[test]
    fn decodes_document_fields() {
        let raw = json!({
            "team1Id": { "stringValue": "csk" },
            "startTime": { "timestampValue": "2026-04-01T14:00:00.000000Z" },
            "points": { "integerValue": "12" },
            "meta": { "mapValue": { "fields": { "live": { "booleanValue": false } } } },
            "empty": { "arrayValue": {} },
            "gone": { "nullValue": null },
        });
        let fields = decode_fields(Some(&raw)).unwrap();

        assert_eq!(fields["team1Id"], json!("csk"));
        assert_eq!(fields["startTime"], json!("2026-04-01T14:00:00Z"));
        assert_eq!(fields["points"], json!(12));
        assert_eq!(fields["meta"], json!({ "live": false }));
        assert_eq!(fields["empty"], json!([]));
        assert_eq!(fields["gone"], Value::Null);
    }

    #[test]
    fn rejects_unknown_value_kinds() {
        assert!(decode_value(&json!({ "weirdValue": 1 })).is_err());
        assert!(decode_value(&json!("plain")).is_err());
    }
}
