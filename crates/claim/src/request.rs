//! Claim request decoding and validation

use crate::error::{ClaimError, ClaimResult};
use crate::units::Quantity;
use ethabi::Address;
use serde_json::value::RawValue;
use std::collections::BTreeMap;

/// Decoded request body, before any field is validated
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimBody {
    Json(ClaimFields),
    Form(Vec<(String, String)>),
    Empty,
}

impl ClaimBody {
    /// Decode a raw body. JSON is tried first, URL-encoded form second.
    /// Anything that decodes to neither is treated as an empty body.
    ///
    /// JSON members are kept as raw text, so a number too large for an `f64`
    /// still reaches quantity validation instead of failing the whole body.
    pub fn decode(raw: &[u8]) -> Self {
        if raw.iter().all(|b| b.is_ascii_whitespace()) {
            return ClaimBody::Empty;
        }

        if let Ok(members) = serde_json::from_slice::<BTreeMap<String, &RawValue>>(raw) {
            return ClaimBody::Json(ClaimFields {
                to: members.get("to").map(|v| FieldValue::from_json(v)),
                qty: members.get("qty").map(|v| FieldValue::from_json(v)),
            });
        }
        if serde_json::from_slice::<&RawValue>(raw).is_ok() {
            return ClaimBody::Empty;
        }

        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw) {
            Ok(pairs) if !pairs.is_empty() => ClaimBody::Form(pairs),
            _ => ClaimBody::Empty,
        }
    }

    pub fn fields(&self) -> ClaimFields {
        match self {
            ClaimBody::Json(fields) => fields.clone(),
            ClaimBody::Form(pairs) => {
                // Repeated keys: the last occurrence wins
                let lookup = |key: &str| {
                    pairs
                        .iter()
                        .rfind(|(k, _)| k == key)
                        .map(|(_, v)| FieldValue::Text(v.clone()))
                };
                ClaimFields {
                    to: lookup("to"),
                    qty: lookup("qty"),
                }
            }
            ClaimBody::Empty => ClaimFields::default(),
        }
    }
}

/// A single raw field as it appeared on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// A JSON number, verbatim
    Number(String),
    Other,
}

impl FieldValue {
    fn from_json(value: &RawValue) -> Self {
        let text = value.get();
        match text.as_bytes().first() {
            Some(b'"') => serde_json::from_str::<String>(text)
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Other),
            Some(b'-' | b'0'..=b'9') => FieldValue::Number(text.to_string()),
            _ => FieldValue::Other,
        }
    }
}

/// Unvalidated `to` / `qty` fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimFields {
    pub to: Option<FieldValue>,
    pub qty: Option<FieldValue>,
}

impl ClaimFields {
    /// Validate both fields. The address is checked first.
    pub fn validate(&self) -> ClaimResult<ClaimRequest> {
        let to = match &self.to {
            Some(FieldValue::Text(s)) => parse_address(s).ok_or(ClaimError::InvalidAddress)?,
            _ => return Err(ClaimError::InvalidAddress),
        };

        let qty = match &self.qty {
            Some(FieldValue::Text(s)) => Quantity::parse(s),
            Some(FieldValue::Number(n)) => Quantity::parse(n),
            _ => None,
        }
        .ok_or(ClaimError::InvalidQuantity)?;

        Ok(ClaimRequest { to, qty })
    }
}

/// A validated claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRequest {
    pub to: Address,
    pub qty: Quantity,
}

/// Parse a `0x`-prefixed, 40-hex-digit address. Surrounding whitespace is
/// ignored, mixed case is accepted and no checksum is enforced.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex_part = input.trim().strip_prefix("0x")?;
    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = hex::decode(hex_part).ok()?;
    Some(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_to() -> String {
        format!("0x{}", "a".repeat(40))
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address(&valid_to()).is_some());
        assert!(parse_address(&format!("  0x{}\n", "AbCdEf0123".repeat(4))).is_some());
        let bad = vec![
            String::new(),
            "0x123".to_string(),
            "abc".to_string(),
            "a".repeat(42),
            format!("0X{}", "a".repeat(40)),
            format!("0x{}", "g".repeat(40)),
            format!("0x{}", "a".repeat(41)),
        ];
        for input in &bad {
            assert!(parse_address(input).is_none(), "{:?} should be rejected", input);
        }
    }

    #[test]
    fn test_decode_json_object() {
        let body = ClaimBody::decode(br#"{"to":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","qty":2}"#);
        let req = body.fields().validate().unwrap();
        assert_eq!(req.to, Address::from_slice(&[0xaa; 20]));
        assert_eq!(req.qty.to_string(), "2");
    }

    #[test]
    fn test_decode_form_fallback() {
        let raw = format!("to={}&qty=3", valid_to());
        let body = ClaimBody::decode(raw.as_bytes());
        assert!(matches!(body, ClaimBody::Form(_)));
        let req = body.fields().validate().unwrap();
        assert_eq!(req.qty.to_string(), "3");
    }

    #[test]
    fn test_json_and_form_agree() {
        let json = format!(r#"{{"to":"{}","qty":"1.5"}}"#, valid_to());
        let form = format!("to={}&qty=1.5", valid_to());
        assert_eq!(
            ClaimBody::decode(json.as_bytes()).fields().validate().unwrap(),
            ClaimBody::decode(form.as_bytes()).fields().validate().unwrap()
        );
    }

    #[test]
    fn test_empty_and_non_object_bodies() {
        assert_eq!(ClaimBody::decode(b""), ClaimBody::Empty);
        assert_eq!(ClaimBody::decode(b"  \n"), ClaimBody::Empty);
        assert_eq!(ClaimBody::decode(b"null"), ClaimBody::Empty);
        assert_eq!(ClaimBody::decode(b"[1,2]"), ClaimBody::Empty);

        let err = ClaimBody::Empty.fields().validate().unwrap_err();
        assert!(matches!(err, ClaimError::InvalidAddress));
    }

    #[test]
    fn test_invalid_quantities() {
        for qty in [r#"0"#, r#"-5"#, r#""abc""#, r#""NaN""#, r#""""#, r#"true"#, r#"null"#] {
            let raw = format!(r#"{{"to":"{}","qty":{}}}"#, valid_to(), qty);
            let err = ClaimBody::decode(raw.as_bytes()).fields().validate().unwrap_err();
            assert!(matches!(err, ClaimError::InvalidQuantity), "qty {} gave {:?}", qty, err);
        }

        let raw = format!(r#"{{"to":"{}"}}"#, valid_to());
        let err = ClaimBody::decode(raw.as_bytes()).fields().validate().unwrap_err();
        assert!(matches!(err, ClaimError::InvalidQuantity));
    }

    #[test]
    fn test_out_of_range_json_number_is_an_invalid_quantity() {
        let raw = format!(r#"{{"to":"{}","qty":1e400}}"#, valid_to());
        let body = ClaimBody::decode(raw.as_bytes());
        assert!(matches!(body, ClaimBody::Json(_)));
        let err = body.fields().validate().unwrap_err();
        assert!(matches!(err, ClaimError::InvalidQuantity));
    }

    #[test]
    fn test_json_fields_keep_their_shape() {
        let body = ClaimBody::decode(br#"{"to":"0xab","qty":2.50,"extra":[1,{"a":null}]}"#);
        let fields = body.fields();
        assert_eq!(fields.to, Some(FieldValue::Text("0xab".to_string())));
        assert_eq!(fields.qty, Some(FieldValue::Number("2.50".to_string())));

        let fields = ClaimBody::decode(br#"{"to":"\u0030x","qty":true}"#).fields();
        assert_eq!(fields.to, Some(FieldValue::Text("0x".to_string())));
        assert_eq!(fields.qty, Some(FieldValue::Other));
    }

    #[test]
    fn test_repeated_keys_take_the_last_value() {
        let raw = format!("to=0x123&to={}&qty=5&qty=1", valid_to());
        let req = ClaimBody::decode(raw.as_bytes()).fields().validate().unwrap();
        assert_eq!(req.to, Address::from_slice(&[0xaa; 20]));
        assert_eq!(req.qty.to_string(), "1");

        let raw = format!(r#"{{"to":"0x123","to":"{}","qty":1}}"#, valid_to());
        assert!(ClaimBody::decode(raw.as_bytes()).fields().validate().is_ok());
    }

    #[test]
    fn test_address_checked_before_quantity() {
        let err = ClaimBody::decode(br#"{"to":"0x123","qty":0}"#).fields().validate().unwrap_err();
        assert!(matches!(err, ClaimError::InvalidAddress));

        let err = ClaimBody::decode(br#"{"to":42,"qty":1}"#).fields().validate().unwrap_err();
        assert!(matches!(err, ClaimError::InvalidAddress));
    }
}
