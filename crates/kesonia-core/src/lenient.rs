//! Tolerant field decoders for client-echoed audit values.
//!
//! The finalize payload repeats what the client received earlier, and browsers
//! happily turn numbers into strings on the way back. These decoders accept
//! any JSON value: numeric strings parse, anything else unparseable becomes
//! the field's empty value.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn to_number(value: Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        Value::Bool(b) => f64::from(u8::from(b)),
        _ => 0.0,
    }
}

fn to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Value::deserialize(d).map(to_number)
}

pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Value::deserialize(d).map(to_text)
}

/// Present (even as `null`) decodes to `Some`; only an absent key is `None`.
pub(crate) fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Value::deserialize(d).map(|v| Some(to_number(v)))
}

pub(crate) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(d).map(|v| match v {
        Value::Null => None,
        other => Some(to_text(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(to_number(json!("34")), 34.0);
        assert_eq!(to_number(json!(" 750.5 ")), 750.5);
        assert_eq!(to_number(json!(12)), 12.0);
        assert_eq!(to_number(json!("n/a")), 0.0);
        assert_eq!(to_number(Value::Null), 0.0);
    }

    #[test]
    fn text_stringifies_scalars() {
        assert_eq!(to_text(json!("RENT")), "RENT");
        assert_eq!(to_text(json!(42)), "42");
        assert_eq!(to_text(Value::Null), "");
    }
}
