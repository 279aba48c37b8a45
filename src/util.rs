use serde_json::{Map, Value};

/// Removes the `continue` object from a response.
///
/// `batchcomplete` and the rest of the response are left alone.
pub fn take_continue(v: &mut Value) -> Option<Map<String, Value>> {
    match v.as_object_mut()?.remove("continue")? {
        Value::Object(m) => Some(m),
        _ => None,
    }
}

/// The string form of a scalar JSON value as it is sent back to the API.
pub fn value_to_param(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(true) => String::new(),
        Value::Bool(false) | Value::Null => String::from("0"),
        other => other.to_string(),
    }
}

pub mod dt {
    use std::fmt;

    use chrono::{DateTime, Utc};
    use serde::{Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        pub struct Visitor;
        impl<'a> serde::de::Visitor<'a> for Visitor {
            type Value = DateTime<Utc>;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.pad("a string")
            }
            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                DateTime::parse_from_rfc3339(s)
                    .map(|d| d.into())
                    .map_err(|e| E::custom(e))
            }
        }

        d.deserialize_str(Visitor)
    }

    pub fn serialize<S: Serializer>(d: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        d.to_rfc3339().serialize(s)
    }
}

/// Boolean page flags, which formatversion 1 sends as `""` and
/// formatversion 2 as `true`.
pub mod flag {
    use std::fmt;

    use serde::Deserializer;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        pub struct Visitor;
        impl<'a> serde::de::Visitor<'a> for Visitor {
            type Value = bool;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.pad("a boolean or a string")
            }
            fn visit_bool<E>(self, b: bool) -> Result<bool, E> {
                Ok(b)
            }
            fn visit_str<E>(self, _: &str) -> Result<bool, E> {
                Ok(true)
            }
        }

        d.deserialize_any(Visitor)
    }
}
